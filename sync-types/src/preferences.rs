//! Display preferences and their normalization rules.
//!
//! Every option has a total default. Values coming from local storage or
//! from the server are parsed field by field: a malformed field falls back
//! to whatever value it is being merged over, it never poisons the rest.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Default refresh interval (2 minutes).
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 120_000;

/// Largest accepted refresh interval (1 hour).
pub const MAX_REFRESH_INTERVAL_MS: u64 = 3_600_000;

/// Default visualization intensity.
pub const DEFAULT_VISUALIZATION_INTENSITY: f64 = 0.55;

/// Maximum number of muted tags kept after normalization.
pub const MAX_MUTED_TAGS: usize = 32;

/// How links in rendered markdown are opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkOpenMode {
    /// Open exactly what the author typed.
    #[default]
    AsTyped,
    /// Ask which scheme to use for scheme-less links.
    PromptScheme,
}

/// Text reveal animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextRenderEffect {
    /// Fade text in.
    #[default]
    Smooth,
    /// Reveal character by character.
    Typewriter,
    /// Ripple across lines.
    Wave,
    /// Reveal characters in random order.
    Random,
    /// No animation.
    Off,
}

/// Image reveal animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageRevealEffect {
    /// Fade images in once decoded.
    #[default]
    Smooth,
    /// Show images immediately.
    Off,
}

/// Screen transition animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageTransitionEffect {
    /// Cross-fade between screens.
    #[default]
    Fade,
    /// The platform's native transition.
    #[serde(rename = "default")]
    Platform,
    /// No transition.
    #[serde(rename = "none")]
    Off,
}

/// Color treatment for backdrops and charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VisualizationMode {
    /// Monochrome with the accent color.
    #[default]
    MonoAccent,
    /// Warm, faded palette.
    Retro,
    /// Standard palette.
    Classic,
    /// Saturated palette.
    Vivid,
    /// Bright glowing colors on dark.
    Neon,
    /// Deep contrast, film-like grading.
    Cinematic,
    /// Cool, pale palette.
    Frost,
}

/// The full, normalized preference set for one identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Whether screens poll in the background while focused.
    pub background_refresh_enabled: bool,
    /// Polling interval in milliseconds (0 disables polling).
    pub refresh_interval_ms: u64,
    /// Hide counters and other distractions.
    pub zen_mode: bool,
    /// Denser list layout.
    pub compact_mode: bool,
    /// Custom accent color as `#RRGGBB`, or empty for the theme default.
    pub accent_color: String,
    /// How links are opened.
    pub link_open_mode: LinkOpenMode,
    /// Text reveal animation.
    pub text_render_effect: TextRenderEffect,
    /// Image reveal animation.
    pub image_reveal_effect: ImageRevealEffect,
    /// Screen transition animation.
    pub page_transition_effect: PageTransitionEffect,
    /// Color treatment.
    pub visualization_mode: VisualizationMode,
    /// Strength of the color treatment, `0.0..=1.0`.
    pub visualization_intensity: f64,
    /// Lower-cased tags hidden from feeds.
    pub muted_tags: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            background_refresh_enabled: false,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            zen_mode: false,
            compact_mode: false,
            accent_color: String::new(),
            link_open_mode: LinkOpenMode::default(),
            text_render_effect: TextRenderEffect::default(),
            image_reveal_effect: ImageRevealEffect::default(),
            page_transition_effect: PageTransitionEffect::default(),
            visualization_mode: VisualizationMode::default(),
            visualization_intensity: DEFAULT_VISUALIZATION_INTENSITY,
            muted_tags: Vec::new(),
        }
    }
}

impl Preferences {
    /// Parse a persisted or server-supplied settings object over the defaults.
    pub fn from_json(value: &Value) -> Self {
        Self::default().merged(&PreferencesPatch::from_json(value))
    }

    /// Return a copy with `patch` applied and the result normalized.
    pub fn merged(&self, patch: &PreferencesPatch) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }

    /// Apply `patch` in place, then normalize.
    pub fn apply(&mut self, patch: &PreferencesPatch) {
        if let Some(v) = patch.background_refresh_enabled {
            self.background_refresh_enabled = v;
        }
        if let Some(v) = patch.refresh_interval_ms {
            self.refresh_interval_ms = v;
        }
        if let Some(v) = patch.zen_mode {
            self.zen_mode = v;
        }
        if let Some(v) = patch.compact_mode {
            self.compact_mode = v;
        }
        if let Some(v) = &patch.accent_color {
            self.accent_color = v.clone();
        }
        if let Some(v) = patch.link_open_mode {
            self.link_open_mode = v;
        }
        if let Some(v) = patch.text_render_effect {
            self.text_render_effect = v;
        }
        if let Some(v) = patch.image_reveal_effect {
            self.image_reveal_effect = v;
        }
        if let Some(v) = patch.page_transition_effect {
            self.page_transition_effect = v;
        }
        if let Some(v) = patch.visualization_mode {
            self.visualization_mode = v;
        }
        if let Some(v) = patch.visualization_intensity {
            self.visualization_intensity = v;
        }
        if let Some(v) = &patch.muted_tags {
            self.muted_tags = v.clone();
        }
        self.normalize();
    }

    /// Enforce every field invariant.
    pub fn normalize(&mut self) {
        self.refresh_interval_ms = self.refresh_interval_ms.min(MAX_REFRESH_INTERVAL_MS);
        self.accent_color = normalize_accent_color(&self.accent_color);
        self.visualization_intensity = if self.visualization_intensity.is_finite() {
            self.visualization_intensity.clamp(0.0, 1.0)
        } else {
            DEFAULT_VISUALIZATION_INTENSITY
        };
        self.muted_tags = normalize_tags(&self.muted_tags);
    }

    /// Configured background polling interval, if polling is on.
    ///
    /// No minimum is applied here; the scheduler enforces its own floor.
    pub fn background_refresh_interval(&self) -> Option<Duration> {
        if self.background_refresh_enabled && self.refresh_interval_ms > 0 {
            Some(Duration::from_millis(self.refresh_interval_ms))
        } else {
            None
        }
    }

    /// Serialize to the camelCase JSON object used on disk and on the wire.
    pub fn to_json(&self) -> Value {
        // Plain data with string keys; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A partial update to [`Preferences`].
///
/// Each field mirrors the [`Preferences`] field of the same name; `None`
/// leaves it untouched.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_refresh_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zen_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compact_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_open_mode: Option<LinkOpenMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_render_effect: Option<TextRenderEffect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_reveal_effect: Option<ImageRevealEffect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_transition_effect: Option<PageTransitionEffect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization_mode: Option<VisualizationMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization_intensity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted_tags: Option<Vec<String>>,
}

impl PreferencesPatch {
    /// Parse a patch from untyped JSON, dropping any field that does not fit.
    ///
    /// Anything other than a JSON object yields an empty patch.
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        Self {
            background_refresh_enabled: field(obj, "backgroundRefreshEnabled"),
            refresh_interval_ms: obj.get("refreshIntervalMs").and_then(interval_ms),
            zen_mode: field(obj, "zenMode"),
            compact_mode: field(obj, "compactMode"),
            accent_color: field(obj, "accentColor"),
            link_open_mode: field(obj, "linkOpenMode"),
            text_render_effect: field(obj, "textRenderEffect"),
            image_reveal_effect: field(obj, "imageRevealEffect"),
            page_transition_effect: field(obj, "pageTransitionEffect"),
            visualization_mode: field(obj, "visualizationMode"),
            visualization_intensity: obj
                .get("visualizationIntensity")
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite()),
            muted_tags: obj.get("mutedTags").and_then(string_list),
        }
    }

    /// Check whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<Preferences> for PreferencesPatch {
    fn from(p: Preferences) -> Self {
        Self {
            background_refresh_enabled: Some(p.background_refresh_enabled),
            refresh_interval_ms: Some(p.refresh_interval_ms),
            zen_mode: Some(p.zen_mode),
            compact_mode: Some(p.compact_mode),
            accent_color: Some(p.accent_color),
            link_open_mode: Some(p.link_open_mode),
            text_render_effect: Some(p.text_render_effect),
            image_reveal_effect: Some(p.image_reveal_effect),
            page_transition_effect: Some(p.page_transition_effect),
            visualization_mode: Some(p.visualization_mode),
            visualization_intensity: Some(p.visualization_intensity),
            muted_tags: Some(p.muted_tags),
        }
    }
}

fn field<T: DeserializeOwned>(obj: &Map<String, Value>, key: &str) -> Option<T> {
    obj.get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

// Accepts any JSON number; negatives clamp to 0, fractions round.
fn interval_ms(value: &Value) -> Option<u64> {
    if let Some(v) = value.as_u64() {
        return Some(v);
    }
    if let Some(v) = value.as_i64() {
        return Some(v.max(0) as u64);
    }
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .map(|v| v.max(0.0).round() as u64)
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
    )
}

/// Return `raw` trimmed if it is a `#RRGGBB` hex color, otherwise `""`.
pub fn normalize_accent_color(raw: &str) -> String {
    let trimmed = raw.trim();
    let valid = trimmed.len() == 7
        && trimmed.starts_with('#')
        && trimmed[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        trimmed.to_string()
    } else {
        String::new()
    }
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len().min(MAX_MUTED_TAGS));
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() || out.contains(&tag) {
            continue;
        }
        out.push(tag);
        if out.len() == MAX_MUTED_TAGS {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ===========================================
    // Defaults and Parsing
    // ===========================================

    #[test]
    fn defaults_match_documented_values() {
        let p = Preferences::default();
        assert!(!p.background_refresh_enabled);
        assert_eq!(p.refresh_interval_ms, 120_000);
        assert_eq!(p.accent_color, "");
        assert_eq!(p.link_open_mode, LinkOpenMode::AsTyped);
        assert_eq!(p.visualization_intensity, 0.55);
        assert!(p.muted_tags.is_empty());
    }

    #[test]
    fn from_json_non_object_yields_defaults() {
        assert_eq!(Preferences::from_json(&json!(null)), Preferences::default());
        assert_eq!(Preferences::from_json(&json!([1, 2])), Preferences::default());
        assert_eq!(Preferences::from_json(&json!("zen")), Preferences::default());
    }

    #[test]
    fn from_json_keeps_good_fields_and_drops_bad_ones() {
        let p = Preferences::from_json(&json!({
            "zenMode": true,
            "compactMode": "yes",
            "linkOpenMode": "sometimes",
            "visualizationMode": "neon",
            "refreshIntervalMs": 60000,
            "somethingElse": 1
        }));
        assert!(p.zen_mode);
        assert!(!p.compact_mode);
        assert_eq!(p.link_open_mode, LinkOpenMode::AsTyped);
        assert_eq!(p.visualization_mode, VisualizationMode::Neon);
        assert_eq!(p.refresh_interval_ms, 60_000);
    }

    #[test]
    fn wire_names_are_camel_case() {
        let value = Preferences::default().to_json();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("backgroundRefreshEnabled"));
        assert!(obj.contains_key("refreshIntervalMs"));
        assert_eq!(obj["linkOpenMode"], json!("asTyped"));
        assert_eq!(obj["visualizationMode"], json!("monoAccent"));
        assert_eq!(obj["pageTransitionEffect"], json!("fade"));
    }

    #[test]
    fn to_json_then_from_json_preserves_values() {
        let mut p = Preferences::default();
        p.zen_mode = true;
        p.accent_color = "#4A8DFF".into();
        p.text_render_effect = TextRenderEffect::Typewriter;
        p.muted_tags = vec!["rust".into()];
        assert_eq!(Preferences::from_json(&p.to_json()), p);
    }

    // ===========================================
    // Normalization
    // ===========================================

    #[test]
    fn accent_color_accepts_hex_either_case() {
        assert_eq!(normalize_accent_color("#00F329"), "#00F329");
        assert_eq!(normalize_accent_color(" #a855f7 "), "#a855f7");
    }

    #[test]
    fn accent_color_rejects_invalid_to_empty() {
        assert_eq!(normalize_accent_color("00F329"), "");
        assert_eq!(normalize_accent_color("#00F32"), "");
        assert_eq!(normalize_accent_color("#00F32G"), "");
        assert_eq!(normalize_accent_color("#00F3291"), "");
        assert_eq!(normalize_accent_color("red"), "");
    }

    #[test]
    fn interval_is_clamped() {
        let p = Preferences::default().merged(&PreferencesPatch {
            refresh_interval_ms: Some(10 * MAX_REFRESH_INTERVAL_MS),
            ..Default::default()
        });
        assert_eq!(p.refresh_interval_ms, MAX_REFRESH_INTERVAL_MS);

        let negative = PreferencesPatch::from_json(&json!({ "refreshIntervalMs": -5 }));
        assert_eq!(negative.refresh_interval_ms, Some(0));

        let fractional = PreferencesPatch::from_json(&json!({ "refreshIntervalMs": 1500.6 }));
        assert_eq!(fractional.refresh_interval_ms, Some(1501));
    }

    #[test]
    fn small_intervals_are_not_raised() {
        let p = Preferences::default().merged(&PreferencesPatch {
            refresh_interval_ms: Some(1000),
            ..Default::default()
        });
        assert_eq!(p.refresh_interval_ms, 1000);
    }

    #[test]
    fn intensity_is_clamped() {
        let high = Preferences::default().merged(&PreferencesPatch {
            visualization_intensity: Some(3.0),
            ..Default::default()
        });
        assert_eq!(high.visualization_intensity, 1.0);

        let nan = Preferences::default().merged(&PreferencesPatch {
            visualization_intensity: Some(f64::NAN),
            ..Default::default()
        });
        assert_eq!(nan.visualization_intensity, DEFAULT_VISUALIZATION_INTENSITY);
    }

    #[test]
    fn muted_tags_are_normalized() {
        let p = Preferences::default().merged(&PreferencesPatch {
            muted_tags: Some(vec![
                " Rust ".into(),
                "".into(),
                "rust".into(),
                "Go".into(),
            ]),
            ..Default::default()
        });
        assert_eq!(p.muted_tags, vec!["rust".to_string(), "go".to_string()]);
    }

    #[test]
    fn muted_tags_are_capped() {
        let tags: Vec<String> = (0..100).map(|i| format!("t{}", i)).collect();
        let p = Preferences::default().merged(&PreferencesPatch {
            muted_tags: Some(tags),
            ..Default::default()
        });
        assert_eq!(p.muted_tags.len(), MAX_MUTED_TAGS);
        assert_eq!(p.muted_tags[0], "t0");
    }

    #[test]
    fn muted_tags_skip_non_strings() {
        let patch = PreferencesPatch::from_json(&json!({ "mutedTags": ["a", 1, null, "b"] }));
        assert_eq!(patch.muted_tags, Some(vec!["a".to_string(), "b".to_string()]));
    }

    // ===========================================
    // Merging
    // ===========================================

    #[test]
    fn merge_preserves_omitted_fields() {
        let mut base = Preferences::default();
        base.zen_mode = true;
        base.accent_color = "#FF6B6B".into();

        let next = base.merged(&PreferencesPatch {
            compact_mode: Some(true),
            ..Default::default()
        });
        assert!(next.zen_mode);
        assert!(next.compact_mode);
        assert_eq!(next.accent_color, "#FF6B6B");
    }

    #[test]
    fn invalid_accent_in_patch_becomes_empty() {
        let mut base = Preferences::default();
        base.accent_color = "#FF6B6B".into();
        let next = base.merged(&PreferencesPatch {
            accent_color: Some("not-a-color".into()),
            ..Default::default()
        });
        assert_eq!(next.accent_color, "");
    }

    #[test]
    fn empty_patch_detection() {
        assert!(PreferencesPatch::default().is_empty());
        assert!(PreferencesPatch::from_json(&json!({ "zenMode": "x" })).is_empty());
        assert!(!PreferencesPatch::from_json(&json!({ "zenMode": false })).is_empty());
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = PreferencesPatch {
            zen_mode: Some(true),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "zenMode": true }));
    }

    #[test]
    fn background_interval_requires_enabled_and_positive() {
        let mut p = Preferences::default();
        assert_eq!(p.background_refresh_interval(), None);
        p.background_refresh_enabled = true;
        assert_eq!(
            p.background_refresh_interval(),
            Some(Duration::from_millis(120_000))
        );
        p.refresh_interval_ms = 0;
        assert_eq!(p.background_refresh_interval(), None);
    }
}
