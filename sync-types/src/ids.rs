//! Identity and entity identifier types for the DevBits sync layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// Numeric identifier of a post or project on the DevBits service.
///
/// Ids are assigned by the server; the client never invents them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    /// Create an EntityId from its numeric value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this EntityId.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

/// A signed-in username.
///
/// Guaranteed non-empty and free of surrounding whitespace.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Parse a username, trimming surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TypesError::InvalidUsername(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the username as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Username({})", self.0)
    }
}

/// Who the client is acting as.
///
/// Authenticated identities are server-backed; anonymous state lives only
/// on the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Identity {
    /// No signed-in user.
    #[default]
    Anonymous,
    /// A signed-in user.
    User(Username),
}

impl Identity {
    /// Build an identity from an optional username string.
    ///
    /// `None` and blank strings map to [`Identity::Anonymous`].
    pub fn from_optional(raw: Option<&str>) -> Self {
        raw.and_then(|name| Username::parse(name).ok())
            .map(Self::User)
            .unwrap_or(Self::Anonymous)
    }

    /// The signed-in username, if any.
    pub fn username(&self) -> Option<&Username> {
        match self {
            Self::Anonymous => None,
            Self::User(name) => Some(name),
        }
    }

    /// Check whether a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

impl From<Username> for Identity {
    fn from(value: Username) -> Self {
        Self::User(value)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("<anonymous>"),
            Self::User(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&EntityId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: EntityId = serde_json::from_str("7").unwrap();
        assert_eq!(back, EntityId::new(7));
    }

    #[test]
    fn username_trims_whitespace() {
        let name = Username::parse("  ada ").unwrap();
        assert_eq!(name.as_str(), "ada");
    }

    #[test]
    fn username_rejects_blank() {
        assert!(Username::parse("").is_err());
        assert!(Username::parse("   ").is_err());
    }

    #[test]
    fn username_deserialize_validates() {
        let ok: Username = serde_json::from_str("\"ada\"").unwrap();
        assert_eq!(ok.as_str(), "ada");
        assert!(serde_json::from_str::<Username>("\"  \"").is_err());
    }

    #[test]
    fn identity_from_optional() {
        assert_eq!(Identity::from_optional(None), Identity::Anonymous);
        assert_eq!(Identity::from_optional(Some(" ")), Identity::Anonymous);
        let ada = Identity::from_optional(Some("ada"));
        assert!(ada.is_authenticated());
        assert_eq!(ada.username().map(Username::as_str), Some("ada"));
    }

    #[test]
    fn identity_default_is_anonymous() {
        assert!(!Identity::default().is_authenticated());
        assert_eq!(Identity::default().to_string(), "<anonymous>");
    }
}
