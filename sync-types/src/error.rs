//! Error types for the DevBits sync types.

use thiserror::Error;

/// Errors produced while constructing sync types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Username was empty or whitespace only.
    #[error("invalid username: {0:?}")]
    InvalidUsername(String),
}
