//! Registry error types

use super::key::StreamKey;

/// Error type for registry operations
#[derive(Debug, Clone)]
pub enum RegistryError {
    /// Stream not found
    StreamNotFound(StreamKey),
    /// A stream with this key is already registered
    StreamAlreadyExists(StreamKey),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::StreamNotFound(key) => write!(f, "Stream not found: {}", key),
            RegistryError::StreamAlreadyExists(key) => {
                write!(f, "Stream already exists: {}", key)
            }
        }
    }
}

impl std::error::Error for RegistryError {}
