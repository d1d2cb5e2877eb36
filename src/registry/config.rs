//! Registry configuration

use std::time::Duration;

use crate::stream::StreamConfig;

/// Registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Configuration applied to every stream the registry creates
    pub stream: StreamConfig,

    /// How often finished streams are swept out
    pub cleanup_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            cleanup_interval: Duration::from_secs(30),
        }
    }
}

impl RegistryConfig {
    /// Set the per-stream configuration
    pub fn stream(mut self, config: StreamConfig) -> Self {
        self.stream = config;
        self
    }

    /// Set the cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}
