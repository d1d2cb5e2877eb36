//! Stream registry implementation

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::stream::RtmpVideoStream;

use super::config::RegistryConfig;
use super::error::RegistryError;
use super::key::StreamKey;

/// Central registry for all live streams in the process
///
/// Thread-safe via `RwLock`. Lookups from attaching sinks take the read lock;
/// only create, remove and cleanup take the write lock.
pub struct StreamRegistry {
    streams: RwLock<HashMap<StreamKey, Arc<RtmpVideoStream>>>,
    config: RegistryConfig,
}

impl StreamRegistry {
    /// Create a new stream registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new stream registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Create and register a new stream
    ///
    /// Fails if a stream with this key is already registered.
    pub async fn create(&self, key: &StreamKey) -> Result<Arc<RtmpVideoStream>, RegistryError> {
        let mut streams = self.streams.write().await;

        if streams.contains_key(key) {
            return Err(RegistryError::StreamAlreadyExists(key.clone()));
        }

        let stream = Arc::new(RtmpVideoStream::with_config(
            key.to_string(),
            self.config.stream.clone(),
        ));
        streams.insert(key.clone(), Arc::clone(&stream));

        tracing::info!(stream = %key, streams = streams.len(), "Stream registered");

        Ok(stream)
    }

    /// Look up a stream
    pub async fn get(&self, key: &StreamKey) -> Result<Arc<RtmpVideoStream>, RegistryError> {
        self.streams
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| RegistryError::StreamNotFound(key.clone()))
    }

    /// Look up a stream, creating it if absent
    ///
    /// A finished stream under the same key is replaced by a fresh one.
    pub async fn get_or_create(&self, key: &StreamKey) -> Arc<RtmpVideoStream> {
        let mut streams = self.streams.write().await;

        if let Some(stream) = streams.get(key) {
            if !stream.is_finished() {
                return Arc::clone(stream);
            }
            tracing::debug!(stream = %key, "Replacing finished stream");
        }

        let stream = Arc::new(RtmpVideoStream::with_config(
            key.to_string(),
            self.config.stream.clone(),
        ));
        streams.insert(key.clone(), Arc::clone(&stream));

        tracing::info!(stream = %key, streams = streams.len(), "Stream registered");

        stream
    }

    /// Remove a stream from the registry
    ///
    /// The stream itself keeps running for whoever still holds it.
    pub async fn remove(&self, key: &StreamKey) -> Option<Arc<RtmpVideoStream>> {
        let removed = self.streams.write().await.remove(key);
        if removed.is_some() {
            tracing::info!(stream = %key, "Stream unregistered");
        }
        removed
    }

    /// Get total number of streams
    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }

    /// Run cleanup once
    ///
    /// Removes streams whose queue closed and whose trailers have all been
    /// written. Returns the number of streams removed.
    pub async fn cleanup(&self) -> usize {
        let mut streams = self.streams.write().await;
        let before = streams.len();

        streams.retain(|key, stream| {
            let finished = stream.is_finished();
            if finished {
                tracing::info!(stream = %key, "Stream removed by cleanup");
            }
            !finished
        });

        before - streams.len()
    }

    /// Spawn background cleanup task
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        let interval = registry.config.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                registry.cleanup().await;
            }
        })
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
