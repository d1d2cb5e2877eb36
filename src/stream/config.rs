//! Stream configuration

use std::time::Duration;

/// Per-stream tuning
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// How long `attach` waits for the producer's header before giving up
    pub header_timeout: Duration,

    /// Packets buffered between ingest and the broadcast engine.
    /// Ingest blocks (cancellably) once this many packets are pending.
    pub queue_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            header_timeout: Duration::from_millis(300),
            queue_capacity: 1024,
        }
    }
}

impl StreamConfig {
    /// Set the header wait timeout
    pub fn header_timeout(mut self, timeout: Duration) -> Self {
        self.header_timeout = timeout;
        self
    }

    /// Set the queue capacity (at least 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}
