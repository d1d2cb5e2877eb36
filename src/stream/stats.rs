//! Statistics for a relayed stream

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live counters updated by ingest, attach and the engine
#[derive(Debug)]
pub(crate) struct StreamCounters {
    started_at: Instant,
    packets_ingested: AtomicU64,
    bytes_ingested: AtomicU64,
    consumers_attached: AtomicU64,
    consumers_evicted: AtomicU64,
}

impl StreamCounters {
    pub(crate) fn new() -> Self {
        Self {
            started_at: Instant::now(),
            packets_ingested: AtomicU64::new(0),
            bytes_ingested: AtomicU64::new(0),
            consumers_attached: AtomicU64::new(0),
            consumers_evicted: AtomicU64::new(0),
        }
    }

    pub(crate) fn on_packet(&self, size: usize) {
        self.packets_ingested.fetch_add(1, Ordering::Relaxed);
        self.bytes_ingested.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub(crate) fn on_attach(&self) {
        self.consumers_attached.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn on_evict(&self) {
        self.consumers_evicted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, stream_id: &str, consumers: usize) -> StreamStats {
        StreamStats {
            stream_id: stream_id.to_string(),
            duration: self.started_at.elapsed(),
            packets_ingested: self.packets_ingested.load(Ordering::Relaxed),
            bytes_ingested: self.bytes_ingested.load(Ordering::Relaxed),
            consumers,
            consumers_attached: self.consumers_attached.load(Ordering::Relaxed),
            consumers_evicted: self.consumers_evicted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time statistics for a stream
#[derive(Debug, Clone)]
pub struct StreamStats {
    /// Stream identifier
    pub stream_id: String,
    /// Time since the stream was created
    pub duration: Duration,
    /// Packets handed to the broadcast engine
    pub packets_ingested: u64,
    /// Payload bytes handed to the broadcast engine
    pub bytes_ingested: u64,
    /// Sinks currently receiving packets
    pub consumers: usize,
    /// Sinks registered over the stream's lifetime
    pub consumers_attached: u64,
    /// Sinks removed after a write failure
    pub consumers_evicted: u64,
}

impl StreamStats {
    /// Ingest bitrate in bits per second
    pub fn bitrate(&self) -> u64 {
        let secs = self.duration.as_secs();
        if secs > 0 {
            (self.bytes_ingested * 8) / secs
        } else {
            0
        }
    }
}
