//! RTMP live stream
//!
//! Ingest side and attach side of a single relayed stream. See the module
//! docs of [`crate::stream`] for the overall flow.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::av::{Demuxer, Header, Muxer, Packet};
use crate::error::{Error, Result};

use super::config::StreamConfig;
use super::engine::{self, Consumers, Detached};
use super::header::HeaderCell;
use super::stats::{StreamCounters, StreamStats};
use super::{VideoFormat, VideoStream};

/// A live RTMP stream relayed from one producer to many sinks
pub struct RtmpVideoStream {
    id: String,
    config: StreamConfig,
    header: HeaderCell,
    /// Producer end of the packet queue; taken by the first ingest that
    /// gets a header, dropped to close the queue.
    queue: Mutex<Option<mpsc::Sender<Packet>>>,
    consumers: Arc<Consumers>,
    counters: Arc<StreamCounters>,
    engine: JoinHandle<()>,
}

impl RtmpVideoStream {
    /// Create a stream with default configuration
    ///
    /// Spawns the broadcast engine, so this must run inside a tokio runtime.
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_config(id, StreamConfig::default())
    }

    /// Create a stream with custom configuration
    pub fn with_config(id: impl Into<String>, config: StreamConfig) -> Self {
        let id = id.into();
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let counters = Arc::new(StreamCounters::new());
        let consumers = Arc::new(Consumers::new(id.clone(), Arc::clone(&counters)));
        let engine = engine::spawn(rx, Arc::clone(&consumers));

        tracing::debug!(stream = %id, "Stream created");

        Self {
            id,
            config,
            header: HeaderCell::new(),
            queue: Mutex::new(Some(tx)),
            consumers,
            counters,
            engine,
        }
    }

    /// Stream configuration
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Current header, if the producer has supplied one
    pub fn header(&self) -> Option<Header> {
        self.header.get()
    }

    /// Number of sinks currently receiving packets
    pub async fn consumer_count(&self) -> usize {
        self.consumers.len().await
    }

    /// Whether the queue has closed and every trailer has been written
    pub fn is_finished(&self) -> bool {
        self.engine.is_finished()
    }

    /// Get stream statistics
    pub async fn stats(&self) -> StreamStats {
        let consumers = self.consumers.len().await;
        self.counters.snapshot(&self.id, consumers)
    }

    /// Pull the producer's header and packets into the stream
    ///
    /// Returns the number of packets forwarded once the producer signals a
    /// clean end of stream. Returns the producer's error on a source fault,
    /// [`Error::DroppedFeed`] on an empty packet, and [`Error::Cancelled`]
    /// when `cancel` fires. Once the header has been captured, every outcome
    /// closes the queue so attached sinks get their trailer. The producer
    /// is closed on every path.
    ///
    /// A producer's end of stream is not an error here: it maps to
    /// `Ok(count)`, and only genuine faults come back as `Err`.
    pub async fn ingest<D: Demuxer>(&self, mut src: D, cancel: &CancellationToken) -> Result<u64> {
        let result = self.pump(&mut src, cancel).await;

        if let Err(e) = src.close().await {
            tracing::debug!(stream = %self.id, error = %e, "Error closing source");
        }

        match &result {
            Ok(packets) => {
                tracing::info!(
                    stream = %self.id,
                    packets = packets,
                    "Source reached end of stream"
                );
            }
            Err(Error::Cancelled) => {
                tracing::info!(stream = %self.id, "Ingest cancelled");
            }
            Err(e) => {
                tracing::warn!(stream = %self.id, error = %e, "Ingest stopped");
            }
        }

        result
    }

    async fn pump<D: Demuxer>(&self, src: &mut D, cancel: &CancellationToken) -> Result<u64> {
        let streams = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            streams = src.streams() => streams?,
        };

        // Held until return; dropping it closes the queue.
        let tx = self.queue.lock().await.take().ok_or(Error::StreamClosed)?;

        if !self.header.set(Arc::from(streams)) {
            tracing::warn!(stream = %self.id, "Header already set, keeping the first one");
        }
        tracing::info!(
            stream = %self.id,
            tracks = self.header().map_or(0, |h| h.len()),
            "Header received"
        );

        let mut forwarded = 0u64;
        loop {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                read = src.read_packet() => read?,
            };

            let packet = match read {
                Some(packet) => packet,
                None => return Ok(forwarded),
            };
            if packet.is_empty() {
                return Err(Error::DroppedFeed);
            }

            let size = packet.len();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                sent = tx.send(packet) => sent.map_err(|_| Error::StreamClosed)?,
            }

            self.counters.on_packet(size);
            forwarded += 1;
        }
    }

    /// Relay this stream into `sink` until it is detached
    ///
    /// Waits up to the configured header timeout for the header, writes it,
    /// registers the sink with the broadcast engine and then blocks until
    /// the stream ends (`Ok`), a write to the sink fails (that error), or
    /// `cancel` fires ([`Error::Cancelled`]). The sink is closed on return.
    ///
    /// Dropping the returned future after the sink is registered leaves it
    /// with the engine, which removes and closes it before the next write.
    pub async fn attach<M: Muxer + 'static>(
        &self,
        sink: M,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (sink, result) = self.relay_into(Box::new(sink), cancel).await;

        if let Some(mut sink) = sink {
            if let Err(e) = sink.close().await {
                tracing::debug!(stream = %self.id, error = %e, "Error closing sink");
            }
        }

        result
    }

    async fn relay_into(
        &self,
        mut sink: Box<dyn Muxer>,
        cancel: &CancellationToken,
    ) -> (Option<Box<dyn Muxer>>, Result<()>) {
        let header = tokio::select! {
            biased;
            _ = cancel.cancelled() => return (Some(sink), Err(Error::Cancelled)),
            header = self.header.wait(self.config.header_timeout) => header,
        };

        let header = match header {
            Some(header) => header,
            None => {
                tracing::debug!(stream = %self.id, "No header before timeout");
                return (Some(sink), Err(Error::NoHeader));
            }
        };

        if let Err(e) = sink.write_header(&header).await {
            tracing::error!(stream = %self.id, error = %e, "Error writing header to sink");
            return (Some(sink), Err(e));
        }

        let (id, mut done) = match self.consumers.register(sink).await {
            Ok(registered) => registered,
            Err(mut sink) => {
                // Engine already wrote its trailers; this sink gets an empty stream.
                let result = sink.write_trailer().await;
                return (Some(sink), result);
            }
        };

        tokio::select! {
            detached = &mut done => Self::outcome(detached),
            _ = cancel.cancelled() => match self.consumers.remove(id).await {
                Some(sink) => (Some(sink), Err(Error::Cancelled)),
                // Lost the race with the engine; its verdict is already sent.
                None => Self::outcome(done.await),
            },
        }
    }

    fn outcome(
        detached: std::result::Result<Detached, tokio::sync::oneshot::error::RecvError>,
    ) -> (Option<Box<dyn Muxer>>, Result<()>) {
        match detached {
            Ok(Detached { sink, result }) => (Some(sink), result),
            Err(_) => (None, Err(Error::StreamClosed)),
        }
    }
}

impl VideoStream for RtmpVideoStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn format(&self) -> VideoFormat {
        VideoFormat::Rtmp
    }

    fn width(&self) -> u32 {
        self.header
            .get()
            .and_then(|h| h.iter().find_map(|cd| cd.as_video().map(|v| v.width)))
            .unwrap_or(0)
    }

    fn height(&self) -> u32 {
        self.header
            .get()
            .and_then(|h| h.iter().find_map(|cd| cd.as_video().map(|v| v.height)))
            .unwrap_or(0)
    }
}

impl fmt::Display for RtmpVideoStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamID: {}, Type: {}", self.id, self.format())
    }
}

impl fmt::Debug for RtmpVideoStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtmpVideoStream")
            .field("id", &self.id)
            .field("has_header", &self.header.get().is_some())
            .field("finished", &self.engine.is_finished())
            .finish_non_exhaustive()
    }
}
