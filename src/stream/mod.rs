//! Live stream relay
//!
//! A stream takes packets from exactly one producer and fans them out to any
//! number of sinks that attach and fail independently while it is live.
//!
//! # Architecture
//!
//! ```text
//!   Demuxer ──► ingest() ──► mpsc queue ──► engine task ──┬──► Muxer (attach #1)
//!                  │                                      ├──► Muxer (attach #2)
//!                  └──► header (write once) ◄── attach()  └──► Muxer (attach #N)
//! ```
//!
//! - `ingest` runs on the caller's task and stops on end of stream, on a
//!   source fault, or when the caller's `CancellationToken` fires. Every
//!   terminal outcome after the header is captured closes the queue.
//! - The engine task owns the fan-out. A sink whose write fails is removed
//!   under the consumer lock and told why through its one-shot channel.
//! - `attach` waits (bounded) for the header, writes it to the new sink,
//!   registers the sink and then blocks until the sink is detached.

pub mod config;
mod engine;
mod header;
pub mod rtmp;
pub mod stats;

pub use config::StreamConfig;
pub use rtmp::RtmpVideoStream;
pub use stats::StreamStats;

use std::fmt;

/// Delivery format of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFormat {
    Rtmp,
    Hls,
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoFormat::Rtmp => write!(f, "RTMP"),
            VideoFormat::Hls => write!(f, "HLS"),
        }
    }
}

/// Identity and format of a live stream as seen by its owning process
pub trait VideoStream: fmt::Display + Send + Sync {
    /// Opaque stream identifier
    fn id(&self) -> &str;

    /// Delivery format
    fn format(&self) -> VideoFormat;

    /// Frame width of the first video track, 0 until a header is known
    fn width(&self) -> u32;

    /// Frame height of the first video track, 0 until a header is known
    fn height(&self) -> u32;
}
