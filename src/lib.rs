//! # rtmp-relay
//!
//! In-process relay for live media: one producer (an RTMP ingest, a file
//! reader, anything implementing [`Demuxer`]) is fanned out to a changing
//! set of sinks (anything implementing [`Muxer`]). Sinks can attach at any
//! point while the stream is live and fail independently without disturbing
//! the producer or each other.
//!
//! ```no_run
//! use rtmp_relay::{RtmpVideoStream, StreamRegistry, StreamKey};
//! use tokio_util::sync::CancellationToken;
//! # use rtmp_relay::{Demuxer, Muxer};
//! # async fn example(src: impl Demuxer, sink: impl Muxer + 'static) -> rtmp_relay::Result<()> {
//! let registry = StreamRegistry::new();
//! let stream = registry.get_or_create(&StreamKey::new("live", "cam1")).await;
//!
//! let cancel = CancellationToken::new();
//! let player = {
//!     let stream = stream.clone();
//!     let cancel = cancel.clone();
//!     tokio::spawn(async move { stream.attach(sink, &cancel).await })
//! };
//!
//! stream.ingest(src, &cancel).await?;
//! # let _ = player.await;
//! # Ok(())
//! # }
//! ```
//!
//! Container parsing and network transport are out of scope: they sit
//! behind the [`Demuxer`] and [`Muxer`] traits.

pub mod av;
pub mod error;
pub mod registry;
pub mod stream;
pub mod transcode;

pub use av::{CodecData, Demuxer, Header, Muxer, Packet};
pub use error::{Error, Result};
pub use registry::{RegistryConfig, StreamKey, StreamRegistry};
pub use stream::{RtmpVideoStream, StreamConfig, VideoFormat, VideoStream};
