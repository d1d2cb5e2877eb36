//! Packet and header model
//!
//! This module provides:
//! - `Packet`: one unit of encoded media with track and timing metadata
//! - `CodecData`: per-track format description; a stream's header is an
//!   ordered list of these
//! - `Demuxer` / `Muxer`: the producer and sink capabilities the relay
//!   consumes. Container parsing and encoding live behind these traits.

pub mod codec;
pub mod packet;
pub mod traits;

pub use codec::{AudioCodec, AudioCodecData, CodecData, CodecType, VideoCodec, VideoCodecData};
pub use packet::Packet;
pub use traits::{Demuxer, Muxer};

use std::sync::Arc;

/// Immutable stream header shared by every consumer
pub type Header = Arc<[CodecData]>;
