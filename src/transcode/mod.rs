//! Segment transcoding
//!
//! Turns a finished segment file into one rendition per target profile by
//! running an external transcoder. The relay core never calls this; it is
//! offered to the owning process as a collaborator.

pub mod ffmpeg;
pub mod profile;

pub use ffmpeg::FfmpegSegmentTranscoder;
pub use profile::VideoProfile;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;

/// Produces derivative renditions of a finished segment
#[async_trait]
pub trait SegmentTranscoder: Send + Sync {
    /// Transcode `input`, returning one output path per profile in profile order
    async fn transcode(&self, input: &Path) -> Result<Vec<PathBuf>>;
}
