//! ffmpeg-backed segment transcoder

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Result, TranscodeError};

use super::profile::VideoProfile;
use super::SegmentTranscoder;

/// Transcodes each segment with a single ffmpeg invocation
///
/// Output for profile `i` of input `seg.ts` is written to
/// `<work_dir>/out<i>seg.ts`.
#[derive(Debug, Clone)]
pub struct FfmpegSegmentTranscoder {
    profiles: Vec<VideoProfile>,
    work_dir: PathBuf,
    ffmpeg: PathBuf,
}

impl FfmpegSegmentTranscoder {
    /// Create a transcoder using `ffmpeg` from `PATH`
    pub fn new(profiles: Vec<VideoProfile>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            profiles,
            work_dir: work_dir.into(),
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }

    /// Use a specific ffmpeg binary
    pub fn ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg = path.into();
        self
    }

    pub fn profiles(&self) -> &[VideoProfile] {
        &self.profiles
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Output path for every profile, in profile order
    pub fn output_paths(&self, input: &Path) -> Vec<PathBuf> {
        let base = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (0..self.profiles.len())
            .map(|i| self.work_dir.join(format!("out{}{}", i, base)))
            .collect()
    }

    /// Command line arguments for one run
    fn args(&self, input: &Path, outputs: &[PathBuf]) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];

        for (profile, output) in self.profiles.iter().zip(outputs) {
            let mut filters = format!("fps={}", profile.framerate);
            if let Some((w, h)) = profile.dimensions() {
                filters.push_str(&format!(",scale={}:{}", w, h));
            }

            args.extend(
                [
                    "-map", "0:v:0?", "-map", "0:a:0?", "-c:v", "libx264", "-b:v", profile.bitrate,
                    "-vf",
                ]
                .into_iter()
                .map(OsString::from),
            );
            args.push(filters.into());
            args.extend(["-c:a", "aac"].into_iter().map(OsString::from));
            args.push(output.into());
        }

        args
    }
}

#[async_trait]
impl SegmentTranscoder for FfmpegSegmentTranscoder {
    async fn transcode(&self, input: &Path) -> Result<Vec<PathBuf>> {
        if self.profiles.is_empty() {
            return Err(TranscodeError::NoProfiles.into());
        }

        let outputs = self.output_paths(input);
        let output = Command::new(&self.ffmpeg)
            .args(self.args(input, &outputs))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(TranscodeError::Spawn)?;

        if !output.status.success() {
            let err = TranscodeError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            };
            tracing::error!(input = %input.display(), error = %err, "Error transcoding");
            return Err(err.into());
        }

        tracing::debug!(
            input = %input.display(),
            renditions = outputs.len(),
            "Segment transcoded"
        );

        Ok(outputs)
    }
}
