//! Target encoding profiles

/// One target rendition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoProfile {
    pub name: &'static str,
    /// Video bitrate in ffmpeg notation (e.g. "4000k")
    pub bitrate: &'static str,
    pub framerate: u32,
    pub aspect_ratio: &'static str,
    /// "WIDTHxHEIGHT"
    pub resolution: &'static str,
}

impl VideoProfile {
    pub const P720P60FPS16X9: VideoProfile = VideoProfile::preset(
        "P720p60fps16x9",
        "6000k",
        60,
        "16:9",
        "1280x720",
    );
    pub const P720P30FPS16X9: VideoProfile = VideoProfile::preset(
        "P720p30fps16x9",
        "4000k",
        30,
        "16:9",
        "1280x720",
    );
    pub const P720P30FPS4X3: VideoProfile = VideoProfile::preset(
        "P720p30fps4x3",
        "3500k",
        30,
        "4:3",
        "960x720",
    );
    pub const P576P30FPS16X9: VideoProfile = VideoProfile::preset(
        "P576p30fps16x9",
        "1500k",
        30,
        "16:9",
        "1024x576",
    );
    pub const P360P30FPS16X9: VideoProfile = VideoProfile::preset(
        "P360p30fps16x9",
        "1200k",
        30,
        "16:9",
        "640x360",
    );
    pub const P360P30FPS4X3: VideoProfile = VideoProfile::preset(
        "P360p30fps4x3",
        "1000k",
        30,
        "4:3",
        "480x360",
    );
    pub const P240P30FPS16X9: VideoProfile = VideoProfile::preset(
        "P240p30fps16x9",
        "600k",
        30,
        "16:9",
        "426x240",
    );
    pub const P240P30FPS4X3: VideoProfile = VideoProfile::preset(
        "P240p30fps4x3",
        "600k",
        30,
        "4:3",
        "320x240",
    );
    pub const P144P30FPS16X9: VideoProfile = VideoProfile::preset(
        "P144p30fps16x9",
        "400k",
        30,
        "16:9",
        "256x144",
    );

    const fn preset(
        name: &'static str,
        bitrate: &'static str,
        framerate: u32,
        aspect_ratio: &'static str,
        resolution: &'static str,
    ) -> Self {
        Self {
            name,
            bitrate,
            framerate,
            aspect_ratio,
            resolution,
        }
    }

    /// All built-in presets, highest quality first
    pub fn presets() -> [VideoProfile; 9] {
        [
            Self::P720P60FPS16X9,
            Self::P720P30FPS16X9,
            Self::P720P30FPS4X3,
            Self::P576P30FPS16X9,
            Self::P360P30FPS16X9,
            Self::P360P30FPS4X3,
            Self::P240P30FPS16X9,
            Self::P240P30FPS4X3,
            Self::P144P30FPS16X9,
        ]
    }

    /// Look up a preset by name
    pub fn by_name(name: &str) -> Option<VideoProfile> {
        Self::presets().into_iter().find(|p| p.name == name)
    }

    /// Parsed (width, height)
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let (w, h) = self.resolution.split_once('x')?;
        Some((w.parse().ok()?, h.parse().ok()?))
    }
}
