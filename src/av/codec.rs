//! Per-track format descriptions
//!
//! A stream header is an ordered list of [`CodecData`], one per track. The
//! relay never interprets the codec configuration bytes; it only carries
//! them from producer to sinks and reads the video dimensions.
//!
//! Codec identifiers follow the FLV numbering used on RTMP:
//! ```text
//! Video: 2=H.263  4=VP6  7=AVC  12=HEVC  13=AV1
//! Audio: 2=MP3   10=AAC 11=Speex 13=Opus
//! ```

use bytes::Bytes;

/// Kind of track a codec describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecType {
    Video,
    Audio,
}

/// Video codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    /// Sorenson H.263
    SorensonH263 = 2,
    /// VP6
    Vp6 = 4,
    /// AVC (H.264)
    Avc = 7,
    /// HEVC (H.265) - enhanced RTMP extension
    Hevc = 12,
    /// AV1 - enhanced RTMP extension
    Av1 = 13,
}

impl VideoCodec {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            2 => Some(VideoCodec::SorensonH263),
            4 => Some(VideoCodec::Vp6),
            7 => Some(VideoCodec::Avc),
            12 => Some(VideoCodec::Hevc),
            13 => Some(VideoCodec::Av1),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VideoCodec::SorensonH263 => "H.263",
            VideoCodec::Vp6 => "VP6",
            VideoCodec::Avc => "H.264",
            VideoCodec::Hevc => "H.265",
            VideoCodec::Av1 => "AV1",
        }
    }
}

/// Audio codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    Mp3 = 2,
    Aac = 10,
    Speex = 11,
    Opus = 13,
}

impl AudioCodec {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            2 => Some(AudioCodec::Mp3),
            10 => Some(AudioCodec::Aac),
            11 => Some(AudioCodec::Speex),
            13 => Some(AudioCodec::Opus),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "MP3",
            AudioCodec::Aac => "AAC",
            AudioCodec::Speex => "Speex",
            AudioCodec::Opus => "Opus",
        }
    }
}

/// Video track description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCodecData {
    pub codec: VideoCodec,
    pub width: u32,
    pub height: u32,
    /// Decoder configuration record (e.g. AVCDecoderConfigurationRecord)
    pub record: Bytes,
}

impl VideoCodecData {
    pub fn new(codec: VideoCodec, width: u32, height: u32, record: Bytes) -> Self {
        Self {
            codec,
            width,
            height,
            record,
        }
    }
}

/// Audio track description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioCodecData {
    pub codec: AudioCodec,
    pub sample_rate: u32,
    pub channels: u8,
    /// Decoder configuration (e.g. AudioSpecificConfig)
    pub config: Bytes,
}

impl AudioCodecData {
    pub fn new(codec: AudioCodec, sample_rate: u32, channels: u8, config: Bytes) -> Self {
        Self {
            codec,
            sample_rate,
            channels,
            config,
        }
    }
}

/// Format description of one track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecData {
    Video(VideoCodecData),
    Audio(AudioCodecData),
}

impl CodecData {
    pub fn codec_type(&self) -> CodecType {
        match self {
            CodecData::Video(_) => CodecType::Video,
            CodecData::Audio(_) => CodecType::Audio,
        }
    }

    pub fn is_video(&self) -> bool {
        self.codec_type() == CodecType::Video
    }

    /// Video parameters, if this is a video track
    pub fn as_video(&self) -> Option<&VideoCodecData> {
        match self {
            CodecData::Video(v) => Some(v),
            CodecData::Audio(_) => None,
        }
    }

    /// Codec display name
    pub fn codec_name(&self) -> &'static str {
        match self {
            CodecData::Video(v) => v.codec.name(),
            CodecData::Audio(a) => a.codec.name(),
        }
    }
}

impl From<VideoCodecData> for CodecData {
    fn from(v: VideoCodecData) -> Self {
        CodecData::Video(v)
    }
}

impl From<AudioCodecData> for CodecData {
    fn from(a: AudioCodecData) -> Self {
        CodecData::Audio(a)
    }
}
