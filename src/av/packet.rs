//! Media packet

use std::time::Duration;

use bytes::Bytes;

/// A single encoded media packet
///
/// Cheap to clone: `data` is reference counted, so fanning one packet out to
/// many sinks never copies the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Index of the track in the stream header this packet belongs to
    pub idx: u8,
    /// Whether this is a keyframe (video only)
    pub is_keyframe: bool,
    /// Decode timestamp relative to stream start
    pub time: Duration,
    /// Presentation offset from `time` (B-frames)
    pub composition_time: Duration,
    /// Encoded payload
    pub data: Bytes,
}

impl Packet {
    /// Create a packet for track `idx` at `time`
    pub fn new(idx: u8, time: Duration, data: Bytes) -> Self {
        Self {
            idx,
            is_keyframe: false,
            time,
            composition_time: Duration::ZERO,
            data,
        }
    }

    /// Mark this packet as a keyframe
    pub fn keyframe(mut self) -> Self {
        self.is_keyframe = true;
        self
    }

    /// Set the composition time offset
    pub fn with_composition_time(mut self, cts: Duration) -> Self {
        self.composition_time = cts;
        self
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// A packet without payload is never valid; it signals a dropped feed
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_builder() {
        let pkt = Packet::new(1, Duration::from_millis(40), Bytes::from_static(&[0x17, 0x01]))
            .keyframe()
            .with_composition_time(Duration::from_millis(80));

        assert_eq!(pkt.idx, 1);
        assert!(pkt.is_keyframe);
        assert_eq!(pkt.time, Duration::from_millis(40));
        assert_eq!(pkt.composition_time, Duration::from_millis(80));
        assert_eq!(pkt.len(), 2);
    }

    #[test]
    fn test_empty_packet() {
        let pkt = Packet::new(0, Duration::ZERO, Bytes::new());
        assert!(pkt.is_empty());
    }

    #[test]
    fn test_clone_shares_payload() {
        let pkt = Packet::new(0, Duration::ZERO, Bytes::from(vec![1u8; 1024]));
        let copy = pkt.clone();
        assert_eq!(pkt.data.as_ptr(), copy.data.as_ptr());
    }
}
