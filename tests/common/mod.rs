//! Scripted producers and recording sinks shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use rtmp_relay::av::{AudioCodec, AudioCodecData, VideoCodec, VideoCodecData};
use rtmp_relay::{CodecData, Demuxer, Error, Muxer, Packet, Result, RtmpVideoStream};

/// What a recording sink saw, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Header(usize),
    Packet(u64),
    Trailer,
    Close,
}

/// Where a recording sink should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Never,
    Header,
    /// Packet with this sequence number
    Packet(u64),
    Trailer,
}

/// Sink that appends every call to a shared trace
pub struct RecordingMuxer {
    trace: Arc<Mutex<Vec<Event>>>,
    fail_on: FailOn,
}

impl RecordingMuxer {
    pub fn new() -> (Self, Trace) {
        Self::failing(FailOn::Never)
    }

    pub fn failing(fail_on: FailOn) -> (Self, Trace) {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let sink = Self {
            trace: Arc::clone(&trace),
            fail_on,
        };
        (sink, Trace(trace))
    }

    fn push(&self, event: Event) {
        self.trace.lock().unwrap().push(event);
    }
}

#[async_trait]
impl Muxer for RecordingMuxer {
    async fn write_header(&mut self, streams: &[CodecData]) -> Result<()> {
        if self.fail_on == FailOn::Header {
            return Err(Error::sink_failed("header rejected"));
        }
        self.push(Event::Header(streams.len()));
        Ok(())
    }

    async fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        let seq = seq_of(packet);
        if self.fail_on == FailOn::Packet(seq) {
            return Err(Error::sink_failed(format!("packet {} rejected", seq)));
        }
        self.push(Event::Packet(seq));
        Ok(())
    }

    async fn write_trailer(&mut self) -> Result<()> {
        if self.fail_on == FailOn::Trailer {
            return Err(Error::sink_failed("trailer rejected"));
        }
        self.push(Event::Trailer);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.push(Event::Close);
        Ok(())
    }
}

/// Read side of a recording sink's trace
#[derive(Clone)]
pub struct Trace(Arc<Mutex<Vec<Event>>>);

impl Trace {
    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn packets(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Packet(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    /// Wait until this sink has seen `n` packets
    pub async fn wait_packets(&self, n: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(2), async {
            while self.packets().len() < n {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "sink saw {:?}, wanted {} packets", self.events(), n);
    }
}

/// Producer fed packet by packet from the test body
///
/// `streams` answers immediately with the configured header. Each
/// `read_packet` waits for the next item from the feed; dropping the feed
/// is a clean end of stream.
pub struct FeedDemuxer {
    header: Result<Vec<CodecData>>,
    rx: mpsc::UnboundedReceiver<Result<Packet>>,
    closed: Arc<AtomicBool>,
}

pub struct Feed {
    tx: mpsc::UnboundedSender<Result<Packet>>,
    closed: Arc<AtomicBool>,
}

impl FeedDemuxer {
    pub fn new(header: Vec<CodecData>) -> (Self, Feed) {
        Self::with_header(Ok(header))
    }

    pub fn with_header(header: Result<Vec<CodecData>>) -> (Self, Feed) {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let demuxer = Self {
            header,
            rx,
            closed: Arc::clone(&closed),
        };
        (demuxer, Feed { tx, closed })
    }
}

impl Feed {
    pub fn packet(&self, seq: u64) {
        let _ = self.tx.send(Ok(packet(seq)));
    }

    pub fn packets(&self, seqs: std::ops::RangeInclusive<u64>) {
        for seq in seqs {
            self.packet(seq);
        }
    }

    pub fn empty_packet(&self) {
        let _ = self.tx.send(Ok(Packet::new(0, Duration::ZERO, Bytes::new())));
    }

    pub fn error(&self, err: Error) {
        let _ = self.tx.send(Err(err));
    }

    pub fn source_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Demuxer for FeedDemuxer {
    async fn streams(&mut self) -> Result<Vec<CodecData>> {
        match &self.header {
            Ok(h) => Ok(h.clone()),
            Err(e) => Err(Error::source_failed(e.to_string())),
        }
    }

    async fn read_packet(&mut self) -> Result<Option<Packet>> {
        match self.rx.recv().await {
            Some(item) => item.map(Some),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Packet whose timestamp encodes its sequence number
pub fn packet(seq: u64) -> Packet {
    Packet::new(0, Duration::from_millis(seq), Bytes::from(vec![0u8; 16]))
}

pub fn seq_of(packet: &Packet) -> u64 {
    packet.time.as_millis() as u64
}

/// One 1280x720 H.264 track plus one AAC track
pub fn header() -> Vec<CodecData> {
    vec![
        CodecData::Video(VideoCodecData::new(
            VideoCodec::Avc,
            1280,
            720,
            Bytes::from_static(&[0x01, 0x64, 0x00, 0x1f]),
        )),
        CodecData::Audio(AudioCodecData::new(
            AudioCodec::Aac,
            44100,
            2,
            Bytes::from_static(&[0x12, 0x10]),
        )),
    ]
}

/// Wait until exactly `n` sinks are registered
pub async fn wait_consumers(stream: &RtmpVideoStream, n: usize) {
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        while stream.consumer_count().await != n {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "expected {} consumers", n);
}
