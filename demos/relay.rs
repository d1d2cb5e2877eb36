//! In-memory relay demo
//!
//! Run with: cargo run --example relay
//!
//! A synthetic 30fps producer is ingested into a registry stream. Three
//! sinks attach at different times:
//! - `early` attaches right away and sees (nearly) the whole stream
//! - `flaky` fails after 20 packets and is evicted; the others keep going
//! - `late` attaches one second in and starts with the header
//!
//! Press Ctrl+C to stop the producer early; every sink still gets a trailer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use rtmp_relay::av::{AudioCodec, AudioCodecData, VideoCodec, VideoCodecData};
use rtmp_relay::{
    CodecData, Demuxer, Error, Muxer, Packet, Result, RtmpVideoStream, StreamKey, StreamRegistry,
    VideoStream,
};

/// Emits a keyframe every 30 packets at 30fps until `total` packets are out
struct SyntheticSource {
    sent: u64,
    total: u64,
    ticker: tokio::time::Interval,
}

impl SyntheticSource {
    fn new(total: u64) -> Self {
        Self {
            sent: 0,
            total,
            ticker: tokio::time::interval(Duration::from_millis(33)),
        }
    }
}

#[async_trait]
impl Demuxer for SyntheticSource {
    async fn streams(&mut self) -> Result<Vec<CodecData>> {
        Ok(vec![
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
        ])
    }

    async fn read_packet(&mut self) -> Result<Option<Packet>> {
        if self.sent == self.total {
            return Ok(None);
        }
        self.ticker.tick().await;

        let time = Duration::from_millis(self.sent * 33);
        let mut packet = Packet::new(0, time, Bytes::from(vec![0u8; 1500]));
        if self.sent % 30 == 0 {
            packet = packet.keyframe();
        }
        self.sent += 1;
        Ok(Some(packet))
    }
}

/// Logs what it receives; optionally fails after `fail_after` packets
struct LogSink {
    name: &'static str,
    packets: u64,
    fail_after: Option<u64>,
}

impl LogSink {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            packets: 0,
            fail_after: None,
        }
    }

    fn failing_after(name: &'static str, n: u64) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::new(name)
        }
    }
}

#[async_trait]
impl Muxer for LogSink {
    async fn write_header(&mut self, streams: &[CodecData]) -> Result<()> {
        let codecs: Vec<_> = streams.iter().map(|cd| cd.codec_name()).collect();
        tracing::info!(sink = self.name, codecs = ?codecs, "Header");
        Ok(())
    }

    async fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        if self.fail_after == Some(self.packets) {
            return Err(Error::sink_failed("simulated network drop"));
        }
        self.packets += 1;
        if packet.is_keyframe {
            tracing::info!(sink = self.name, time = ?packet.time, "Keyframe");
        }
        Ok(())
    }

    async fn write_trailer(&mut self) -> Result<()> {
        tracing::info!(sink = self.name, packets = self.packets, "Trailer");
        Ok(())
    }
}

fn spawn_sink(
    stream: &Arc<RtmpVideoStream>,
    sink: LogSink,
    delay: Duration,
) -> tokio::task::JoinHandle<()> {
    let stream = Arc::clone(stream);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let name = sink.name;
        match stream.attach(sink, &CancellationToken::new()).await {
            Ok(()) => tracing::info!(sink = name, "Sink finished"),
            Err(e) => tracing::warn!(sink = name, error = %e, "Sink detached"),
        }
    })
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rtmp_relay=debug".parse()?)
                .add_directive("relay=info".parse()?),
        )
        .init();

    let registry = Arc::new(StreamRegistry::new());
    let cleanup = registry.spawn_cleanup_task();
    let stream = registry.create(&StreamKey::new("live", "demo")).await?;

    let sinks = vec![
        spawn_sink(&stream, LogSink::new("early"), Duration::ZERO),
        spawn_sink(&stream, LogSink::failing_after("flaky", 20), Duration::ZERO),
        spawn_sink(&stream, LogSink::new("late"), Duration::from_secs(1)),
    ];

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    match stream.ingest(SyntheticSource::new(90), &cancel).await {
        Ok(packets) => tracing::info!(%stream, packets, "Producer finished"),
        Err(e) => tracing::warn!(%stream, error = %e, "Producer stopped"),
    }

    for sink in sinks {
        sink.await?;
    }

    let stats = stream.stats().await;
    tracing::info!(
        width = stream.width(),
        height = stream.height(),
        packets = stats.packets_ingested,
        evicted = stats.consumers_evicted,
        bitrate = stats.bitrate(),
        "Done"
    );

    cleanup.abort();
    Ok(())
}
