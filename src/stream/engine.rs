//! Broadcast engine and consumer set
//!
//! One engine task per stream drains the packet queue and writes each packet
//! to every registered sink. The consumer set lives behind a single async
//! mutex held for a whole fan-out pass, so an attach or cancellation can
//! never interleave with iteration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::av::{Muxer, Packet};
use crate::error::Result;

use super::stats::StreamCounters;

/// Outcome handed back to the attaching caller when its sink leaves the stream
pub(crate) struct Detached {
    pub(crate) sink: Box<dyn Muxer>,
    pub(crate) result: Result<()>,
}

struct Consumer {
    id: u64,
    sink: Box<dyn Muxer>,
    done: oneshot::Sender<Detached>,
}

impl Consumer {
    /// Whether the attach call that owns this consumer has been dropped
    fn is_orphaned(&self) -> bool {
        self.done.is_closed()
    }

    /// Hand the sink back to its attach call, or close it if nobody is waiting
    async fn detach(self, result: Result<()>) {
        let id = self.id;
        if let Err(orphan) = self.done.send(Detached {
            sink: self.sink,
            result,
        }) {
            close_orphan(id, orphan.sink).await;
        }
    }
}

async fn close_orphan(id: u64, mut sink: Box<dyn Muxer>) {
    if let Err(e) = sink.close().await {
        tracing::debug!(consumer = id, error = %e, "Error closing orphaned sink");
    }
}

#[derive(Default)]
struct ConsumerSet {
    consumers: Vec<Consumer>,
    /// Set once the queue closed and trailers went out
    closed: bool,
}

/// Sinks currently receiving a stream
pub(crate) struct Consumers {
    stream_id: String,
    inner: Mutex<ConsumerSet>,
    next_id: AtomicU64,
    counters: Arc<StreamCounters>,
}

impl Consumers {
    pub(crate) fn new(stream_id: String, counters: Arc<StreamCounters>) -> Self {
        Self {
            stream_id,
            inner: Mutex::new(ConsumerSet::default()),
            next_id: AtomicU64::new(1),
            counters,
        }
    }

    /// Add a sink that has already received the header
    ///
    /// Hands the sink back if the engine has shut down.
    pub(crate) async fn register(
        &self,
        sink: Box<dyn Muxer>,
    ) -> std::result::Result<(u64, oneshot::Receiver<Detached>), Box<dyn Muxer>> {
        let mut set = self.inner.lock().await;
        if set.closed {
            return Err(sink);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (done, rx) = oneshot::channel();
        set.consumers.push(Consumer { id, sink, done });
        self.counters.on_attach();

        tracing::debug!(
            stream = %self.stream_id,
            consumer = id,
            consumers = set.consumers.len(),
            "Consumer attached"
        );

        Ok((id, rx))
    }

    /// Remove a sink on its owner's request
    ///
    /// Returns `None` if the engine already detached it.
    pub(crate) async fn remove(&self, id: u64) -> Option<Box<dyn Muxer>> {
        let mut set = self.inner.lock().await;
        let pos = set.consumers.iter().position(|c| c.id == id)?;
        let consumer = set.consumers.remove(pos);

        tracing::debug!(
            stream = %self.stream_id,
            consumer = id,
            consumers = set.consumers.len(),
            "Consumer detached by caller"
        );

        Some(consumer.sink)
    }

    pub(crate) async fn len(&self) -> usize {
        self.inner.lock().await.consumers.len()
    }

    /// Write one packet to every sink, evicting those that fail
    async fn broadcast(&self, packet: &Packet) {
        let mut set = self.inner.lock().await;

        let mut i = 0;
        while i < set.consumers.len() {
            if set.consumers[i].is_orphaned() {
                let consumer = set.consumers.remove(i);
                tracing::debug!(
                    stream = %self.stream_id,
                    consumer = consumer.id,
                    "Attach dropped, closing consumer"
                );
                close_orphan(consumer.id, consumer.sink).await;
                continue;
            }

            let written = set.consumers[i].sink.write_packet(packet).await;
            match written {
                Ok(()) => i += 1,
                Err(e) => {
                    // Index stays put: the next consumer shifts into slot i.
                    let consumer = set.consumers.remove(i);
                    tracing::warn!(
                        stream = %self.stream_id,
                        consumer = consumer.id,
                        error = %e,
                        "Error writing packet, detaching consumer"
                    );
                    self.counters.on_evict();
                    consumer.detach(Err(e)).await;
                }
            }
        }
    }

    /// Write the trailer to every remaining sink and refuse new ones
    async fn shutdown(&self) {
        let mut set = self.inner.lock().await;
        set.closed = true;

        let remaining = std::mem::take(&mut set.consumers);
        tracing::info!(
            stream = %self.stream_id,
            consumers = remaining.len(),
            "Stream ended, writing trailers"
        );

        for mut consumer in remaining {
            let result = consumer.sink.write_trailer().await;
            if let Err(ref e) = result {
                tracing::error!(
                    stream = %self.stream_id,
                    consumer = consumer.id,
                    error = %e,
                    "Error writing trailer"
                );
            }
            consumer.detach(result).await;
        }
    }
}

/// Spawn the engine task for a stream
///
/// Runs until every sender of `queue` is dropped.
pub(crate) fn spawn(
    mut queue: mpsc::Receiver<Packet>,
    consumers: Arc<Consumers>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(packet) = queue.recv().await {
            consumers.broadcast(&packet).await;
        }
        consumers.shutdown().await;
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::av::CodecData;
    use crate::error::Error;

    /// Records packet timestamps; fails on the given packet index
    struct Recorder {
        seen: Arc<StdMutex<Vec<u64>>>,
        fail_at: Option<u64>,
        trailers: Arc<AtomicU64>,
    }

    #[async_trait]
    impl Muxer for Recorder {
        async fn write_header(&mut self, _: &[CodecData]) -> Result<()> {
            Ok(())
        }

        async fn write_packet(&mut self, packet: &Packet) -> Result<()> {
            let n = packet.time.as_millis() as u64;
            tokio::task::yield_now().await;
            if self.fail_at == Some(n) {
                return Err(Error::sink_failed("write failed"));
            }
            self.seen.lock().unwrap().push(n);
            Ok(())
        }

        async fn write_trailer(&mut self) -> Result<()> {
            self.trailers.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn recorder(fail_at: Option<u64>) -> (Box<dyn Muxer>, Arc<StdMutex<Vec<u64>>>, Arc<AtomicU64>) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let trailers = Arc::new(AtomicU64::new(0));
        let sink = Recorder {
            seen: Arc::clone(&seen),
            fail_at,
            trailers: Arc::clone(&trailers),
        };
        (Box::new(sink), seen, trailers)
    }

    fn packet(n: u64) -> Packet {
        Packet::new(0, Duration::from_millis(n), Bytes::from_static(&[0x00]))
    }

    fn consumers() -> Arc<Consumers> {
        Arc::new(Consumers::new("test".into(), Arc::new(StreamCounters::new())))
    }

    #[tokio::test]
    async fn test_failed_consumer_does_not_skip_next() {
        let set = consumers();
        let (a, seen_a, _) = recorder(Some(2));
        let (b, seen_b, _) = recorder(None);

        let (_, mut done_a) = set.register(a).await.ok().unwrap();
        let _ = set.register(b).await.ok().unwrap();

        for n in 1..=3 {
            set.broadcast(&packet(n)).await;
        }

        assert_eq!(*seen_a.lock().unwrap(), vec![1]);
        assert_eq!(*seen_b.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(set.len().await, 1);

        let detached = done_a.try_recv().ok().unwrap();
        assert!(matches!(detached.result, Err(Error::Sink(_))));
    }

    fn assert_contiguous_tail(seen: &[u64], last: u64) {
        assert!(seen.windows(2).all(|w| w[1] == w[0] + 1), "gap or duplicate in {:?}", seen);
        if let Some(&end) = seen.last() {
            assert_eq!(end, last);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_attach_during_fan_out_is_gap_free() {
        let set = consumers();
        let (first, seen_first, _) = recorder(None);
        let (_, done_first) = set.register(first).await.ok().unwrap();

        let (tx, rx) = mpsc::channel(4);
        let engine = spawn(rx, Arc::clone(&set));
        let producer = tokio::spawn(async move {
            for n in 1..=200 {
                tx.send(packet(n)).await.unwrap();
            }
        });

        let mut late = Vec::new();
        for threshold in [20, 60, 120] {
            while (seen_first.lock().unwrap().len() as u64) < threshold {
                tokio::task::yield_now().await;
            }
            let (sink, seen, _) = recorder(None);
            let (_, done) = set.register(sink).await.ok().unwrap();
            late.push((seen, done));
        }

        producer.await.unwrap();
        engine.await.unwrap();
        assert!(done_first.await.unwrap().result.is_ok());
        assert_eq!(*seen_first.lock().unwrap(), (1..=200).collect::<Vec<_>>());

        for (seen, done) in late {
            assert!(done.await.unwrap().result.is_ok());
            let seen = seen.lock().unwrap().clone();
            assert!(!seen.is_empty());
            assert_contiguous_tail(&seen, 200);
        }
    }

    /// Sink that counts close calls
    struct Closable(Arc<AtomicU64>);

    #[async_trait]
    impl Muxer for Closable {
        async fn write_header(&mut self, _: &[CodecData]) -> Result<()> {
            Ok(())
        }

        async fn write_packet(&mut self, _: &Packet) -> Result<()> {
            Ok(())
        }

        async fn write_trailer(&mut self) -> Result<()> {
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dropped_receiver_closes_sink() {
        let set = consumers();
        let closes = Arc::new(AtomicU64::new(0));
        let (_, done) = set.register(Box::new(Closable(Arc::clone(&closes)))).await.ok().unwrap();
        drop(done);

        set.broadcast(&packet(1)).await;

        assert_eq!(set.len().await, 0);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_writes_trailers_and_closes() {
        let set = consumers();
        let (a, _, trailers_a) = recorder(None);
        let (b, _, trailers_b) = recorder(None);

        let (_, done_a) = set.register(a).await.ok().unwrap();
        let (_, done_b) = set.register(b).await.ok().unwrap();

        set.shutdown().await;

        assert_eq!(trailers_a.load(Ordering::SeqCst), 1);
        assert_eq!(trailers_b.load(Ordering::SeqCst), 1);
        assert!(done_a.await.unwrap().result.is_ok());
        assert!(done_b.await.unwrap().result.is_ok());

        let (late, _, _) = recorder(None);
        assert!(set.register(late).await.is_err());
    }

    #[tokio::test]
    async fn test_remove_by_id() {
        let set = consumers();
        let (a, _, _) = recorder(None);
        let (id, _done) = set.register(a).await.ok().unwrap();

        assert!(set.remove(id).await.is_some());
        assert!(set.remove(id).await.is_none());
        assert_eq!(set.len().await, 0);
    }

    #[tokio::test]
    async fn test_engine_runs_until_queue_closed() {
        let set = consumers();
        let (a, seen, trailers) = recorder(None);
        let (_, done) = set.register(a).await.ok().unwrap();

        let (tx, rx) = mpsc::channel(4);
        let engine = spawn(rx, Arc::clone(&set));

        for n in 1..=5 {
            tx.send(packet(n)).await.unwrap();
        }
        drop(tx);

        engine.await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(trailers.load(Ordering::SeqCst), 1);
        assert!(done.await.unwrap().result.is_ok());
    }
}
