//! Write-once stream header

use std::time::Duration;

use tokio::sync::watch;

use crate::av::Header;

/// Header slot set once by ingest and read by every attach
///
/// Waiters are woken by the single write instead of polling.
pub(crate) struct HeaderCell {
    tx: watch::Sender<Option<Header>>,
}

impl HeaderCell {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Publish the header. Returns false if one was already set.
    pub(crate) fn set(&self, header: Header) -> bool {
        self.tx.send_if_modified(move |slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(header);
            true
        })
    }

    pub(crate) fn get(&self) -> Option<Header> {
        self.tx.borrow().clone()
    }

    /// Wait up to `timeout` for the header to be set
    pub(crate) async fn wait(&self, timeout: Duration) -> Option<Header> {
        let mut rx = self.tx.subscribe();
        let waited = tokio::time::timeout(timeout, rx.wait_for(Option::is_some)).await;
        match waited {
            Ok(Ok(header)) => (*header).clone(),
            _ => None,
        }
    }
}
