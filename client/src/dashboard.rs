//! Snapshot observer: turns refresh notices into dashboard pulls.
//!
//! Notices carry no data, so the observer always re-pulls the full snapshot.
//! Notices that land while a pull is in flight collapse into a single
//! follow-up pull (tokio `Notify` keeps at most one pending permit), so a
//! burst of scans costs two requests, not one per scan.

use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Notify, watch};
use tracing::warn;

use crate::error::ClientError;

/// Client-side mirror of the dashboard payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Snapshot {
    pub date: String,
    pub total_present: u64,
    pub per_roster: Vec<RosterCount>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RosterCount {
    pub roster_id: i64,
    pub label: String,
    pub site: String,
    pub count: u64,
}

/// Where snapshots come from. Production pulls `GET /api/dashboard/today`
/// over HTTP; tests substitute a counter.
pub trait SnapshotSource: Send + 'static {
    fn fetch(&mut self) -> impl Future<Output = Result<Snapshot, ClientError>> + Send;
}

/// Production source over reqwest, unwrapping the server's response envelope.
pub struct HttpSource {
    client: reqwest::Client,
    url: url::Url,
    token: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    data: Option<Snapshot>,
    message: String,
}

impl HttpSource {
    pub fn new(base_url: &url::Url, token: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            client: reqwest::Client::new(),
            url: base_url.join("/api/dashboard/today")?,
            token: token.to_owned(),
        })
    }
}

impl SnapshotSource for HttpSource {
    async fn fetch(&mut self) -> Result<Snapshot, ClientError> {
        let envelope: Envelope = self
            .client
            .get(self.url.clone())
            .bearer_auth(&self.token)
            .send()
            .await?
            .json()
            .await?;

        if !envelope.success {
            return Err(ClientError::Payload(envelope.message));
        }
        envelope
            .data
            .ok_or_else(|| ClientError::Payload("missing data field".into()))
    }
}

/// Handle given to the notice consumer and the UI.
#[derive(Clone)]
pub struct ObserverHandle {
    notify: Arc<Notify>,
    snapshots: watch::Receiver<Option<Snapshot>>,
}

impl ObserverHandle {
    /// Requests a re-pull. Safe to call from anywhere, any number of times.
    pub fn refresh(&self) {
        self.notify.notify_one();
    }

    /// Watch handle over the latest snapshot.
    pub fn snapshots(&self) -> watch::Receiver<Option<Snapshot>> {
        self.snapshots.clone()
    }
}

/// Pull loop around a `SnapshotSource`.
pub struct DashboardObserver<S: SnapshotSource> {
    source: S,
    notify: Arc<Notify>,
    snapshots: watch::Sender<Option<Snapshot>>,
}

impl<S: SnapshotSource> DashboardObserver<S> {
    pub fn new(source: S) -> (Self, ObserverHandle) {
        let notify = Arc::new(Notify::new());
        let (tx, rx) = watch::channel(None);

        let handle = ObserverHandle {
            notify: notify.clone(),
            snapshots: rx,
        };
        (
            Self {
                source,
                notify,
                snapshots: tx,
            },
            handle,
        )
    }

    /// Runs until every snapshot receiver is gone. A failed pull keeps the
    /// previous snapshot on screen and waits for the next notice.
    pub async fn run(mut self) {
        loop {
            self.notify.notified().await;

            match self.source.fetch().await {
                Ok(snapshot) => {
                    if self.snapshots.send(Some(snapshot)).is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Dashboard pull failed, keeping last snapshot"),
            }

            if self.snapshots.is_closed() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl SnapshotSource for Counting {
        async fn fetch(&mut self) -> Result<Snapshot, ClientError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Snapshot {
                date: "2026-08-26".into(),
                total_present: n as u64,
                per_roster: vec![],
            })
        }
    }

    #[tokio::test]
    async fn burst_of_notices_coalesces_into_one_pull() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (observer, handle) = DashboardObserver::new(Counting {
            calls: calls.clone(),
        });

        // a whole burst before the loop even starts
        handle.refresh();
        handle.refresh();
        handle.refresh();

        tokio::spawn(observer.run());

        let mut snapshots = handle.snapshots();
        snapshots.changed().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // a later notice triggers exactly one more pull
        handle.refresh();
        snapshots.changed().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_pull_keeps_the_previous_snapshot() {
        struct Flaky {
            calls: Arc<AtomicUsize>,
        }

        impl SnapshotSource for Flaky {
            async fn fetch(&mut self) -> Result<Snapshot, ClientError> {
                let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 2 {
                    return Err(ClientError::Payload("boom".into()));
                }
                Ok(Snapshot {
                    date: "2026-08-26".into(),
                    total_present: n as u64,
                    per_roster: vec![],
                })
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let (observer, handle) = DashboardObserver::new(Flaky {
            calls: calls.clone(),
        });
        tokio::spawn(observer.run());

        let mut snapshots = handle.snapshots();

        handle.refresh();
        snapshots.changed().await.unwrap();
        let first = snapshots.borrow_and_update().clone().unwrap();
        assert_eq!(first.total_present, 1);

        // the second pull fails; the watch value stays put
        handle.refresh();
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!snapshots.has_changed().unwrap());

        handle.refresh();
        snapshots.changed().await.unwrap();
        assert_eq!(snapshots.borrow_and_update().clone().unwrap().total_present, 3);
    }
}
