//! Reconnecting notification channel for the live dashboard.
//!
//! Wraps a websocket-like connector in a small state machine. A dropped or
//! failed connection schedules exactly one reconnect attempt after a fixed
//! delay; shutdown closes the socket and cancels any pending timer.

use futures_util::StreamExt;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::error::ClientError;

/// Fixed pause between losing the connection and the next attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Connection state, observable through a watch channel (the "live" dot in
/// the dashboard header).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

/// What the server can tell us. The wire payload is content-free; the notice
/// only says "pull the snapshot again".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Refresh,
}

#[derive(Debug, Deserialize)]
struct WireNotice {
    #[serde(rename = "type")]
    kind: String,
}

/// One connection attempt. Each successful connect yields a stream of text
/// frames; the stream ending means the connection closed.
pub trait Connector: Send + 'static {
    fn connect(
        &mut self,
    ) -> impl Future<Output = Result<mpsc::Receiver<String>, ClientError>> + Send;
}

/// Production connector: tokio-tungstenite against `/ws/dashboard`, with the
/// token in the query string because browser-style websocket clients cannot
/// set headers.
pub struct WsConnector {
    url: url::Url,
}

impl WsConnector {
    pub fn new(base_ws_url: &url::Url, token: &str) -> Result<Self, url::ParseError> {
        let mut url = base_ws_url.join("/ws/dashboard")?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(Self { url })
    }
}

impl Connector for WsConnector {
    async fn connect(&mut self) -> Result<mpsc::Receiver<String>, ClientError> {
        let (stream, _resp) = connect_async(self.url.as_str()).await?;
        let (tx, rx) = mpsc::channel(32);

        // Read pump. Dropping `rx` makes the send fail, which tears the
        // websocket down, so shutdown propagates to the socket.
        tokio::spawn(async move {
            let (_write, mut read) = stream.split();
            while let Some(Ok(msg)) = read.next().await {
                if let Message::Text(text) = msg {
                    if tx.send(text.to_string()).await.is_err() {
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }
}

/// Handle to the running channel task.
pub struct ReconnectingChannel {
    notices: mpsc::Receiver<Notice>,
    state: watch::Receiver<ChannelState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl ReconnectingChannel {
    /// Spawns the connection loop and returns the consumer handle.
    pub fn start<C: Connector>(connector: C) -> Self {
        let (notice_tx, notices) = mpsc::channel(32);
        let (state_tx, state) = watch::channel(ChannelState::Connecting);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(run(connector, notice_tx, state_tx, shutdown_rx));

        Self {
            notices,
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    /// Next notice from the server, or `None` after shutdown.
    pub async fn recv(&mut self) -> Option<Notice> {
        self.notices.recv().await
    }

    /// Watch handle for the connection state.
    pub fn state(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Closes the socket and cancels any pending reconnect timer.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for ReconnectingChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run<C: Connector>(
    mut connector: C,
    notices: mpsc::Sender<Notice>,
    state: watch::Sender<ChannelState>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        let _ = state.send(ChannelState::Connecting);

        let connected = tokio::select! {
            _ = &mut shutdown => break,
            result = connector.connect() => result,
        };

        match connected {
            Ok(mut frames) => {
                let _ = state.send(ChannelState::Open);
                info!("Dashboard channel open");

                loop {
                    tokio::select! {
                        _ = &mut shutdown => {
                            let _ = state.send(ChannelState::Closed);
                            return;
                        }
                        frame = frames.recv() => match frame {
                            Some(text) => handle_frame(&text, &notices).await,
                            None => break,
                        }
                    }
                }
                warn!("Dashboard channel lost, reconnecting in {RECONNECT_DELAY:?}");
            }
            Err(e) => {
                warn!(error = %e, "Dashboard connect failed, retrying in {RECONNECT_DELAY:?}");
            }
        }

        // one reconnect per loss, after the fixed delay
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
        }
    }

    let _ = state.send(ChannelState::Closed);
    info!("Dashboard channel shut down");
}

async fn handle_frame(text: &str, notices: &mpsc::Sender<Notice>) {
    match serde_json::from_str::<WireNotice>(text) {
        Ok(notice) if notice.kind == "refresh" => {
            let _ = notices.send(Notice::Refresh).await;
        }
        // anything else on the wire is ignored, never an error
        _ => debug!(frame = text, "Ignoring unrecognized frame"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Connector that hands out pre-built frame streams in order, counting
    /// the attempts. When the script runs out it hands out streams that stay
    /// open forever.
    struct Scripted {
        streams: VecDeque<mpsc::Receiver<String>>,
        connects: Arc<AtomicUsize>,
        keep_alive: Vec<mpsc::Sender<String>>,
    }

    impl Scripted {
        fn new(streams: Vec<mpsc::Receiver<String>>, connects: Arc<AtomicUsize>) -> Self {
            Self {
                streams: streams.into(),
                connects,
                keep_alive: Vec::new(),
            }
        }
    }

    impl Connector for Scripted {
        async fn connect(&mut self) -> Result<mpsc::Receiver<String>, ClientError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            match self.streams.pop_front() {
                Some(rx) => Ok(rx),
                None => {
                    let (tx, rx) = mpsc::channel(8);
                    self.keep_alive.push(tx);
                    Ok(rx)
                }
            }
        }
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reconnects_exactly_once_after_the_fixed_delay() {
        let connects = Arc::new(AtomicUsize::new(0));
        // first connection drops immediately
        let (dead_tx, dead_rx) = mpsc::channel::<String>(1);
        drop(dead_tx);

        let _chan = ReconnectingChannel::start(Scripted::new(vec![dead_rx], connects.clone()));
        settle().await;
        assert_eq!(connects.load(Ordering::SeqCst), 1);

        // not yet: the delay is fixed at five seconds
        tokio::time::advance(Duration::from_millis(4900)).await;
        settle().await;
        assert_eq!(connects.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_millis(200)).await;
        settle().await;
        assert_eq!(connects.load(Ordering::SeqCst), 2);

        // the second connection is healthy; no further attempts
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_frames_become_notices_and_noise_is_ignored() {
        let connects = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel(8);

        let mut chan = ReconnectingChannel::start(Scripted::new(vec![rx], connects));
        settle().await;

        tx.send("not even json".to_string()).await.unwrap();
        tx.send(r#"{"type":"refresh"}"#.to_string()).await.unwrap();
        tx.send(r#"{"type":"mystery"}"#.to_string()).await.unwrap();

        assert_eq!(chan.recv().await, Some(Notice::Refresh));

        // nothing else surfaced
        settle().await;
        assert!(chan.notices.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_the_pending_reconnect() {
        let connects = Arc::new(AtomicUsize::new(0));
        let (dead_tx, dead_rx) = mpsc::channel::<String>(1);
        drop(dead_tx);

        let mut chan = ReconnectingChannel::start(Scripted::new(vec![dead_rx], connects.clone()));
        settle().await;
        assert_eq!(connects.load(Ordering::SeqCst), 1);

        chan.shutdown();
        settle().await;
        assert_eq!(*chan.state().borrow(), ChannelState::Closed);

        // the timer that was pending at shutdown never fires
        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn state_goes_connecting_then_open() {
        let connects = Arc::new(AtomicUsize::new(0));
        let (_tx, rx) = mpsc::channel(8);

        let chan = ReconnectingChannel::start(Scripted::new(vec![rx], connects));
        let mut state = chan.state();
        settle().await;

        assert_eq!(*state.borrow_and_update(), ChannelState::Open);
    }
}
