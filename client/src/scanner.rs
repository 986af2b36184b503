//! QR scan debouncing.
//!
//! Physical badges stay in front of the camera for much longer than one
//! frame, so a raw decode stream repeats the same identifier dozens of times.
//! The debouncer emits one identifier, pauses the source for a fixed
//! cool-down, then resumes. Frames that hit a paused camera are gone, not
//! queued.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, info};

use crate::error::ClientError;

/// How long the source stays paused after an accepted decode.
pub const SCAN_COOLDOWN: Duration = Duration::from_millis(1500);

/// Where the debouncer currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Idle,
    Decoding,
    Cooldown,
}

/// Events a decode source can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A decoded identifier (the learner's document number).
    Decoded(String),
    /// A frame that failed to decode; routine noise, not a stop condition.
    Error(String),
    /// The source is gone (camera stopped, page closed).
    Stopped,
}

/// Abstraction over the camera decode loop, so the state machine is testable
/// without hardware.
pub trait DecodeSource: Send + 'static {
    fn next_event(&mut self) -> impl Future<Output = DecodeEvent> + Send;
    fn pause(&mut self);
    fn resume(&mut self);
}

/// The camera as an exclusive resource.
///
/// Acquisition hands out a guard; a second acquisition fails with
/// `CameraUnavailable` until the guard drops. The caller falls back to
/// manual document entry in that case.
#[derive(Clone)]
pub struct Camera {
    slot: Arc<Semaphore>,
}

#[derive(Debug)]
pub struct CameraGuard {
    _permit: OwnedSemaphorePermit,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn acquire(&self) -> Result<CameraGuard, ClientError> {
        match self.slot.clone().try_acquire_owned() {
            Ok(permit) => Ok(CameraGuard { _permit: permit }),
            Err(TryAcquireError::NoPermits) => Err(ClientError::CameraUnavailable),
            Err(TryAcquireError::Closed) => Err(ClientError::CameraUnavailable),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives a `DecodeSource` and forwards debounced identifiers.
pub struct ScanDebouncer<S: DecodeSource> {
    source: S,
    state: ScannerState,
}

impl<S: DecodeSource> ScanDebouncer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: ScannerState::Idle,
        }
    }

    pub fn state(&self) -> ScannerState {
        self.state
    }

    /// Runs until the source stops. Each accepted identifier goes out on
    /// `emissions`; during the cool-down the source is paused.
    pub async fn run(mut self, emissions: mpsc::Sender<String>) {
        self.state = ScannerState::Decoding;

        loop {
            match self.source.next_event().await {
                DecodeEvent::Decoded(identifier) => {
                    if emissions.send(identifier).await.is_err() {
                        break;
                    }

                    self.state = ScannerState::Cooldown;
                    self.source.pause();
                    tokio::time::sleep(SCAN_COOLDOWN).await;
                    self.source.resume();
                    self.state = ScannerState::Decoding;
                }
                DecodeEvent::Error(reason) => {
                    // partial frames and focus hunting land here constantly
                    debug!(reason, "Frame failed to decode");
                }
                DecodeEvent::Stopped => break,
            }
        }

        self.state = ScannerState::Idle;
        info!("Scanner stopped");
    }
}
