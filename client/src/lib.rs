//! Kiosk-side building blocks: the QR scan debouncer, the reconnecting
//! dashboard channel, and the snapshot observer that ties them together.

pub mod channel;
pub mod dashboard;
pub mod error;
pub mod scanner;

pub use channel::{ChannelState, Connector, Notice, ReconnectingChannel, WsConnector};
pub use dashboard::{DashboardObserver, ObserverHandle, RosterCount, Snapshot, SnapshotSource};
pub use error::ClientError;
pub use scanner::{Camera, DecodeEvent, DecodeSource, ScanDebouncer, ScannerState};
