pub mod dashboard;
pub mod error;
pub mod recorder;
pub mod session_manager;

pub use dashboard::{DashboardAggregator, DashboardSnapshot, RosterPresence};
pub use error::{ServiceError, ServiceResult};
pub use recorder::{AttendanceRecorder, Scan, ScanKind};
pub use session_manager::SessionManager;
