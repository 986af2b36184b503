use sea_orm::DbErr;
use thiserror::Error;

/// Domain error taxonomy for the attendance engine.
///
/// Every variant is recovered at the point of the user action and rendered
/// as an inline message; the API layer maps variants to HTTP statuses.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Wrong instructor/roster pairing, or a non-supervisor pulling the dashboard.
    #[error("not assigned as instructor of this roster")]
    Unauthorized,

    /// Session, learner, or record absent (also: closing an already-closed session).
    #[error("{0}")]
    NotFound(String),

    /// No learner matches the submitted document number.
    #[error("no learner matches that document number")]
    LearnerNotFound,

    /// The document resolved to a learner outside this roster, or an inactive one.
    #[error("the document does not belong to an active learner of this roster")]
    LearnerNotEnrolled,

    /// The session is closed; no further attendance mutations are admitted.
    #[error("the session is already finalized")]
    SessionClosed,

    /// Entry and exit are both recorded already.
    #[error("entry and exit are already recorded for this learner")]
    AlreadyComplete,

    /// Departure submitted for a learner with no recorded arrival.
    #[error("the learner has no entry time recorded")]
    ExitBeforeEntry,

    #[error(transparent)]
    Db(#[from] DbErr),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
