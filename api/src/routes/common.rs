//! Shared request/response types and the service-error-to-status mapping.

use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use db::models::{attendance_record, session};
use serde::{Deserialize, Serialize};
use services::{Scan, ScanKind, ServiceError};

/// Maps a domain error to the HTTP status it is reported with.
pub fn error_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Unauthorized => StatusCode::FORBIDDEN,
        ServiceError::NotFound(_) | ServiceError::LearnerNotFound => StatusCode::NOT_FOUND,
        ServiceError::LearnerNotEnrolled | ServiceError::ExitBeforeEntry => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ServiceError::SessionClosed | ServiceError::AlreadyComplete => StatusCode::CONFLICT,
        ServiceError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ---------- requests ----------

#[derive(Debug, Deserialize)]
pub struct EnterSessionReq {
    pub roster_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct RecordEntryReq {
    pub session_id: i64,
    pub learner_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct EntryByDocumentReq {
    pub session_id: i64,
    pub document_number: String,
}

#[derive(Debug, Deserialize)]
pub struct ObservationsReq {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct UpsertObservationsReq {
    pub session_id: i64,
    pub learner_id: i64,
    pub text: String,
}

// ---------- responses ----------

#[derive(Debug, Serialize, Default)]
pub struct SessionResponse {
    pub id: i64,
    pub roster_id: i64,
    pub instructor_id: i64,
    pub date: Option<NaiveDate>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: String,
}

impl From<session::Model> for SessionResponse {
    fn from(m: session::Model) -> Self {
        Self {
            id: m.id,
            roster_id: m.roster_id,
            instructor_id: m.instructor_id,
            date: Some(m.date),
            start_time: Some(m.start_time),
            end_time: m.end_time,
            status: m.status.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct AttendanceRecordResponse {
    pub id: i64,
    pub session_id: i64,
    pub learner_id: i64,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub observations: Option<String>,
}

impl From<attendance_record::Model> for AttendanceRecordResponse {
    fn from(m: attendance_record::Model) -> Self {
        Self {
            id: m.id,
            session_id: m.session_id,
            learner_id: m.learner_id,
            entry_time: m.entry_time,
            exit_time: m.exit_time,
            observations: m.observations,
        }
    }
}

/// Payload for the combined entry-by-document endpoint: the decision that
/// was made, the resulting record, and the inline message for the scanner UI.
#[derive(Debug, Serialize, Default)]
pub struct ScanResponse {
    pub kind: Option<ScanKind>,
    pub record: Option<AttendanceRecordResponse>,
    pub message: String,
}

impl From<Scan> for ScanResponse {
    fn from(scan: Scan) -> Self {
        Self {
            kind: Some(scan.kind),
            message: scan.kind.message().to_owned(),
            record: Some(scan.record.into()),
        }
    }
}
