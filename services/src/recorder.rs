//! Check-in/check-out engine.
//!
//! The three-way decision for a submitted identifier lives in [`decide`], one
//! pure function, so every call site renders the same behavior: first contact
//! records an arrival, second records a departure, anything after that is a
//! no-op. Repeated submissions of the same QR code are therefore safe.

use chrono::Utc;
use db::models::{
    attendance_record::{self, ActiveModel as RecordActive, Entity as RecordEntity},
    learner,
    session,
};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::session_manager::SessionManager;

/// What a submitted identifier turned out to mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanKind {
    Entry,
    Exit,
    AlreadyComplete,
}

impl ScanKind {
    /// User-facing message rendered next to the scan result.
    pub fn message(&self) -> &'static str {
        match self {
            ScanKind::Entry => "Entry recorded",
            ScanKind::Exit => "Exit recorded",
            ScanKind::AlreadyComplete => "Attendance already complete (entry and exit recorded)",
        }
    }
}

/// Tagged outcome of an identifier submission.
#[derive(Debug, Clone, Serialize)]
pub struct Scan {
    pub kind: ScanKind,
    pub record: attendance_record::Model,
}

/// The decision table over the learner's existing record.
///
/// A row holding only observations (no entry yet) counts as "no arrival" and
/// still yields `Entry`.
pub fn decide(existing: Option<&attendance_record::Model>) -> ScanKind {
    match existing {
        None => ScanKind::Entry,
        Some(r) if r.entry_time.is_none() => ScanKind::Entry,
        Some(r) if r.exit_time.is_none() => ScanKind::Exit,
        Some(_) => ScanKind::AlreadyComplete,
    }
}

pub struct AttendanceRecorder;

impl AttendanceRecorder {
    /// Records an arrival for a learner; a second arrival is a no-op.
    ///
    /// Requires the session to be open and the learner to be enrolled and
    /// active in the session's roster. Never overwrites an entry time.
    pub async fn record_entry(
        db: &DatabaseConnection,
        session_id: i64,
        learner_id: i64,
    ) -> ServiceResult<attendance_record::Model> {
        let txn = db.begin().await?;
        let session = SessionManager::require_open(&txn, session_id).await?;

        let Some(found) = learner::Entity::find_by_id(learner_id).one(&txn).await? else {
            return Err(ServiceError::NotFound("learner not found".into()));
        };
        check_enrollment(&session, &found)?;

        let record = match attendance_record::Model::find_for(&txn, session_id, learner_id).await? {
            Some(existing) if existing.entry_time.is_some() => existing,
            Some(existing) => mark_entry(&txn, existing).await?,
            None => insert_entry(&txn, session_id, learner_id).await?,
        };
        txn.commit().await?;
        Ok(record)
    }

    /// Records a departure on an existing record. Rejected before any entry,
    /// and rejected again once the record is complete.
    pub async fn record_exit(
        db: &DatabaseConnection,
        record_id: i64,
    ) -> ServiceResult<attendance_record::Model> {
        let Some(existing) = RecordEntity::find_by_id(record_id).one(db).await? else {
            return Err(ServiceError::NotFound("attendance record not found".into()));
        };
        SessionManager::require_open(db, existing.session_id).await?;

        if existing.entry_time.is_none() {
            return Err(ServiceError::ExitBeforeEntry);
        }
        if existing.exit_time.is_some() {
            return Err(ServiceError::AlreadyComplete);
        }

        let now = Utc::now();
        let mut am: RecordActive = existing.into();
        am.exit_time = Set(Some(now));
        am.updated_at = Set(now);
        Ok(am.update(db).await?)
    }

    /// Combined QR/manual entry point: resolves the document, then applies
    /// the [`decide`] table, mutating at most once.
    ///
    /// Runs inside a transaction; together with the unique
    /// (session, learner) index this makes a QR scan and a concurrent manual
    /// submission for the same learner impossible to both land as "entry".
    pub async fn record_by_identifier(
        db: &DatabaseConnection,
        session_id: i64,
        document_number: &str,
    ) -> ServiceResult<Scan> {
        let txn = db.begin().await?;
        let session = SessionManager::require_open(&txn, session_id).await?;

        let Some(found) =
            learner::Model::find_by_document(&txn, document_number.trim()).await?
        else {
            return Err(ServiceError::LearnerNotFound);
        };
        check_enrollment(&session, &found)?;

        let existing = attendance_record::Model::find_for(&txn, session_id, found.id).await?;
        let kind = decide(existing.as_ref());
        let record = match (kind, existing) {
            (ScanKind::Entry, Some(partial)) => mark_entry(&txn, partial).await?,
            (ScanKind::Entry, None) => insert_entry(&txn, session_id, found.id).await?,
            (ScanKind::Exit, Some(open_record)) => {
                let now = Utc::now();
                let mut am: RecordActive = open_record.into();
                am.exit_time = Set(Some(now));
                am.updated_at = Set(now);
                am.update(&txn).await?
            }
            (ScanKind::AlreadyComplete, Some(complete)) => complete,
            // decide() never yields Exit/AlreadyComplete without a record
            _ => unreachable!("decision table out of sync with record state"),
        };
        txn.commit().await?;

        info!(
            session_id,
            learner_id = record.learner_id,
            kind = ?kind,
            "Identifier submission handled"
        );
        Ok(Scan { kind, record })
    }

    /// Upserts observation text for (session, learner), independent of the
    /// entry/exit state. Completion never blocks this; a closed session does.
    pub async fn set_observations(
        db: &DatabaseConnection,
        session_id: i64,
        learner_id: i64,
        text: &str,
    ) -> ServiceResult<attendance_record::Model> {
        SessionManager::require_open(db, session_id).await?;

        let now = Utc::now();
        match attendance_record::Model::find_for(db, session_id, learner_id).await? {
            Some(existing) => {
                let mut am: RecordActive = existing.into();
                am.observations = Set(Some(text.to_owned()));
                am.updated_at = Set(now);
                Ok(am.update(db).await?)
            }
            None => Ok(RecordActive {
                session_id: Set(session_id),
                learner_id: Set(learner_id),
                entry_time: Set(None),
                exit_time: Set(None),
                observations: Set(Some(text.to_owned())),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?),
        }
    }

    /// Observations update addressed by record id. Works on complete records.
    pub async fn set_observations_by_record(
        db: &DatabaseConnection,
        record_id: i64,
        text: &str,
    ) -> ServiceResult<attendance_record::Model> {
        let Some(existing) = RecordEntity::find_by_id(record_id).one(db).await? else {
            return Err(ServiceError::NotFound("attendance record not found".into()));
        };

        let mut am: RecordActive = existing.into();
        am.observations = Set(Some(text.to_owned()));
        am.updated_at = Set(Utc::now());
        Ok(am.update(db).await?)
    }

    /// All records of a session, for the instructor's live roster view.
    pub async fn records_for_session(
        db: &DatabaseConnection,
        session_id: i64,
    ) -> ServiceResult<Vec<attendance_record::Model>> {
        use sea_orm::{ColumnTrait, QueryFilter, QueryOrder};

        let Some(_) = session::Entity::find_by_id(session_id).one(db).await? else {
            return Err(ServiceError::NotFound(
                "attendance session not found".into(),
            ));
        };
        Ok(RecordEntity::find()
            .filter(attendance_record::Column::SessionId.eq(session_id))
            .order_by_asc(attendance_record::Column::Id)
            .all(db)
            .await?)
    }
}

fn check_enrollment(session: &session::Model, learner: &learner::Model) -> ServiceResult<()> {
    if learner.roster_id != session.roster_id || !learner.active {
        return Err(ServiceError::LearnerNotEnrolled);
    }
    Ok(())
}

async fn insert_entry<C>(
    db: &C,
    session_id: i64,
    learner_id: i64,
) -> Result<attendance_record::Model, sea_orm::DbErr>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    RecordActive {
        session_id: Set(session_id),
        learner_id: Set(learner_id),
        entry_time: Set(Some(now)),
        exit_time: Set(None),
        observations: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

async fn mark_entry<C>(
    db: &C,
    existing: attendance_record::Model,
) -> Result<attendance_record::Model, sea_orm::DbErr>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let mut am: RecordActive = existing.into();
    am.entry_time = Set(Some(now));
    am.updated_at = Set(now);
    am.update(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::{roster, roster_instructor, user};
    use db::test_utils::setup_test_db;
    use sea_orm::{ColumnTrait, PaginatorTrait, QueryFilter};

    struct Seed {
        session: session::Model,
        learner: learner::Model,
    }

    async fn seed(db: &DatabaseConnection) -> Seed {
        let instructor = user::Model::create(db, "rec_inst", "rec_inst@test.com", "pw", false)
            .await
            .unwrap();
        let roster = roster::Model::create(db, "2824601", "Software Development", "North Campus")
            .await
            .unwrap();
        roster_instructor::Model::assign(db, roster.id, instructor.id)
            .await
            .unwrap();
        let learner = learner::Model::create(db, roster.id, "1002003001", "Ana Gomez")
            .await
            .unwrap();
        let session = SessionManager::ensure_session(db, instructor.id, roster.id)
            .await
            .unwrap();
        Seed { session, learner }
    }

    #[tokio::test]
    async fn four_submissions_yield_entry_exit_complete_complete() {
        let db = setup_test_db().await;
        let s = seed(&db).await;

        let mut kinds = Vec::new();
        for _ in 0..4 {
            let scan =
                AttendanceRecorder::record_by_identifier(&db, s.session.id, "1002003001")
                    .await
                    .unwrap();
            kinds.push(scan.kind);
        }
        assert_eq!(
            kinds,
            vec![
                ScanKind::Entry,
                ScanKind::Exit,
                ScanKind::AlreadyComplete,
                ScanKind::AlreadyComplete
            ]
        );

        // exactly one record exists for (session, learner)
        let count = RecordEntity::find()
            .filter(attendance_record::Column::SessionId.eq(s.session.id))
            .filter(attendance_record::Column::LearnerId.eq(s.learner.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn repeated_entry_is_a_noop() {
        let db = setup_test_db().await;
        let s = seed(&db).await;

        let first = AttendanceRecorder::record_entry(&db, s.session.id, s.learner.id)
            .await
            .unwrap();
        let second = AttendanceRecorder::record_entry(&db, s.session.id, s.learner.id)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.entry_time, second.entry_time);
    }

    #[tokio::test]
    async fn exit_without_entry_is_rejected() {
        let db = setup_test_db().await;
        let s = seed(&db).await;

        // observation-only row: no entry time yet
        let record =
            AttendanceRecorder::set_observations(&db, s.session.id, s.learner.id, "late note")
                .await
                .unwrap();

        let err = AttendanceRecorder::record_exit(&db, record.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ExitBeforeEntry));
    }

    #[tokio::test]
    async fn second_exit_is_already_complete() {
        let db = setup_test_db().await;
        let s = seed(&db).await;

        let record = AttendanceRecorder::record_entry(&db, s.session.id, s.learner.id)
            .await
            .unwrap();
        AttendanceRecorder::record_exit(&db, record.id)
            .await
            .unwrap();

        let err = AttendanceRecorder::record_exit(&db, record.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyComplete));
    }

    #[tokio::test]
    async fn unknown_document_is_learner_not_found() {
        let db = setup_test_db().await;
        let s = seed(&db).await;

        let err = AttendanceRecorder::record_by_identifier(&db, s.session.id, "0000000000")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::LearnerNotFound));
    }

    #[tokio::test]
    async fn learner_from_another_roster_is_not_enrolled() {
        let db = setup_test_db().await;
        let s = seed(&db).await;

        let other = roster::Model::create(&db, "2900100", "Cooking", "South Campus")
            .await
            .unwrap();
        learner::Model::create(&db, other.id, "3004005006", "Luis Prada")
            .await
            .unwrap();

        let err = AttendanceRecorder::record_by_identifier(&db, s.session.id, "3004005006")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::LearnerNotEnrolled));
    }

    #[tokio::test]
    async fn inactive_learner_cannot_check_in() {
        let db = setup_test_db().await;
        let s = seed(&db).await;

        let mut am: learner::ActiveModel = s.learner.clone().into();
        am.active = Set(false);
        am.update(&db).await.unwrap();

        let err = AttendanceRecorder::record_by_identifier(&db, s.session.id, "1002003001")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::LearnerNotEnrolled));
    }

    #[tokio::test]
    async fn closed_session_rejects_all_mutations() {
        let db = setup_test_db().await;
        let s = seed(&db).await;
        SessionManager::close_session(&db, s.session.id)
            .await
            .unwrap();

        let err = AttendanceRecorder::record_entry(&db, s.session.id, s.learner.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::SessionClosed));

        let err = AttendanceRecorder::record_by_identifier(&db, s.session.id, "1002003001")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::SessionClosed));
    }

    #[tokio::test]
    async fn observations_survive_a_later_entry_scan() {
        let db = setup_test_db().await;
        let s = seed(&db).await;

        AttendanceRecorder::set_observations(&db, s.session.id, s.learner.id, "arrived by bus")
            .await
            .unwrap();
        let scan = AttendanceRecorder::record_by_identifier(&db, s.session.id, "1002003001")
            .await
            .unwrap();

        assert_eq!(scan.kind, ScanKind::Entry);
        assert_eq!(scan.record.observations.as_deref(), Some("arrived by bus"));
    }

    #[tokio::test]
    async fn observations_allowed_on_complete_record() {
        let db = setup_test_db().await;
        let s = seed(&db).await;

        let record = AttendanceRecorder::record_entry(&db, s.session.id, s.learner.id)
            .await
            .unwrap();
        AttendanceRecorder::record_exit(&db, record.id)
            .await
            .unwrap();

        let updated =
            AttendanceRecorder::set_observations_by_record(&db, record.id, "left early, excused")
                .await
                .unwrap();
        assert!(updated.is_complete());
        assert_eq!(updated.observations.as_deref(), Some("left early, excused"));
    }

    #[test]
    fn decision_table_is_exhaustive() {
        use chrono::Utc;

        let template = attendance_record::Model {
            id: 1,
            session_id: 1,
            learner_id: 1,
            entry_time: None,
            exit_time: None,
            observations: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(decide(None), ScanKind::Entry);
        assert_eq!(decide(Some(&template)), ScanKind::Entry);

        let entered = attendance_record::Model {
            entry_time: Some(Utc::now()),
            ..template.clone()
        };
        assert_eq!(decide(Some(&entered)), ScanKind::Exit);

        let complete = attendance_record::Model {
            exit_time: Some(Utc::now()),
            ..entered
        };
        assert_eq!(decide(Some(&complete)), ScanKind::AlreadyComplete);
    }
}
