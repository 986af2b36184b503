//! Session lifecycle: ensure-open and close.
//!
//! A session is one instructor's attendance-taking window for a roster on a
//! calendar date. At most one open session exists per (roster, date); a
//! second "enter" for the same roster joins the existing session, even when a
//! different assigned instructor opened it.

use chrono::Utc;
use db::models::{
    roster_instructor,
    session::{self, ActiveModel as SessionActive, Entity as SessionEntity, Status},
};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set};
use tracing::info;

use crate::error::{ServiceError, ServiceResult};

pub struct SessionManager;

impl SessionManager {
    /// Returns the roster's open session for today, creating one if absent.
    ///
    /// Idempotent: a second call with the same (roster, instructor, date) and
    /// no intervening close returns the same session. Fails with
    /// `Unauthorized` when the instructor is not assigned to the roster.
    pub async fn ensure_session(
        db: &DatabaseConnection,
        instructor_id: i64,
        roster_id: i64,
    ) -> ServiceResult<session::Model> {
        if !roster_instructor::Model::is_assigned(db, roster_id, instructor_id).await? {
            return Err(ServiceError::Unauthorized);
        }

        let today = Utc::now().date_naive();
        if let Some(open) = session::Model::find_open_for_roster(db, roster_id, today).await? {
            return Ok(open);
        }

        let now = Utc::now();
        let created = SessionActive {
            roster_id: Set(roster_id),
            instructor_id: Set(instructor_id),
            date: Set(today),
            start_time: Set(now),
            end_time: Set(None),
            status: Set(Status::Open),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(
            session_id = created.id,
            roster_id, instructor_id, "Opened attendance session"
        );
        Ok(created)
    }

    /// Closes a session: status=closed, end_time=now. One-way.
    ///
    /// Closing is deliberately not idempotent — a second finalize is reported
    /// as an error so the instructor is never misled about whether the action
    /// had an effect.
    pub async fn close_session(
        db: &DatabaseConnection,
        session_id: i64,
    ) -> ServiceResult<session::Model> {
        let Some(existing) = SessionEntity::find_by_id(session_id).one(db).await? else {
            return Err(ServiceError::NotFound(
                "attendance session not found".into(),
            ));
        };
        if !existing.is_open() {
            return Err(ServiceError::SessionClosed);
        }

        let now = Utc::now();
        let mut am: SessionActive = existing.into();
        am.status = Set(Status::Closed);
        am.end_time = Set(Some(now));
        am.updated_at = Set(now);
        let closed = am.update(db).await?;

        info!(session_id = closed.id, "Closed attendance session");
        Ok(closed)
    }

    /// Loads a session and rejects mutations against a closed one.
    ///
    /// Shared gate for every recorder operation.
    pub async fn require_open<C>(db: &C, session_id: i64) -> ServiceResult<session::Model>
    where
        C: ConnectionTrait,
    {
        let Some(found) = SessionEntity::find_by_id(session_id).one(db).await? else {
            return Err(ServiceError::NotFound(
                "attendance session not found".into(),
            ));
        };
        if !found.is_open() {
            return Err(ServiceError::SessionClosed);
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::{roster, roster_instructor, user};
    use db::test_utils::setup_test_db;

    async fn seed_roster_with_instructor(
        db: &DatabaseConnection,
    ) -> (roster::Model, user::Model) {
        let instructor = user::Model::create(db, "inst1", "inst1@test.com", "pw", false)
            .await
            .unwrap();
        let roster = roster::Model::create(db, "2824601", "Software Development", "North Campus")
            .await
            .unwrap();
        roster_instructor::Model::assign(db, roster.id, instructor.id)
            .await
            .unwrap();
        (roster, instructor)
    }

    #[tokio::test]
    async fn ensure_session_is_idempotent() {
        let db = setup_test_db().await;
        let (roster, instructor) = seed_roster_with_instructor(&db).await;

        let first = SessionManager::ensure_session(&db, instructor.id, roster.id)
            .await
            .unwrap();
        let second = SessionManager::ensure_session(&db, instructor.id, roster.id)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.status, Status::Open);
    }

    #[tokio::test]
    async fn second_instructor_of_same_roster_joins_existing_session() {
        let db = setup_test_db().await;
        let (roster, instructor) = seed_roster_with_instructor(&db).await;
        let colleague = user::Model::create(&db, "inst2", "inst2@test.com", "pw", false)
            .await
            .unwrap();
        roster_instructor::Model::assign(&db, roster.id, colleague.id)
            .await
            .unwrap();

        let opened = SessionManager::ensure_session(&db, instructor.id, roster.id)
            .await
            .unwrap();
        let joined = SessionManager::ensure_session(&db, colleague.id, roster.id)
            .await
            .unwrap();

        assert_eq!(opened.id, joined.id);
        assert_eq!(joined.instructor_id, instructor.id);
    }

    #[tokio::test]
    async fn unassigned_instructor_is_rejected() {
        let db = setup_test_db().await;
        let (roster, _) = seed_roster_with_instructor(&db).await;
        let outsider = user::Model::create(&db, "outsider", "out@test.com", "pw", false)
            .await
            .unwrap();

        let err = SessionManager::ensure_session(&db, outsider.id, roster.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
    }

    #[tokio::test]
    async fn close_session_sets_end_time_and_is_not_idempotent() {
        let db = setup_test_db().await;
        let (roster, instructor) = seed_roster_with_instructor(&db).await;
        let open = SessionManager::ensure_session(&db, instructor.id, roster.id)
            .await
            .unwrap();

        let closed = SessionManager::close_session(&db, open.id).await.unwrap();
        assert_eq!(closed.status, Status::Closed);
        assert!(closed.end_time.is_some());

        let err = SessionManager::close_session(&db, open.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::SessionClosed));
    }

    #[tokio::test]
    async fn close_unknown_session_is_not_found() {
        let db = setup_test_db().await;
        let err = SessionManager::close_session(&db, 9999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn ensure_after_close_opens_a_fresh_session() {
        let db = setup_test_db().await;
        let (roster, instructor) = seed_roster_with_instructor(&db).await;

        let first = SessionManager::ensure_session(&db, instructor.id, roster.id)
            .await
            .unwrap();
        SessionManager::close_session(&db, first.id).await.unwrap();

        let next = SessionManager::ensure_session(&db, instructor.id, roster.id)
            .await
            .unwrap();
        assert_ne!(first.id, next.id);
        assert_eq!(next.status, Status::Open);
    }
}
