use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// One learner's presence record within a session.
///
/// There is at most one row per (session, learner) — enforced by a unique
/// index — and it is mutated in place, never duplicated. Once both times are
/// set the record is complete and only `observations` may still change.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub session_id: i64,
    pub learner_id: i64,
    /// Set by the first arrival event; never overwritten.
    pub entry_time: Option<DateTime<Utc>>,
    /// Set by the departure event; requires `entry_time` first.
    pub exit_time: Option<DateTime<Utc>>,
    pub observations: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::session::Entity",
        from = "Column::SessionId",
        to = "super::session::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::learner::Entity",
        from = "Column::LearnerId",
        to = "super::learner::Column::Id"
    )]
    Learner,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::learner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Learner.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Entry and exit both recorded; immutable except for observations.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.entry_time.is_some() && self.exit_time.is_some()
    }

    /// Finds the single record for (session, learner), if any.
    pub async fn find_for<C>(
        db: &C,
        session_id: i64,
        learner_id: i64,
    ) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::LearnerId.eq(learner_id))
            .one(db)
            .await
    }
}
