use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One instructor's attendance-taking window for a roster on a calendar date.
///
/// At most one session per (roster, date) may be `open`; the transition
/// open → closed is one-way and `end_time` is set exactly when it happens.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub roster_id: i64,
    /// The instructor who opened the session.
    pub instructor_id: i64,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session lifecycle state, string backed.
#[derive(
    Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Status {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roster::Entity",
        from = "Column::RosterId",
        to = "super::roster::Column::Id"
    )]
    Roster,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::InstructorId",
        to = "super::user::Column::Id"
    )]
    Instructor,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::roster::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Roster.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == Status::Open
    }

    /// Finds the roster's open session for `date`, regardless of which
    /// instructor opened it.
    pub async fn find_open_for_roster<C>(
        db: &C,
        roster_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::RosterId.eq(roster_id))
            .filter(Column::Date.eq(date))
            .filter(Column::Status.eq(Status::Open))
            .one(db)
            .await
    }
}
