use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, Set};
use serde::Serialize;

/// A learner enrolled in a roster, identified by their document number.
///
/// The document number is what a QR code carries and what manual entry types.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "learners")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub roster_id: i64,
    /// National identity document number; globally unique.
    pub document_number: String,
    pub full_name: String,
    /// Inactive learners stay enrolled for history but cannot check in.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roster::Entity",
        from = "Column::RosterId",
        to = "super::roster::Column::Id"
    )]
    Roster,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    AttendanceRecords,
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
        Relation::AttendanceRecords.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        roster_id: i64,
        document_number: &str,
        full_name: &str,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let learner = ActiveModel {
            roster_id: Set(roster_id),
            document_number: Set(document_number.to_owned()),
            full_name: Set(full_name.to_owned()),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        learner.insert(db).await
    }

    /// Looks a learner up by document number across all rosters.
    pub async fn find_by_document<C>(db: &C, document_number: &str) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find()
            .filter(Column::DocumentNumber.eq(document_number))
            .one(db)
            .await
    }
}
