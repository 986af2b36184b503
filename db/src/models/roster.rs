use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, Set};
use serde::Serialize;

/// A formation group of learners under one or more instructors.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "rosters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique business identifier, e.g. "2824601".
    pub number: String,
    /// Human-readable name of the formation program.
    pub label: String,
    /// Site where the group is taught.
    pub site: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::learner::Entity")]
    Learners,
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
    #[sea_orm(has_many = "super::roster_instructor::Entity")]
    Instructors,
}

impl Related<super::learner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Learners.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        number: &str,
        label: &str,
        site: &str,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let roster = ActiveModel {
            number: Set(number.to_owned()),
            label: Set(label.to_owned()),
            site: Set(site.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        roster.insert(db).await
    }
}
