use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, Set};
use serde::Serialize;

/// Assignment edge between a roster and an instructor.
///
/// `SessionManager` consults this table before opening a session: an
/// instructor who is not assigned to the roster is rejected.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "roster_instructors")]
pub struct Model {
    /// Roster ID (foreign key to `rosters`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub roster_id: i64,

    /// Instructor's user ID (foreign key to `users`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub instructor_id: i64,
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
}

impl Related<super::roster::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Roster.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Instructor.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Assigns an instructor to a roster.
    pub async fn assign(
        db: &DatabaseConnection,
        roster_id: i64,
        instructor_id: i64,
    ) -> Result<Self, DbErr> {
        let edge = ActiveModel {
            roster_id: Set(roster_id),
            instructor_id: Set(instructor_id),
        };
        edge.insert(db).await
    }

    /// Returns `true` if `instructor_id` is assigned to `roster_id`.
    pub async fn is_assigned(
        db: &DatabaseConnection,
        roster_id: i64,
        instructor_id: i64,
    ) -> Result<bool, DbErr> {
        Ok(Entity::find()
            .filter(Column::RosterId.eq(roster_id))
            .filter(Column::InstructorId.eq(instructor_id))
            .one(db)
            .await?
            .is_some())
    }
}
