//! Professor profiles.
//!
//! Like students, a professor owns its identity.

use sea_orm::entity::prelude::*;

use crate::{Identity, IdentityChanges};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "professors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub module: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::identities::Entity",
        from = "Column::UserId",
        to = "super::identities::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Identity,
    #[sea_orm(has_many = "super::courses::Entity")]
    Courses,
}

impl Related<super::identities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Identity.def()
    }
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Courses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Professor {
    pub id: i32,
    pub identity: Identity,
    pub module: String,
}

#[derive(Clone, Debug, Default)]
pub struct ProfessorChanges {
    pub identity: Option<IdentityChanges>,
    pub module: Option<String>,
}
