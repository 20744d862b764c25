//! Student profiles.
//!
//! A student exclusively owns its identity: deleting the student deletes the
//! identity too (see `Engine::delete_student`).

use sea_orm::entity::prelude::*;

use crate::{Group, Identity, IdentityChanges};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub student_group_id: Option<i32>,
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
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::StudentGroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Group,
    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendance,
}

impl Related<super::identities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Identity.def()
    }
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Student {
    pub id: i32,
    pub identity: Identity,
    pub group: Option<Group>,
}

/// Partial student update.
#[derive(Clone, Debug, Default)]
pub struct StudentChanges {
    pub identity: Option<IdentityChanges>,
    /// `Some(None)` detaches the student from its group.
    pub group_id: Option<Option<i32>>,
}
