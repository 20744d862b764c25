//! Courses: scheduled offerings taught by one professor.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::{Group, Professor};

pub const DEFAULT_MODULE_NAME: &str = "DefaultModuleName";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    pub professor_id: i32,
    pub module: String,
    pub group_id: Option<i32>,
    pub date_time: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::professors::Entity",
        from = "Column::ProfessorId",
        to = "super::professors::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Professor,
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Group,
    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendance,
}

impl Related<super::professors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Professor.def()
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
pub struct Course {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub module: String,
    pub date_time: Option<DateTime<Utc>>,
    pub professor: Professor,
    pub group: Option<Group>,
}

#[derive(Clone, Debug)]
pub struct NewCourse {
    pub name: String,
    pub code: String,
    /// Falls back to [`DEFAULT_MODULE_NAME`].
    pub module: Option<String>,
    pub date_time: Option<DateTime<Utc>>,
    pub professor_id: i32,
    pub group_id: Option<i32>,
}

#[derive(Clone, Debug, Default)]
pub struct CourseChanges {
    pub name: Option<String>,
    pub code: Option<String>,
    pub module: Option<String>,
    pub date_time: Option<Option<DateTime<Utc>>>,
    pub professor_id: Option<i32>,
    pub group_id: Option<Option<i32>>,
}
