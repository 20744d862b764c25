//! Attendance records: one student, one course session, one status.
//!
//! The status is a free-form label (`Present`, `late`, `justified`, ...).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::{Course, Student};

pub const DEFAULT_STATUS: &str = "Absent";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "attendance")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub student_id: i32,
    pub course_id: i32,
    pub time: DateTimeUtc,
    pub present_status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Course,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attendance {
    pub id: i32,
    pub student: Student,
    pub course: Course,
    pub time: DateTime<Utc>,
    pub present_status: String,
}

#[derive(Clone, Debug)]
pub struct NewAttendance {
    pub student_id: i32,
    pub course_id: i32,
    /// Defaults to now.
    pub time: Option<DateTime<Utc>>,
    /// Defaults to [`DEFAULT_STATUS`].
    pub present_status: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct AttendanceChanges {
    pub student_id: Option<i32>,
    pub course_id: Option<i32>,
    pub time: Option<DateTime<Utc>>,
    pub present_status: Option<String>,
}
