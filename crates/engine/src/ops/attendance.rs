use chrono::Utc;
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, QuerySelect, QueryTrait, TransactionTrait,
    prelude::*,
    sea_query::{SelectStatement, SimpleExpr},
};

use crate::{
    Attendance, AttendanceChanges, AttendanceFilter, EngineError, ListFilter, NewAttendance,
    ResultEngine,
    attendance::{self, DEFAULT_STATUS},
    courses,
    filters::{FilterField, group_ids, matches, professor_ids_by_email, student_ids_by_email},
    groups, students,
    util::{STATUS_MAX_LEN, required_text, text_or_default},
};

use super::{
    Engine,
    loaders::{assemble_attendance, require_reference, require_row, single},
    with_tx,
};

/// `SELECT id FROM courses WHERE <condition>`.
fn course_ids_where(condition: SimpleExpr) -> SelectStatement {
    courses::Entity::find()
        .select_only()
        .column(courses::Column::Id)
        .filter(condition)
        .into_query()
}

impl Engine {
    /// Attendance records matching `filter`, ordered by id.
    ///
    /// Group and section terms apply to the course's group.
    pub async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> ResultEngine<Vec<Attendance>> {
        let mut query = attendance::Entity::find();
        for term in filter.terms() {
            let condition = match term.field {
                FilterField::GroupName => attendance::Column::CourseId.in_subquery(
                    course_ids_where(courses::Column::GroupId.in_subquery(group_ids(
                        groups::Column::Name,
                        term.kind,
                        term.value,
                    ))),
                ),
                FilterField::SectionName => attendance::Column::CourseId.in_subquery(
                    course_ids_where(courses::Column::GroupId.in_subquery(group_ids(
                        groups::Column::Section,
                        term.kind,
                        term.value,
                    ))),
                ),
                FilterField::ProfessorEmail => {
                    attendance::Column::CourseId.in_subquery(course_ids_where(
                        courses::Column::ProfessorId
                            .in_subquery(professor_ids_by_email(term.kind, term.value)),
                    ))
                }
                FilterField::Module => attendance::Column::CourseId.in_subquery(
                    course_ids_where(matches(courses::Column::Module, term.kind, term.value)),
                ),
                FilterField::PresentStatus => {
                    matches(attendance::Column::PresentStatus, term.kind, term.value)
                }
                FilterField::StudentEmail => attendance::Column::StudentId
                    .in_subquery(student_ids_by_email(term.kind, term.value)),
                FilterField::CourseId => {
                    let course_id: i32 = term
                        .value
                        .trim()
                        .parse()
                        .map_err(|_| EngineError::invalid("course_id", "Enter a number."))?;
                    attendance::Column::CourseId.eq(course_id)
                }
            };
            query = query.filter(condition);
        }
        let models = query
            .order_by_asc(attendance::Column::Id)
            .all(&self.database)
            .await?;
        assemble_attendance(&self.database, models).await
    }

    pub async fn attendance(&self, attendance_id: i32) -> ResultEngine<Attendance> {
        let model =
            require_row::<attendance::Entity, _>(&self.database, attendance_id, "attendance")
                .await?;
        single(
            assemble_attendance(&self.database, vec![model]).await?,
            "attendance",
        )
    }

    pub async fn create_attendance(&self, record: NewAttendance) -> ResultEngine<Attendance> {
        with_tx!(self, |db_tx| {
            require_reference::<students::Entity, _>(&db_tx, record.student_id, "student_id")
                .await?;
            require_reference::<courses::Entity, _>(&db_tx, record.course_id, "course_id")
                .await?;
            let present_status = text_or_default(
                record.present_status.as_deref(),
                "present_status",
                STATUS_MAX_LEN,
                DEFAULT_STATUS,
            )?;

            let model = attendance::ActiveModel {
                student_id: ActiveValue::Set(record.student_id),
                course_id: ActiveValue::Set(record.course_id),
                time: ActiveValue::Set(record.time.unwrap_or_else(Utc::now)),
                present_status: ActiveValue::Set(present_status),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(
                attendance = model.id,
                student = model.student_id,
                course = model.course_id,
                status = %model.present_status,
                "attendance recorded"
            );
            single(assemble_attendance(&db_tx, vec![model]).await?, "attendance")
        })
    }

    pub async fn update_attendance(
        &self,
        attendance_id: i32,
        changes: AttendanceChanges,
    ) -> ResultEngine<Attendance> {
        with_tx!(self, |db_tx| {
            let model =
                require_row::<attendance::Entity, _>(&db_tx, attendance_id, "attendance").await?;
            let mut active: attendance::ActiveModel = model.into();

            if let Some(student_id) = changes.student_id {
                require_reference::<students::Entity, _>(&db_tx, student_id, "student_id")
                    .await?;
                active.student_id = ActiveValue::Set(student_id);
            }
            if let Some(course_id) = changes.course_id {
                require_reference::<courses::Entity, _>(&db_tx, course_id, "course_id").await?;
                active.course_id = ActiveValue::Set(course_id);
            }
            if let Some(time) = changes.time {
                active.time = ActiveValue::Set(time);
            }
            if let Some(status) = changes.present_status.as_deref() {
                active.present_status =
                    ActiveValue::Set(required_text(status, "present_status", STATUS_MAX_LEN)?);
            }

            let model = active.update(&db_tx).await?;
            tracing::info!(attendance = attendance_id, "attendance updated");
            single(assemble_attendance(&db_tx, vec![model]).await?, "attendance")
        })
    }

    /// Change only the status of a record.
    ///
    /// An unknown record is reported before a missing status. Any non-empty
    /// status is stored as sent.
    pub async fn update_attendance_status(
        &self,
        attendance_id: i32,
        present_status: Option<&str>,
    ) -> ResultEngine<Attendance> {
        with_tx!(self, |db_tx| {
            let model =
                require_row::<attendance::Entity, _>(&db_tx, attendance_id, "attendance").await?;
            let status = present_status
                .filter(|status| !status.is_empty())
                .ok_or_else(|| EngineError::MissingField("present_status".to_string()))?;
            if status.chars().count() > STATUS_MAX_LEN {
                return Err(EngineError::invalid(
                    "present_status",
                    format!("Ensure this field has no more than {STATUS_MAX_LEN} characters."),
                ));
            }

            let previous = model.present_status.clone();
            let mut active: attendance::ActiveModel = model.into();
            active.present_status = ActiveValue::Set(status.to_string());
            let model = active.update(&db_tx).await?;

            tracing::info!(
                attendance = attendance_id,
                from = %previous,
                to = %model.present_status,
                "attendance status changed"
            );
            single(assemble_attendance(&db_tx, vec![model]).await?, "attendance")
        })
    }

    pub async fn delete_attendance(&self, attendance_id: i32) -> ResultEngine<()> {
        let result = attendance::Entity::delete_by_id(attendance_id)
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(format!("attendance {attendance_id}")));
        }
        tracing::info!(attendance = attendance_id, "attendance deleted");
        Ok(())
    }
}
