use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Course, CourseChanges, CourseFilter, EngineError, ListFilter, NewCourse, ResultEngine,
    attendance,
    courses::{self, DEFAULT_MODULE_NAME},
    error::UniqueKey,
    filters::{FilterField, group_ids, matches, professor_ids_by_email},
    groups, professors,
    util::{COURSE_CODE_MAX_LEN, LABEL_MAX_LEN, required_text, text_or_default},
};

use super::{
    Engine,
    loaders::{assemble_courses, require_reference, require_row, single},
    with_tx,
};

const CODE_TAKEN: &str = "course with this code already exists.";

const COURSE_KEYS: &[UniqueKey] = &[UniqueKey {
    column: "courses.code",
    field: "code",
    message: CODE_TAKEN,
}];

/// Delete courses and the attendance recorded against them.
pub(super) async fn purge_courses<C: ConnectionTrait>(
    db: &C,
    course_ids: Vec<i32>,
) -> ResultEngine<u64> {
    if course_ids.is_empty() {
        return Ok(0);
    }
    attendance::Entity::delete_many()
        .filter(attendance::Column::CourseId.is_in(course_ids.clone()))
        .exec(db)
        .await?;
    Ok(courses::Entity::delete_many()
        .filter(courses::Column::Id.is_in(course_ids))
        .exec(db)
        .await?
        .rows_affected)
}

async fn ensure_code_free<C: ConnectionTrait>(
    db: &C,
    code: &str,
    except: Option<i32>,
) -> ResultEngine<()> {
    let mut query = courses::Entity::find().filter(courses::Column::Code.eq(code));
    if let Some(id) = except {
        query = query.filter(courses::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(EngineError::existing("code", CODE_TAKEN));
    }
    Ok(())
}

impl Engine {
    /// Courses matching `filter`, ordered by name then id.
    pub async fn list_courses(&self, filter: &CourseFilter) -> ResultEngine<Vec<Course>> {
        let mut query = courses::Entity::find();
        for term in filter.terms() {
            query = match term.field {
                FilterField::Module => {
                    query.filter(matches(courses::Column::Module, term.kind, term.value))
                }
                FilterField::GroupName => query.filter(
                    courses::Column::GroupId
                        .in_subquery(group_ids(groups::Column::Name, term.kind, term.value)),
                ),
                FilterField::SectionName => query.filter(
                    courses::Column::GroupId
                        .in_subquery(group_ids(groups::Column::Section, term.kind, term.value)),
                ),
                FilterField::ProfessorEmail => query.filter(
                    courses::Column::ProfessorId
                        .in_subquery(professor_ids_by_email(term.kind, term.value)),
                ),
                _ => query,
            };
        }
        let models = query
            .order_by_asc(courses::Column::Name)
            .order_by_asc(courses::Column::Id)
            .all(&self.database)
            .await?;
        assemble_courses(&self.database, models).await
    }

    pub async fn course(&self, course_id: i32) -> ResultEngine<Course> {
        let model = require_row::<courses::Entity, _>(&self.database, course_id, "course").await?;
        single(assemble_courses(&self.database, vec![model]).await?, "course")
    }

    pub async fn create_course(&self, course: NewCourse) -> ResultEngine<Course> {
        with_tx!(self, |db_tx| {
            let name = required_text(&course.name, "name", LABEL_MAX_LEN)?;
            let code = required_text(&course.code, "code", COURSE_CODE_MAX_LEN)?;
            let module = text_or_default(
                course.module.as_deref(),
                "module",
                LABEL_MAX_LEN,
                DEFAULT_MODULE_NAME,
            )?;
            ensure_code_free(&db_tx, &code, None).await?;
            require_reference::<professors::Entity, _>(&db_tx, course.professor_id, "professor_id")
                .await?;
            if let Some(group_id) = course.group_id {
                require_reference::<groups::Entity, _>(&db_tx, group_id, "group_id").await?;
            }

            let model = courses::ActiveModel {
                name: ActiveValue::Set(name),
                code: ActiveValue::Set(code),
                professor_id: ActiveValue::Set(course.professor_id),
                module: ActiveValue::Set(module),
                group_id: ActiveValue::Set(course.group_id),
                date_time: ActiveValue::Set(course.date_time),
                ..Default::default()
            }
            .insert(&db_tx)
            .await
            .map_err(|err| EngineError::from_db(err, COURSE_KEYS))?;

            tracing::info!(course = model.id, code = %model.code, "course created");
            single(assemble_courses(&db_tx, vec![model]).await?, "course")
        })
    }

    pub async fn update_course(
        &self,
        course_id: i32,
        changes: CourseChanges,
    ) -> ResultEngine<Course> {
        with_tx!(self, |db_tx| {
            let model = require_row::<courses::Entity, _>(&db_tx, course_id, "course").await?;
            let mut active: courses::ActiveModel = model.into();

            if let Some(name) = changes.name.as_deref() {
                active.name = ActiveValue::Set(required_text(name, "name", LABEL_MAX_LEN)?);
            }
            if let Some(code) = changes.code.as_deref() {
                let code = required_text(code, "code", COURSE_CODE_MAX_LEN)?;
                ensure_code_free(&db_tx, &code, Some(course_id)).await?;
                active.code = ActiveValue::Set(code);
            }
            if let Some(module) = changes.module.as_deref() {
                active.module = ActiveValue::Set(required_text(module, "module", LABEL_MAX_LEN)?);
            }
            if let Some(date_time) = changes.date_time {
                active.date_time = ActiveValue::Set(date_time);
            }
            if let Some(professor_id) = changes.professor_id {
                require_reference::<professors::Entity, _>(&db_tx, professor_id, "professor_id")
                    .await?;
                active.professor_id = ActiveValue::Set(professor_id);
            }
            if let Some(group_id) = changes.group_id {
                if let Some(group_id) = group_id {
                    require_reference::<groups::Entity, _>(&db_tx, group_id, "group_id").await?;
                }
                active.group_id = ActiveValue::Set(group_id);
            }

            let model = active
                .update(&db_tx)
                .await
                .map_err(|err| EngineError::from_db(err, COURSE_KEYS))?;
            tracing::info!(course = course_id, "course updated");
            single(assemble_courses(&db_tx, vec![model]).await?, "course")
        })
    }

    /// Remove a course and its attendance records.
    pub async fn delete_course(&self, course_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            require_row::<courses::Entity, _>(&db_tx, course_id, "course").await?;
            purge_courses(&db_tx, vec![course_id]).await?;
            tracing::info!(course = course_id, "course deleted");
            Ok(())
        })
    }
}
