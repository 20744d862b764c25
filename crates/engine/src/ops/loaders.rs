//! Row lookups and assembly of the nested read shapes.
//!
//! Listings load their rows first and then fetch every related table once with
//! an `IN (...)` query, so a listing costs a fixed number of queries.

use std::collections::{HashMap, HashSet};

use sea_orm::{ConnectionTrait, PrimaryKeyTrait, QueryFilter, prelude::*};

use crate::{
    Attendance, Course, EngineError, Group, Identity, Professor, ResultEngine, Student,
    attendance, courses, groups, identities, professors, students,
};

/// Fetch a row by id or fail with `KeyNotFound("<label> <id>")`.
pub(super) async fn require_row<E, C>(db: &C, id: i32, label: &str) -> ResultEngine<E::Model>
where
    E: EntityTrait,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = i32>,
    C: ConnectionTrait,
{
    E::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("{label} {id}")))
}

/// Fetch a row referenced by a write payload; a dangling id is a field error.
pub(super) async fn require_reference<E, C>(db: &C, id: i32, field: &str) -> ResultEngine<E::Model>
where
    E: EntityTrait,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = i32>,
    C: ConnectionTrait,
{
    E::find_by_id(id).one(db).await?.ok_or_else(|| {
        EngineError::invalid(field, format!("Invalid pk \"{id}\" - object does not exist."))
    })
}

async fn identities_by_id<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i32>,
) -> ResultEngine<HashMap<i32, Identity>> {
    let ids: HashSet<i32> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(identities::Entity::find()
        .filter(identities::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|model| (model.id, Identity::from(model)))
        .collect())
}

async fn groups_by_id<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i32>,
) -> ResultEngine<HashMap<i32, Group>> {
    let ids: HashSet<i32> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(groups::Entity::find()
        .filter(groups::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|model| (model.id, Group::from(model)))
        .collect())
}

fn take_identity(map: &HashMap<i32, Identity>, id: i32) -> ResultEngine<Identity> {
    map.get(&id)
        .cloned()
        .ok_or_else(|| EngineError::KeyNotFound(format!("identity {id}")))
}

pub(super) async fn assemble_students<C: ConnectionTrait>(
    db: &C,
    models: Vec<students::Model>,
) -> ResultEngine<Vec<Student>> {
    let identities = identities_by_id(db, models.iter().map(|m| m.user_id)).await?;
    let groups = groups_by_id(db, models.iter().filter_map(|m| m.student_group_id)).await?;

    models
        .into_iter()
        .map(|model| {
            Ok(Student {
                id: model.id,
                identity: take_identity(&identities, model.user_id)?,
                group: model
                    .student_group_id
                    .and_then(|id| groups.get(&id).cloned()),
            })
        })
        .collect()
}

pub(super) async fn assemble_professors<C: ConnectionTrait>(
    db: &C,
    models: Vec<professors::Model>,
) -> ResultEngine<Vec<Professor>> {
    let identities = identities_by_id(db, models.iter().map(|m| m.user_id)).await?;

    models
        .into_iter()
        .map(|model| {
            Ok(Professor {
                id: model.id,
                identity: take_identity(&identities, model.user_id)?,
                module: model.module,
            })
        })
        .collect()
}

pub(super) async fn assemble_courses<C: ConnectionTrait>(
    db: &C,
    models: Vec<courses::Model>,
) -> ResultEngine<Vec<Course>> {
    let professor_ids: HashSet<i32> = models.iter().map(|m| m.professor_id).collect();
    let professor_rows = if professor_ids.is_empty() {
        Vec::new()
    } else {
        professors::Entity::find()
            .filter(professors::Column::Id.is_in(professor_ids))
            .all(db)
            .await?
    };
    let professors: HashMap<i32, Professor> = assemble_professors(db, professor_rows)
        .await?
        .into_iter()
        .map(|professor| (professor.id, professor))
        .collect();
    let groups = groups_by_id(db, models.iter().filter_map(|m| m.group_id)).await?;

    models
        .into_iter()
        .map(|model| {
            let professor = professors.get(&model.professor_id).cloned().ok_or_else(|| {
                EngineError::KeyNotFound(format!("professor {}", model.professor_id))
            })?;
            Ok(Course {
                id: model.id,
                name: model.name,
                code: model.code,
                module: model.module,
                date_time: model.date_time,
                professor,
                group: model.group_id.and_then(|id| groups.get(&id).cloned()),
            })
        })
        .collect()
}

pub(super) async fn assemble_attendance<C: ConnectionTrait>(
    db: &C,
    models: Vec<attendance::Model>,
) -> ResultEngine<Vec<Attendance>> {
    let student_ids: HashSet<i32> = models.iter().map(|m| m.student_id).collect();
    let course_ids: HashSet<i32> = models.iter().map(|m| m.course_id).collect();
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let student_rows = students::Entity::find()
        .filter(students::Column::Id.is_in(student_ids))
        .all(db)
        .await?;
    let students: HashMap<i32, Student> = assemble_students(db, student_rows)
        .await?
        .into_iter()
        .map(|student| (student.id, student))
        .collect();

    let course_rows = courses::Entity::find()
        .filter(courses::Column::Id.is_in(course_ids))
        .all(db)
        .await?;
    let courses: HashMap<i32, Course> = assemble_courses(db, course_rows)
        .await?
        .into_iter()
        .map(|course| (course.id, course))
        .collect();

    models
        .into_iter()
        .map(|model| {
            let student = students.get(&model.student_id).cloned().ok_or_else(|| {
                EngineError::KeyNotFound(format!("student {}", model.student_id))
            })?;
            let course = courses.get(&model.course_id).cloned().ok_or_else(|| {
                EngineError::KeyNotFound(format!("course {}", model.course_id))
            })?;
            Ok(Attendance {
                id: model.id,
                student,
                course,
                time: model.time,
                present_status: model.present_status,
            })
        })
        .collect()
}

/// Unwrap the single element of a one-row assembly.
pub(super) fn single<T>(mut items: Vec<T>, label: &str) -> ResultEngine<T> {
    items
        .pop()
        .ok_or_else(|| EngineError::KeyNotFound(label.to_string()))
}
