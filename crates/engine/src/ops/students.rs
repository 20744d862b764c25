use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    ListFilter, ResultEngine, Student, StudentChanges, StudentFilter, attendance,
    filters::{FilterField, group_ids},
    groups, identities, students,
};

use super::{
    Engine,
    identities::update_identity,
    loaders::{assemble_students, require_reference, require_row, single},
    with_tx,
};

/// Delete students together with their attendance and their identities.
pub(super) async fn purge_students<C: ConnectionTrait>(
    db: &C,
    models: Vec<students::Model>,
) -> ResultEngine<u64> {
    if models.is_empty() {
        return Ok(0);
    }
    let student_ids: Vec<i32> = models.iter().map(|m| m.id).collect();
    let user_ids: Vec<i32> = models.iter().map(|m| m.user_id).collect();

    attendance::Entity::delete_many()
        .filter(attendance::Column::StudentId.is_in(student_ids.clone()))
        .exec(db)
        .await?;
    let deleted = students::Entity::delete_many()
        .filter(students::Column::Id.is_in(student_ids))
        .exec(db)
        .await?
        .rows_affected;
    identities::Entity::delete_many()
        .filter(identities::Column::Id.is_in(user_ids))
        .exec(db)
        .await?;
    Ok(deleted)
}

impl Engine {
    /// Students matching `filter`, ordered by id.
    pub async fn list_students(&self, filter: &StudentFilter) -> ResultEngine<Vec<Student>> {
        let mut query = students::Entity::find();
        for term in filter.terms() {
            query = match term.field {
                FilterField::GroupName => query.filter(
                    students::Column::StudentGroupId
                        .in_subquery(group_ids(groups::Column::Name, term.kind, term.value)),
                ),
                FilterField::SectionName => query.filter(
                    students::Column::StudentGroupId
                        .in_subquery(group_ids(groups::Column::Section, term.kind, term.value)),
                ),
                _ => query,
            };
        }
        let models = query
            .order_by_asc(students::Column::Id)
            .all(&self.database)
            .await?;
        assemble_students(&self.database, models).await
    }

    pub async fn student(&self, student_id: i32) -> ResultEngine<Student> {
        let model = require_row::<students::Entity, _>(&self.database, student_id, "student").await?;
        single(assemble_students(&self.database, vec![model]).await?, "student")
    }

    pub async fn update_student(
        &self,
        student_id: i32,
        changes: StudentChanges,
    ) -> ResultEngine<Student> {
        with_tx!(self, |db_tx| {
            let model = require_row::<students::Entity, _>(&db_tx, student_id, "student").await?;
            if let Some(identity) = changes.identity.as_ref() {
                update_identity(&db_tx, model.user_id, identity).await?;
            }

            let model = match changes.group_id {
                Some(group_id) => {
                    if let Some(group_id) = group_id {
                        require_reference::<groups::Entity, _>(&db_tx, group_id, "student_group_id")
                            .await?;
                    }
                    let mut active: students::ActiveModel = model.into();
                    active.student_group_id = ActiveValue::Set(group_id);
                    active.update(&db_tx).await?
                }
                None => model,
            };

            tracing::info!(student = student_id, "student updated");
            single(assemble_students(&db_tx, vec![model]).await?, "student")
        })
    }

    /// Remove a student, its attendance records and its identity.
    pub async fn delete_student(&self, student_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = require_row::<students::Entity, _>(&db_tx, student_id, "student").await?;
            purge_students(&db_tx, vec![model]).await?;
            tracing::info!(student = student_id, "student deleted");
            Ok(())
        })
    }
}
