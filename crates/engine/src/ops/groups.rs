use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Group, GroupChanges, NewGroup, ResultEngine, courses,
    groups::{self, DEFAULT_GROUP_NAME},
    students,
    util::{LABEL_MAX_LEN, required_text, text_or_default},
};

use super::{Engine, courses::purge_courses, loaders::require_row, students::purge_students, with_tx};

impl Engine {
    /// All groups ordered by id.
    pub async fn list_groups(&self) -> ResultEngine<Vec<Group>> {
        Ok(groups::Entity::find()
            .order_by_asc(groups::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Group::from)
            .collect())
    }

    pub async fn group(&self, group_id: i32) -> ResultEngine<Group> {
        require_row::<groups::Entity, _>(&self.database, group_id, "group")
            .await
            .map(Group::from)
    }

    pub async fn create_group(&self, group: NewGroup) -> ResultEngine<Group> {
        let name = text_or_default(
            group.name.as_deref(),
            "name",
            LABEL_MAX_LEN,
            DEFAULT_GROUP_NAME,
        )?;
        let section = required_text(&group.section, "section", LABEL_MAX_LEN)?;

        let model = groups::ActiveModel {
            name: ActiveValue::Set(name),
            section: ActiveValue::Set(section),
            ..Default::default()
        }
        .insert(&self.database)
        .await?;
        tracing::info!(group = model.id, name = %model.name, "group created");
        Ok(Group::from(model))
    }

    pub async fn update_group(&self, group_id: i32, changes: GroupChanges) -> ResultEngine<Group> {
        with_tx!(self, |db_tx| {
            let model = require_row::<groups::Entity, _>(&db_tx, group_id, "group").await?;
            let mut active: groups::ActiveModel = model.into();
            if let Some(name) = changes.name.as_deref() {
                active.name = ActiveValue::Set(required_text(name, "name", LABEL_MAX_LEN)?);
            }
            if let Some(section) = changes.section.as_deref() {
                active.section = ActiveValue::Set(required_text(section, "section", LABEL_MAX_LEN)?);
            }
            let model = active.update(&db_tx).await?;
            tracing::info!(group = group_id, "group updated");
            Ok(Group::from(model))
        })
    }

    /// Remove a group with its courses and its students (identities included).
    pub async fn delete_group(&self, group_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            require_row::<groups::Entity, _>(&db_tx, group_id, "group").await?;

            let course_ids: Vec<i32> = courses::Entity::find()
                .filter(courses::Column::GroupId.eq(group_id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|m| m.id)
                .collect();
            let removed_courses = purge_courses(&db_tx, course_ids).await?;

            let members = students::Entity::find()
                .filter(students::Column::StudentGroupId.eq(group_id))
                .all(&db_tx)
                .await?;
            let removed_students = purge_students(&db_tx, members).await?;

            groups::Entity::delete_by_id(group_id).exec(&db_tx).await?;
            tracing::info!(
                group = group_id,
                removed_courses,
                removed_students,
                "group deleted"
            );
            Ok(())
        })
    }
}
