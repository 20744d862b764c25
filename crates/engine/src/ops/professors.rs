use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    ListFilter, Professor, ProfessorChanges, ProfessorFilter, ResultEngine, courses,
    filters::{FilterField, matches},
    identities, professors,
    util::{LABEL_MAX_LEN, required_text},
};

use super::{
    Engine,
    courses::purge_courses,
    identities::update_identity,
    loaders::{assemble_professors, require_row, single},
    with_tx,
};

/// Delete professors with their courses (and those courses' attendance) and
/// their identities.
async fn purge_professors<C: ConnectionTrait>(
    db: &C,
    models: Vec<professors::Model>,
) -> ResultEngine<u64> {
    if models.is_empty() {
        return Ok(0);
    }
    let professor_ids: Vec<i32> = models.iter().map(|m| m.id).collect();
    let user_ids: Vec<i32> = models.iter().map(|m| m.user_id).collect();

    let taught = courses::Entity::find()
        .filter(courses::Column::ProfessorId.is_in(professor_ids.clone()))
        .all(db)
        .await?;
    purge_courses(db, taught.into_iter().map(|m| m.id).collect()).await?;

    let deleted = professors::Entity::delete_many()
        .filter(professors::Column::Id.is_in(professor_ids))
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
    /// Professors matching `filter`, ordered by id.
    pub async fn list_professors(&self, filter: &ProfessorFilter) -> ResultEngine<Vec<Professor>> {
        let mut query = professors::Entity::find();
        for term in filter.terms() {
            if term.field == FilterField::Module {
                query = query.filter(matches(professors::Column::Module, term.kind, term.value));
            }
        }
        let models = query
            .order_by_asc(professors::Column::Id)
            .all(&self.database)
            .await?;
        assemble_professors(&self.database, models).await
    }

    pub async fn professor(&self, professor_id: i32) -> ResultEngine<Professor> {
        let model =
            require_row::<professors::Entity, _>(&self.database, professor_id, "professor").await?;
        single(assemble_professors(&self.database, vec![model]).await?, "professor")
    }

    pub async fn update_professor(
        &self,
        professor_id: i32,
        changes: ProfessorChanges,
    ) -> ResultEngine<Professor> {
        with_tx!(self, |db_tx| {
            let model =
                require_row::<professors::Entity, _>(&db_tx, professor_id, "professor").await?;
            if let Some(identity) = changes.identity.as_ref() {
                update_identity(&db_tx, model.user_id, identity).await?;
            }

            let model = match changes.module.as_deref() {
                Some(module) => {
                    let mut active: professors::ActiveModel = model.into();
                    active.module = ActiveValue::Set(required_text(module, "module", LABEL_MAX_LEN)?);
                    active.update(&db_tx).await?
                }
                None => model,
            };

            tracing::info!(professor = professor_id, "professor updated");
            single(assemble_professors(&db_tx, vec![model]).await?, "professor")
        })
    }

    /// Remove a professor, every course they teach and their identity.
    pub async fn delete_professor(&self, professor_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model =
                require_row::<professors::Entity, _>(&db_tx, professor_id, "professor").await?;
            purge_professors(&db_tx, vec![model]).await?;
            tracing::info!(professor = professor_id, "professor deleted");
            Ok(())
        })
    }
}
