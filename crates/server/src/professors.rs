//! `/home/professors/` endpoints.

use api_types::professor::{ProfessorPatch, ProfessorView, ProfessorWrite};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use engine::{ProfessorChanges, ProfessorFilter};

use crate::{
    ServerError,
    extract::{Body, Filter, ItemId},
    registration::{new_identity, patch_identity, replace_identity},
    server::ServerState,
    views,
};

pub async fn list(
    State(state): State<ServerState>,
    Filter(filter): Filter<ProfessorFilter>,
) -> Result<Json<Vec<ProfessorView>>, ServerError> {
    let professors = state.engine.list_professors(&filter).await?;
    Ok(Json(professors.into_iter().map(views::professor).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    Body(payload): Body<ProfessorWrite>,
) -> Result<(StatusCode, Json<ProfessorView>), ServerError> {
    let professor = state
        .engine
        .register_professor(new_identity(payload.user), &payload.module)
        .await?;
    Ok((StatusCode::CREATED, Json(views::professor(professor))))
}

pub async fn retrieve(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
) -> Result<Json<ProfessorView>, ServerError> {
    Ok(Json(views::professor(state.engine.professor(id).await?)))
}

pub async fn replace(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
    Body(payload): Body<ProfessorWrite>,
) -> Result<Json<ProfessorView>, ServerError> {
    let changes = ProfessorChanges {
        identity: Some(replace_identity(payload.user)),
        module: Some(payload.module),
    };
    Ok(Json(views::professor(
        state.engine.update_professor(id, changes).await?,
    )))
}

pub async fn update(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
    Body(payload): Body<ProfessorPatch>,
) -> Result<Json<ProfessorView>, ServerError> {
    let changes = ProfessorChanges {
        identity: payload.user.map(patch_identity),
        module: payload.module,
    };
    Ok(Json(views::professor(
        state.engine.update_professor(id, changes).await?,
    )))
}

/// Also removes every course the professor teaches.
pub async fn destroy(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_professor(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
