//! `/home/groups/` endpoints (no filters).

use api_types::group::{GroupPatch, GroupView, GroupWrite};
use axum::{Json, extract::State, http::StatusCode};
use engine::{GroupChanges, NewGroup};

use crate::{
    ServerError,
    extract::{Body, ItemId},
    server::ServerState,
    views,
};

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<GroupView>>, ServerError> {
    let groups = state.engine.list_groups().await?;
    Ok(Json(groups.into_iter().map(views::group).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    Body(payload): Body<GroupWrite>,
) -> Result<(StatusCode, Json<GroupView>), ServerError> {
    let group = state
        .engine
        .create_group(NewGroup {
            name: payload.name,
            section: payload.section,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(views::group(group))))
}

pub async fn retrieve(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
) -> Result<Json<GroupView>, ServerError> {
    Ok(Json(views::group(state.engine.group(id).await?)))
}

pub async fn replace(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
    Body(payload): Body<GroupWrite>,
) -> Result<Json<GroupView>, ServerError> {
    let changes = GroupChanges {
        name: payload.name,
        section: Some(payload.section),
    };
    Ok(Json(views::group(state.engine.update_group(id, changes).await?)))
}

pub async fn update(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
    Body(payload): Body<GroupPatch>,
) -> Result<Json<GroupView>, ServerError> {
    let changes = GroupChanges {
        name: payload.name,
        section: payload.section,
    };
    Ok(Json(views::group(state.engine.update_group(id, changes).await?)))
}

/// Cascades to the group's courses and students.
pub async fn destroy(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_group(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
