//! `/home/students/` endpoints.

use api_types::student::{StudentPatch, StudentView, StudentWrite};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use engine::{StudentChanges, StudentFilter};

use crate::{
    ServerError,
    extract::{Body, Filter, ItemId},
    registration::{new_identity, patch_identity, replace_identity},
    server::ServerState,
    views,
};

pub async fn list(
    State(state): State<ServerState>,
    Filter(filter): Filter<StudentFilter>,
) -> Result<Json<Vec<StudentView>>, ServerError> {
    let students = state.engine.list_students(&filter).await?;
    Ok(Json(students.into_iter().map(views::student).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    Body(payload): Body<StudentWrite>,
) -> Result<(StatusCode, Json<StudentView>), ServerError> {
    let student = state
        .engine
        .register_student(new_identity(payload.user), payload.student_group_id)
        .await?;
    Ok((StatusCode::CREATED, Json(views::student(student))))
}

pub async fn retrieve(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
) -> Result<Json<StudentView>, ServerError> {
    Ok(Json(views::student(state.engine.student(id).await?)))
}

pub async fn replace(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
    Body(payload): Body<StudentWrite>,
) -> Result<Json<StudentView>, ServerError> {
    let changes = StudentChanges {
        identity: Some(replace_identity(payload.user)),
        group_id: Some(payload.student_group_id),
    };
    Ok(Json(views::student(
        state.engine.update_student(id, changes).await?,
    )))
}

pub async fn update(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
    Body(payload): Body<StudentPatch>,
) -> Result<Json<StudentView>, ServerError> {
    let changes = StudentChanges {
        identity: payload.user.map(patch_identity),
        group_id: payload.student_group_id.map(Some),
    };
    Ok(Json(views::student(
        state.engine.update_student(id, changes).await?,
    )))
}

pub async fn destroy(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_student(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
