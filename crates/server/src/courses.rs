//! `/home/courses/` endpoints.

use api_types::course::{CoursePatch, CourseView, CourseWrite};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use engine::{CourseChanges, CourseFilter, NewCourse};

use crate::{
    ServerError,
    extract::{Body, Filter, ItemId},
    server::ServerState,
    views,
};

pub async fn list(
    State(state): State<ServerState>,
    Filter(filter): Filter<CourseFilter>,
) -> Result<Json<Vec<CourseView>>, ServerError> {
    let courses = state.engine.list_courses(&filter).await?;
    Ok(Json(courses.into_iter().map(views::course).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    Body(payload): Body<CourseWrite>,
) -> Result<(StatusCode, Json<CourseView>), ServerError> {
    let course = state
        .engine
        .create_course(NewCourse {
            name: payload.name,
            code: payload.code,
            module: payload.module,
            date_time: payload.date_time,
            professor_id: payload.professor_id,
            group_id: payload.group_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(views::course(course))))
}

pub async fn retrieve(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
) -> Result<Json<CourseView>, ServerError> {
    Ok(Json(views::course(state.engine.course(id).await?)))
}

pub async fn replace(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
    Body(payload): Body<CourseWrite>,
) -> Result<Json<CourseView>, ServerError> {
    let changes = CourseChanges {
        name: Some(payload.name),
        code: Some(payload.code),
        module: payload.module,
        date_time: Some(payload.date_time),
        professor_id: Some(payload.professor_id),
        group_id: Some(payload.group_id),
    };
    Ok(Json(views::course(
        state.engine.update_course(id, changes).await?,
    )))
}

pub async fn update(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
    Body(payload): Body<CoursePatch>,
) -> Result<Json<CourseView>, ServerError> {
    let changes = CourseChanges {
        name: payload.name,
        code: payload.code,
        module: payload.module,
        date_time: payload.date_time.map(Some),
        professor_id: payload.professor_id,
        group_id: payload.group_id.map(Some),
    };
    Ok(Json(views::course(
        state.engine.update_course(id, changes).await?,
    )))
}

pub async fn destroy(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_course(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
