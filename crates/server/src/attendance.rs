//! `/home/attendance/` endpoints and the status-only update action.

use api_types::attendance::{AttendancePatch, AttendanceView, AttendanceWrite, StatusUpdate};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
};
use engine::{AttendanceChanges, AttendanceFilter, NewAttendance};

use crate::{
    ServerError,
    extract::{Body, Filter, ItemId},
    server::ServerState,
    views,
};

pub async fn list(
    State(state): State<ServerState>,
    Filter(filter): Filter<AttendanceFilter>,
) -> Result<Json<Vec<AttendanceView>>, ServerError> {
    let records = state.engine.list_attendance(&filter).await?;
    Ok(Json(records.into_iter().map(views::attendance).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    Body(payload): Body<AttendanceWrite>,
) -> Result<(StatusCode, Json<AttendanceView>), ServerError> {
    let record = state
        .engine
        .create_attendance(NewAttendance {
            student_id: payload.student_id,
            course_id: payload.course_id,
            time: payload.time,
            present_status: payload.present_status,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(views::attendance(record))))
}

pub async fn retrieve(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
) -> Result<Json<AttendanceView>, ServerError> {
    Ok(Json(views::attendance(state.engine.attendance(id).await?)))
}

pub async fn replace(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
    Body(payload): Body<AttendanceWrite>,
) -> Result<Json<AttendanceView>, ServerError> {
    let changes = AttendanceChanges {
        student_id: Some(payload.student_id),
        course_id: Some(payload.course_id),
        time: payload.time,
        present_status: payload.present_status,
    };
    Ok(Json(views::attendance(
        state.engine.update_attendance(id, changes).await?,
    )))
}

pub async fn update(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
    Body(payload): Body<AttendancePatch>,
) -> Result<Json<AttendanceView>, ServerError> {
    let changes = AttendanceChanges {
        student_id: payload.student_id,
        course_id: payload.course_id,
        time: payload.time,
        present_status: payload.present_status,
    };
    Ok(Json(views::attendance(
        state.engine.update_attendance(id, changes).await?,
    )))
}

/// `PATCH /home/attendance/{id}/update-status/`
///
/// An empty request body counts as a missing status.
pub async fn update_status(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
    body: Bytes,
) -> Result<Json<AttendanceView>, ServerError> {
    let payload: StatusUpdate = if body.iter().all(u8::is_ascii_whitespace) {
        StatusUpdate::default()
    } else {
        serde_json::from_slice(&body).map_err(|err| ServerError::Generic(err.to_string()))?
    };

    let record = state
        .engine
        .update_attendance_status(id, payload.present_status.as_deref())
        .await?;
    Ok(Json(views::attendance(record)))
}

pub async fn destroy(
    State(state): State<ServerState>,
    ItemId(id): ItemId,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_attendance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
