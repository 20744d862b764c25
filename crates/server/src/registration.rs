//! Public self-registration.
//!
//! Anyone may register, professors included.

use api_types::{
    professor::{ProfessorView, ProfessorWrite},
    student::{StudentView, StudentWrite},
    user::{UserPatch, UserWrite},
};
use axum::{Json, extract::State, http::StatusCode};
use engine::{IdentityChanges, NewIdentity};

use crate::{ServerError, extract::Body, server::ServerState, views};

pub(crate) fn new_identity(user: UserWrite) -> NewIdentity {
    NewIdentity {
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        password: user.password,
    }
}

/// Full replacement of the nested user; the password is only changed when
/// supplied.
pub(crate) fn replace_identity(user: UserWrite) -> IdentityChanges {
    IdentityChanges {
        email: Some(user.email),
        first_name: Some(user.first_name),
        last_name: Some(user.last_name),
        password: user.password,
    }
}

pub(crate) fn patch_identity(user: UserPatch) -> IdentityChanges {
    IdentityChanges {
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        password: user.password,
    }
}

/// `POST /register/student/`
pub async fn student(
    State(state): State<ServerState>,
    Body(payload): Body<StudentWrite>,
) -> Result<(StatusCode, Json<StudentView>), ServerError> {
    let student = state
        .engine
        .register_student(new_identity(payload.user), payload.student_group_id)
        .await?;
    Ok((StatusCode::CREATED, Json(views::student(student))))
}

/// `POST /register/professor/`
pub async fn professor(
    State(state): State<ServerState>,
    Body(payload): Body<ProfessorWrite>,
) -> Result<(StatusCode, Json<ProfessorView>), ServerError> {
    let professor = state
        .engine
        .register_professor(new_identity(payload.user), &payload.module)
        .await?;
    Ok((StatusCode::CREATED, Json(views::professor(professor))))
}
