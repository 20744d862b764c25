//! `GET /admins/`: any authenticated identity may list the admins.

use api_types::user::UserView;
use axum::{Json, extract::State};

use crate::{ServerError, server::ServerState, views};

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<UserView>>, ServerError> {
    let admins = state.engine.list_admins().await?;
    Ok(Json(admins.into_iter().map(views::user).collect()))
}
