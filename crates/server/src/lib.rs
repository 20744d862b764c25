use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::EngineError;
use serde_json::{Map, Value};

pub use auth::TokenKeys;
pub use server::{ServerState, router, run_with_listener};

mod admins;
mod attendance;
mod auth;
mod courses;
mod extract;
mod groups;
mod professors;
mod registration;
mod server;
mod students;
mod views;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Malformed request (bad JSON, bad path segment).
    Generic(String),
    /// Missing or invalid bearer token.
    Unauthorized(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey { .. } => StatusCode::CONFLICT,
        EngineError::InvalidField { .. } | EngineError::MissingField(_) => {
            StatusCode::BAD_REQUEST
        }
        EngineError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
        EngineError::Database(_) | EngineError::PasswordHash(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: &EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::PasswordHash(reason) => {
            tracing::error!("password hashing failed: {reason}");
            "internal server error".to_string()
        }
        EngineError::KeyNotFound(_) => "Not found.".to_string(),
        other => other.to_string(),
    }
}

/// `{"detail": ..., "<field>": [...]}`.
fn error_body(detail: String, field: Option<&str>) -> Value {
    let mut body = Map::new();
    if let Some(field) = field {
        body.insert(
            field.to_string(),
            Value::Array(vec![Value::String(detail.clone())]),
        );
    }
    body.insert("detail".to_string(), Value::String(detail));
    Value::Object(body)
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ServerError::Engine(err) => {
                let status = status_for_engine_error(&err);
                let body = error_body(message_for_engine_error(&err), err.field());
                (status, body)
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, error_body(err, None)),
            ServerError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, error_body(err, None)),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
