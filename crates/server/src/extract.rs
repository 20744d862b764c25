//! Extractors whose rejections use the JSON error body.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::ServerError;

/// JSON request body.
pub struct Body<T>(pub T);

impl<S, T> FromRequest<S> for Body<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ServerError::Generic(rejection.body_text())),
        }
    }
}

/// Listing query string. A repeated parameter keeps its last value.
pub struct Filter<T>(pub T);

impl<S, T> FromRequestParts<S> for Filter<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ServerError::Generic(rejection.body_text()))?;
        let params: Map<String, Value> = pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        serde_json::from_value(Value::Object(params))
            .map(Self)
            .map_err(|err| ServerError::Generic(err.to_string()))
    }
}

/// Numeric `{id}` path segment; anything else is a 404.
pub struct ItemId(pub i32);

impl<S> FromRequestParts<S> for ItemId
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ServerError::Generic(rejection.body_text()))?;
        raw.parse()
            .map(Self)
            .map_err(|_| engine::EngineError::KeyNotFound(raw).into())
    }
}
