//! Bearer tokens, the authentication middleware and the staff gate.
//!
//! A token is `base64url(claims).base64url(hmac_sha256(claims))` where the
//! claims carry the identity id, the token kind and the expiry (unix seconds).

use api_types::auth::{AccessToken, TokenObtain, TokenPair, TokenRefresh};
use axum::{
    Extension, Json,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use engine::{EngineError, Identity};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{ServerError, extract::Body, server::ServerState};

type HmacSha256 = Hmac<Sha256>;

const INVALID_TOKEN: &str = "Token is invalid or expired";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i32,
    kind: TokenKind,
    exp: i64,
}

/// Signing secret and token lifetimes.
#[derive(Clone)]
pub struct TokenKeys {
    secret: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: impl AsRef<[u8]>, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            access_ttl: Duration::seconds(access_ttl_secs),
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
        }
    }

    fn mac(&self) -> Result<HmacSha256, ServerError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|err| {
            tracing::error!("invalid token secret: {err}");
            ServerError::Unauthorized(INVALID_TOKEN.to_string())
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, ServerError> {
        let payload = serde_json::to_vec(claims)
            .map_err(|err| ServerError::Generic(format!("cannot encode token: {err}")))?;
        let payload = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    fn issue(&self, identity_id: i32, kind: TokenKind) -> Result<String, ServerError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        self.sign(&Claims {
            sub: identity_id,
            kind,
            exp: (Utc::now() + ttl).timestamp(),
        })
    }

    /// Identity id carried by a valid, unexpired token of `kind`.
    fn verify(&self, token: &str, kind: TokenKind) -> Result<i32, ServerError> {
        let invalid = || ServerError::Unauthorized(INVALID_TOKEN.to_string());

        let (payload, signature) = token.split_once('.').ok_or_else(invalid)?;
        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| invalid())?;
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).map_err(|_| invalid())?;

        let payload = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid())?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| invalid())?;
        if claims.kind != kind || claims.exp <= Utc::now().timestamp() {
            return Err(invalid());
        }
        Ok(claims.sub)
    }

    pub fn access_token(&self, identity_id: i32) -> Result<String, ServerError> {
        self.issue(identity_id, TokenKind::Access)
    }

    pub fn refresh_token(&self, identity_id: i32) -> Result<String, ServerError> {
        self.issue(identity_id, TokenKind::Refresh)
    }
}

/// `POST /user/token/`
pub async fn obtain(
    State(state): State<ServerState>,
    Body(payload): Body<TokenObtain>,
) -> Result<Json<TokenPair>, ServerError> {
    let identity = state
        .engine
        .authenticate(&payload.username, &payload.password)
        .await?;
    tracing::info!(identity = identity.id, "token pair issued");

    Ok(Json(TokenPair {
        access: state.tokens.access_token(identity.id)?,
        refresh: state.tokens.refresh_token(identity.id)?,
    }))
}

/// `POST /user/token/refresh/`
pub async fn refresh(
    State(state): State<ServerState>,
    Body(payload): Body<TokenRefresh>,
) -> Result<Json<AccessToken>, ServerError> {
    let identity_id = state.tokens.verify(&payload.refresh, TokenKind::Refresh)?;
    Ok(Json(AccessToken {
        access: state.tokens.access_token(identity_id)?,
    }))
}

/// Resolve the bearer token to an [`Identity`] stored in the request
/// extensions.
pub async fn authenticate(
    State(state): State<ServerState>,
    header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let header = header.map_err(|rejection| {
        if rejection.is_missing() {
            ServerError::Unauthorized("Authentication credentials were not provided.".to_string())
        } else {
            ServerError::Unauthorized(INVALID_TOKEN.to_string())
        }
    })?;

    let identity_id = state.tokens.verify(header.token(), TokenKind::Access)?;
    let identity = match state.engine.identity(identity_id).await {
        Ok(identity) => identity,
        Err(EngineError::KeyNotFound(_)) => {
            return Err(ServerError::Unauthorized("User not found".to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Let through admins and professors only.
pub async fn require_staff(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    state.engine.require_staff(&identity).await?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;

    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new("test-secret", 300, 86_400)
    }

    #[test]
    fn access_token_round_trip() {
        let keys = keys();
        let token = keys.access_token(42).unwrap();
        assert_eq!(keys.verify(&token, TokenKind::Access).unwrap(), 42);
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let keys = keys();
        let refresh = keys.refresh_token(7).unwrap();
        assert!(keys.verify(&refresh, TokenKind::Access).is_err());
        let access = keys.access_token(7).unwrap();
        assert!(keys.verify(&access, TokenKind::Refresh).is_err());
    }

    #[test]
    fn tampered_or_foreign_tokens_are_rejected() {
        let keys = keys();
        let token = keys.access_token(1).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged_claims = URL_SAFE_NO_PAD.encode(br#"{"sub":2,"kind":"access","exp":9999999999}"#);
        let forged = format!("{forged_claims}.{signature}");
        assert!(keys.verify(&forged, TokenKind::Access).is_err());

        let other = TokenKeys::new("other-secret", 300, 86_400);
        assert!(other.verify(&token, TokenKind::Access).is_err());
        assert!(keys.verify("garbage", TokenKind::Access).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let keys = TokenKeys::new("test-secret", -1, -1);
        let token = keys.access_token(1).unwrap();
        assert!(keys.verify(&token, TokenKind::Access).is_err());
    }
}
