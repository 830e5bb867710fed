//! Placeholder bearer-token check.
//!
//! Tokens are `base64url(claims json)` followed by `.` and the hex SHA-256 of
//! `secret.payload`. This keeps per-user and per-role routing honest during
//! development; it is not a session or identity design.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::workflows::domain::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Hospital,
    User,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "hospital" => Some(Self::Hospital),
            "user" | "donor" => Some(Self::User),
            _ => None,
        }
    }
}

/// Identity attached to a verified request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: UserId(user_id.into()),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins and hospitals may add and edit stock lots.
    pub fn manages_stock(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Hospital)
    }

    /// Admins see everything; everyone else only their own records.
    pub fn may_access(&self, owner: &UserId) -> bool {
        self.is_admin() || &self.user_id == owner
    }
}

/// Issues and verifies placeholder tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Arc<str>,
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<str>) -> Self {
        Self {
            secret: Arc::from(secret.as_ref()),
        }
    }

    pub fn issue(&self, caller: &Caller) -> Result<String, serde_json::Error> {
        let claims = serde_json::to_vec(caller)?;
        let payload = URL_SAFE_NO_PAD.encode(claims);
        let signature = self.sign(&payload);
        Ok(format!("{payload}.{signature}"))
    }

    pub fn verify(&self, token: &str) -> Result<Caller, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        if self.sign(payload) != signature {
            return Err(AuthError::InvalidToken);
        }

        let claims = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::InvalidToken)?;
        serde_json::from_slice(&claims).map_err(|_| AuthError::InvalidToken)
    }

    fn sign(&self, payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b".");
        hasher.update(payload.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("access token required")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("token verification is not configured")]
    Unconfigured,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::FORBIDDEN,
            AuthError::Unconfigured => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Resolves the caller from `Authorization: Bearer <token>` using the
/// [`TokenSigner`] installed as a request extension.
#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split_whitespace().nth(1))
            .ok_or(AuthError::MissingToken)?;

        let signer = parts
            .extensions
            .get::<TokenSigner>()
            .ok_or(AuthError::Unconfigured)?;

        signer.verify(token)
    }
}
