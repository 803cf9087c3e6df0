//! Bearer-token session lookup

use super::handlers::AppError;
use super::AppState;
use crate::classifier::LlmClassifier;
use crate::ledger::LedgerBackend;
use crate::runtime::ChatSession;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The session named by the request's `Authorization: Bearer` header
pub struct AuthedSession {
    pub id: String,
    pub session: Arc<Mutex<ChatSession<LedgerBackend, LlmClassifier>>>,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthedSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized("Missing bearer token".to_string()))?;

        let id = bearer.token().to_string();
        let session = state
            .sessions
            .get(&id)
            .await
            .ok_or_else(|| AppError::Unauthorized("Unknown or expired session".to_string()))?;

        Ok(Self { id, session })
    }
}
