// ============================================================================
// Axum Extractors
// ============================================================================
//
// - AuthenticatedUser: resolves the Bearer token to an active user (401 otherwise)
// - JsonBody: JSON body whose rejections answer in the AppError envelope
//
// ============================================================================

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use godo_error::AppError;

use crate::auth::{resolve_identity, Identity};
use crate::context::AppContext;
use crate::store::User;

/// Extractor for the authenticated caller
///
/// Usage:
/// ```rust,ignore
/// async fn handler(AuthenticatedUser(user): AuthenticatedUser, ...) -> Result<...> {
///     // user.id, user.public_name() ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppContext>> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match resolve_identity(&state.auth_manager, state.store.as_ref(), token).await? {
            Identity::User(user) => Ok(AuthenticatedUser(user)),
            Identity::Anonymous => Err(AppError::auth("Kimlik doğrulama gerekli.")),
        }
    }
}

/// `Json<T>` with malformed or mistyped bodies mapped to a 400 `AppError`
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected request body");
                Err(AppError::validation("Geçersiz istek gövdesi."))
            }
        }
    }
}
