use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::{auth::repo_types::User, error::AuthError, state::AppState};

/// Resolves `Authorization: Bearer <token>` to the stored user.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::Unauthorized("Missing Authorization header"))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(AuthError::Unauthorized("Invalid auth scheme"))?;

        let email = state.auth.tokens.resolve(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AuthError::Unauthorized("Invalid or expired token")
        })?;

        let user = state.auth.users.find_by_email(&email).await?.ok_or_else(|| {
            warn!(%email, "token subject has no user");
            AuthError::Unauthorized("User not found")
        })?;

        Ok(AuthUser(user))
    }
}
