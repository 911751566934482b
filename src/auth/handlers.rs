use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{field, instrument, Span};

use crate::{
    auth::dto::{LoginRequest, LoginResponse, PublicUser, SignupRequest},
    error::AuthError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/verificacao/:code", post(verify))
        .route("/login", post(login))
}

#[instrument(skip(state, payload), fields(email = field::Empty))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>), AuthError> {
    let Json(payload) = payload?;
    Span::current().record("email", payload.email.as_str());
    let user = state.auth.signup(&payload.email, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, code))]
pub async fn verify(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<PublicUser>, AuthError> {
    let user = state.auth.verify(&code).await?;
    Ok(Json(user))
}

#[instrument(skip(state, payload), fields(email = field::Empty))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let Json(payload) = payload?;
    Span::current().record("email", payload.email.as_str());
    let res = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(res))
}
