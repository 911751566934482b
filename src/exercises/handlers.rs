use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AuthError,
    exercises::{repo_types::Exercise, services::list_for},
    state::AppState,
};

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me/:muscle", get(list_my_exercises))
        .route("/exercicios/:id", delete(delete_my_exercise))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_my_exercises(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(muscle): Path<String>,
) -> Result<Json<Vec<Exercise>>, AuthError> {
    let rows = list_for(state.exercises.as_ref(), user.id, &muscle).await?;
    Ok(Json(rows))
}

/// Ids that do not parse, do not exist, or belong to someone else all get the same 400.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_my_exercise(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AuthError> {
    let Ok(id) = Uuid::parse_str(&id) else {
        warn!(%id, "malformed exercise id");
        return Err(AuthError::UnknownExercise);
    };
    if !state.exercises.delete(user.id, id).await? {
        warn!(exercise_id = %id, "exercise not found for user");
        return Err(AuthError::UnknownExercise);
    }
    info!(exercise_id = %id, "exercise deleted");
    Ok(StatusCode::NO_CONTENT)
}
