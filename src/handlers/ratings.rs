use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::rating::Rating;
use crate::AppState;

pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<StatusCode> {
    state.journal.create(&auth_user.username).await?;
    Ok(StatusCode::CREATED)
}

pub async fn submit_rating(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<Rating>, JsonRejection>,
) -> AppResult<StatusCode> {
    let username = auth_user.username.as_str();

    // An unknown user is reported before anything is said about the body.
    let record = state.journal.fetch(username).await?;

    let Json(rating) = payload.map_err(|rejection| {
        let reason = rejection.body_text();
        tracing::warn!(username, error = %reason, "Unable to decode rating");
        AppError::BadRequest(reason)
    })?;

    if let Err(e) = rating.validate() {
        tracing::warn!(username, feeling = %rating.feeling, "Rating is not valid");
        return Err(e);
    }

    let summary = format!("{} {}", rating.date, rating.feeling);
    state.journal.append(record, rating).await?;

    tracing::info!(username, rating = %summary, "Received rating");
    Ok(StatusCode::ACCEPTED)
}

pub async fn list_ratings(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Rating>>> {
    let record = state.journal.fetch(&auth_user.username).await?;
    tracing::debug!(
        username = %auth_user.username,
        count = record.ratings.len(),
        "Returning ratings"
    );
    Ok(Json(record.ratings))
}

pub async fn list_tags(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<String>>> {
    let record = state.journal.fetch(&auth_user.username).await?;
    tracing::debug!(
        username = %auth_user.username,
        count = record.tags.len(),
        "Returning tags"
    );
    Ok(Json(record.tags))
}
