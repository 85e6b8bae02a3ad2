use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use warbler_db::DbError;
use warbler_db::messages::DEFAULT_TIMELINE_LIMIT;
use warbler_types::api::{Claims, LikeResponse, NewMessageRequest};
use warbler_types::models::Message;

use crate::error::ApiError;
use crate::state::{AppState, run_db};
use crate::validation;

/// Newest messages from the caller and everyone they follow.
pub async fn home_timeline(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, move |db| {
        db.home_timeline(claims.sub, DEFAULT_TIMELINE_LIMIT)
    })
    .await?;
    Ok(Json(rows.into_iter().map(Message::from).collect::<Vec<_>>()))
}

pub async fn create_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<NewMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::message(&req)?;

    let row = run_db(&state, move |db| db.create_message(claims.sub, &req.text)).await?;
    Ok((StatusCode::CREATED, Json(Message::from(row))))
}

pub async fn show_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let row = run_db(&state, move |db| {
        db.get_message(message_id)?.ok_or(DbError::NotFound("message"))
    })
    .await?;
    Ok(Json(Message::from(row)))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(message_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    run_db(&state, move |db| db.delete_message(message_id, claims.sub)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(message_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let liked = run_db(&state, move |db| db.toggle_like(claims.sub, message_id)).await?;
    Ok(Json(LikeResponse { liked }))
}
