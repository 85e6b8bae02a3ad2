use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use warbler_db::models::ProfileUpdate;
use warbler_db::{Database, DbError, password};
use warbler_types::api::{Claims, EditProfileRequest, FollowResponse, UserDetailResponse};
use warbler_types::models::{Message, User, UserSummary};

use crate::error::ApiError;
use crate::state::{AppState, run_db};
use crate::validation;

const PROFILE_MESSAGE_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let q = query.q.unwrap_or_default();
    let rows = run_db(&state, move |db| db.search_users(&q)).await?;
    Ok(Json(rows.into_iter().map(UserSummary::from).collect::<Vec<_>>()))
}

pub async fn show_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = run_db(&state, move |db| {
        let user = require_user(db, user_id)?;
        Ok(UserDetailResponse {
            user: user.into(),
            stats: db.user_stats(user_id)?,
            messages: db
                .user_messages(user_id, PROFILE_MESSAGE_LIMIT)?
                .into_iter()
                .map(Message::from)
                .collect(),
        })
    })
    .await?;

    Ok(Json(detail))
}

pub async fn show_following(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, move |db| {
        require_user(db, user_id)?;
        db.following(user_id)
    })
    .await?;
    Ok(Json(rows.into_iter().map(UserSummary::from).collect::<Vec<_>>()))
}

pub async fn show_followers(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, move |db| {
        require_user(db, user_id)?;
        db.followers(user_id)
    })
    .await?;
    Ok(Json(rows.into_iter().map(UserSummary::from).collect::<Vec<_>>()))
}

pub async fn show_likes(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, move |db| {
        require_user(db, user_id)?;
        db.liked_messages(user_id)
    })
    .await?;
    Ok(Json(rows.into_iter().map(Message::from).collect::<Vec<_>>()))
}

/// The body carries the current password; the edit only goes through if it
/// verifies. The password itself is never changed here.
pub async fn edit_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<EditProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::edit_profile(&req)?;

    let updated = run_db(&state, move |db| {
        let user = require_user(db, claims.sub)?;
        if !password::verify(&req.password, &user.password) {
            return Ok(None);
        }
        db.update_profile(
            user.id,
            &ProfileUpdate {
                username: &req.username,
                email: &req.email,
                image_url: req.image_url.as_deref(),
                header_image_url: req.header_image_url.as_deref(),
                bio: req.bio.as_deref(),
                location: req.location.as_deref(),
            },
        )
        .map(Some)
    })
    .await?
    .ok_or(ApiError::InvalidCredentials)?;

    Ok(Json(User::from(updated)))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    run_db(&state, move |db| db.delete_user(user_id)).await?;
    info!(user_id, "Account closed");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn follow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    run_db(&state, move |db| db.follow(claims.sub, user_id)).await?;
    Ok(Json(FollowResponse { following: true }))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    run_db(&state, move |db| db.unfollow(claims.sub, user_id)).await?;
    Ok(Json(FollowResponse { following: false }))
}

fn require_user(db: &Database, user_id: i64) -> warbler_db::Result<warbler_db::models::UserRow> {
    db.get_user(user_id)?.ok_or(DbError::NotFound("user"))
}
