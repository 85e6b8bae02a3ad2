use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::error;

use warbler_db::models::{NewUser, UserRow};
use warbler_types::api::{AuthResponse, Claims, LoginRequest, SignupRequest};

use crate::error::ApiError;
use crate::state::{AppState, run_db};
use crate::validation;

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::signup(&req)?;

    let user = run_db(&state, move |db| {
        db.signup(&NewUser {
            username: &req.username,
            email: &req.email,
            password: &req.password,
            image_url: req.image_url.as_deref(),
        })
    })
    .await?;

    let body = issue(&state, user)?;
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::login(&req)?;

    let user = run_db(&state, move |db| db.authenticate(&req.username, &req.password))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    Ok(Json(issue(&state, user)?))
}

fn issue(state: &AppState, user: UserRow) -> Result<AuthResponse, ApiError> {
    let token = create_token(state, user.id, &user.username).map_err(|e| {
        error!("Token signing failed: {}", e);
        ApiError::Internal
    })?;

    Ok(AuthResponse {
        user: user.into(),
        token,
    })
}

pub fn create_token(state: &AppState, user_id: i64, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + state.token_ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )?;

    Ok(token)
}
