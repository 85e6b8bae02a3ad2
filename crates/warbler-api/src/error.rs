use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use warbler_db::DbError;
use warbler_types::api::ErrorResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Db(#[from] DbError),

    /// Request body failed validation.
    #[error("{message}")]
    BadRequest {
        message: String,
        field: Option<&'static str>,
    },

    /// Login or re-authentication failed. Deliberately says nothing about why.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error")]
    Internal,
}

impl ApiError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            field: Some(field),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, field) = match &self {
            ApiError::Db(DbError::UniqueViolation { field }) => (StatusCode::CONFLICT, Some(*field)),
            ApiError::Db(DbError::Invalid(_)) => (StatusCode::BAD_REQUEST, None),
            ApiError::Db(DbError::NotFound(_)) => (StatusCode::NOT_FOUND, None),
            ApiError::Db(DbError::Forbidden(_)) => (StatusCode::FORBIDDEN, None),
            ApiError::Db(e) => {
                error!("Store failure: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "internal error".into(),
                        field: None,
                    }),
                )
                    .into_response();
            }
            ApiError::BadRequest { field, .. } => (StatusCode::BAD_REQUEST, *field),
            ApiError::InvalidCredentials | ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, None)
            }
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            field: field.map(str::to_string),
        };
        (status, Json(body)).into_response()
    }
}
