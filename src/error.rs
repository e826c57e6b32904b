use axum::{
    extract::rejection::{FormRejection, JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Malformed or missing input
    #[error("{0}")]
    InvalidArgument(String),

    /// Missing, invalid or expired credentials
    #[error("{0}")]
    Unauthenticated(String),

    /// Valid identity without ownership of the resource
    #[error("{0}")]
    Forbidden(String),

    /// Entity absent, or not visible to the requester
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness or state-transition violation
    #[error("{0}")]
    Conflict(String),

    #[error("Failed to {operation}")]
    Internal { operation: String },

    #[error(transparent)]
    Database(#[from] DbErr),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Internal { .. } | Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a unique-constraint violation to `Conflict` with the given message; any other store
    /// error is passed through unchanged.
    pub fn conflict_on_unique(err: DbErr, message: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Error::Conflict(message.into()),
            _ => Error::Database(err),
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidArgument(rejection.body_text())
    }
}

impl From<FormRejection> for Error {
    fn from(rejection: FormRejection) -> Self {
        Error::InvalidArgument(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::InvalidArgument(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Internal { .. } | Error::Database(_) => {
                tracing::error!("Internal service error: {}", self);
            }
            Error::Conflict(_) => tracing::warn!("Conflict error: {}", self),
            Error::Unauthenticated(_) | Error::Forbidden(_) => {
                tracing::info!("Authorization error: {}", self)
            }
            Error::InvalidArgument(_) | Error::NotFound(_) => {
                tracing::debug!("Client error: {}", self)
            }
        }

        tracing::Span::current().record("error", tracing::field::display(&self));

        let status = self.status_code();
        let body = match &self {
            Error::Internal { .. } => json!({
                "success": false,
                "message": "Internal server error",
                "error": self.to_string(),
            }),
            Error::Database(e) => json!({
                "success": false,
                "message": "Database error occurred",
                "error": e.to_string(),
            }),
            other => json!({ "success": false, "message": other.to_string() }),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_http_statuses() {
        assert_eq!(Error::InvalidArgument("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::Unauthenticated("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(Error::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            Error::Internal { operation: "x".into() }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::Database(DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn non_unique_store_errors_stay_internal() {
        let err = Error::conflict_on_unique(DbErr::Custom("boom".into()), "taken");
        assert!(matches!(err, Error::Database(_)));
    }

    #[tokio::test]
    async fn error_body_carries_success_flag_and_message() {
        let response = Error::NotFound("Paddock not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Paddock not found");
    }

    #[test]
    fn unauthenticated_response_advertises_bearer_scheme() {
        let response = Error::Unauthenticated("Could not validate credentials".into()).into_response();
        assert_eq!(
            response.headers().get(axum::http::header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
