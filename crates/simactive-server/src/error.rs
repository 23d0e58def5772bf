use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use simactive_shared::{ErrorKind, RepoError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for ServerError {
    fn from(err: RepoError) -> Self {
        match err.kind() {
            ErrorKind::Conflict => ServerError::Conflict(err.to_string()),
            ErrorKind::NotFound => ServerError::NotFound(err.to_string()),
            ErrorKind::Internal => {
                tracing::error!(entity = %err.entity(), error = %err, "request failed");
                ServerError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use simactive_shared::EntityKind;

    use super::*;

    #[test]
    fn repo_errors_map_to_status_codes() {
        let cases = [
            (RepoError::conflict(EntityKind::Sim, "number 19998887766"), StatusCode::CONFLICT),
            (RepoError::not_found(EntityKind::Sim, "id 4"), StatusCode::NOT_FOUND),
            (RepoError::internal(EntityKind::Sim, "disk I/O error"), StatusCode::INTERNAL_SERVER_ERROR),
            (
                RepoError::Inconsistent {
                    entity: EntityKind::Sim,
                    id: 4,
                    detail: "drift".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ServerError::from(err).into_response().status(), status);
        }
    }
}
