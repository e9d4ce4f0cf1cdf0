use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::response::{ApiError, ApiResponse};

/// Failures raised by the repository layer.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,

    #[error("duplicate value for {0}")]
    Duplicate(&'static str),

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl RepoError {
    /// Wraps a sqlx error with the operation that produced it.
    pub fn storage(context: &'static str) -> impl FnOnce(sqlx::Error) -> RepoError {
        move |source| RepoError::Storage { context, source }
    }
}

/// Domain errors returned by services. Handlers turn these into the error
/// envelope; nothing below the handler layer picks a status code.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("The provided email or password is invalid")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed on this route")]
    MethodNotAllowed,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "invalid_request_data",
            AppError::Unauthorized(_) => "unauthorized_request",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::NotFound(_) => "resource_not_found",
            AppError::MethodNotAllowed => "method_not_allowed",
            AppError::Conflict(_) => "user_already_exist",
            AppError::Internal(_) => "internal_server_error",
        }
    }

    // Client-facing message. Internal and auth failures get a fixed text so
    // nothing about the failure leaks unless details are enabled.
    fn public_message(&self) -> String {
        match self {
            AppError::Unauthorized(_) => {
                "Your request is unauthorized, please login to continue".to_string()
            }
            AppError::Internal(_) => {
                "Something went wrong on our end. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        ApiError {
            code: self.code().to_string(),
            message: self.public_message(),
            details: None,
            request_id: None,
        }
    }
}

/// Attached to every error response so the envelope middleware can re-render
/// it with the request id and, in debug mode, the full error text.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub error: ApiError,
    pub details: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed with an internal error");
        }

        let error = self.to_api_error();
        let mut response = (status, Json(ApiResponse::<()>::failure(error.clone()))).into_response();
        response.extensions_mut().insert(ErrorReport {
            error,
            details: self.to_string(),
        });
        response
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("The requested resource was not found".into()),
            RepoError::Duplicate(field) => AppError::Conflict(format!("{field} already exists")),
            RepoError::Storage { .. } => AppError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}
