use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{auth::AuthError, status_lookup::UnknownStatusCode};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("authentication required")]
    Unauthorized,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Dữ liệu JSON không hợp lệ: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Tham số truy vấn không hợp lệ: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(format!("Đường dẫn không hợp lệ: {}", rejection.body_text()))
    }
}

impl From<UnknownStatusCode> for ApiError {
    fn from(err: UnknownStatusCode) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Cần đăng nhập".to_string()),
            ApiError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "Sai tên đăng nhập hoặc mật khẩu".to_string(),
            ),
            ApiError::Auth(AuthError::InvalidSession) => (
                StatusCode::UNAUTHORIZED,
                "Phiên đăng nhập không hợp lệ hoặc đã hết hạn".to_string(),
            ),
            ApiError::Database(_) | ApiError::Auth(_) => {
                error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Đã xảy ra lỗi máy chủ".to_string(),
                )
            }
        };

        let response = ApiResponse::<()>::error(&message);
        (status_code, Json(response)).into_response()
    }
}
