use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    response::Json as ResponseJson,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use services::services::auth::Session;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use super::required_text;
use crate::{DeploymentImpl, error::ApiError, middleware::bearer_token};

#[derive(Debug, Deserialize, TS)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: Uuid,
    pub username: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /api/auth/login
pub async fn login(
    State(deployment): State<DeploymentImpl>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Session>>, ApiError> {
    let Json(payload) = payload?;
    let username = required_text(payload.username, "Tên đăng nhập là bắt buộc")?;
    // passwords are compared verbatim
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Mật khẩu là bắt buộc".to_string()))?;

    let session = deployment
        .auth()
        .sign_in(&deployment.db().pool, &username, &password)
        .await?;

    Ok(ResponseJson(ApiResponse::success(session)))
}

/// GET /api/auth/session
pub async fn get_session(
    State(deployment): State<DeploymentImpl>,
    headers: HeaderMap,
) -> Result<ResponseJson<ApiResponse<SessionInfo>>, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    let claims = deployment.auth().verify(token)?;

    Ok(ResponseJson(ApiResponse::success(SessionInfo {
        user_id: claims.sub,
        username: claims.username,
        expires_at: DateTime::from_timestamp(claims.exp, 0),
    })))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/session", get(get_session))
}
