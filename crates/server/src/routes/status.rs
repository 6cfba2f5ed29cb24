use std::str::FromStr;

use axum::{
    Router,
    extract::{Path, rejection::PathRejection},
    response::Json as ResponseJson,
    routing::get,
};
use services::services::status_lookup::{self, StatusDescriptor, StatusKind};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

fn parse_kind(kind: &str) -> Result<StatusKind, ApiError> {
    StatusKind::from_str(kind)
        .map_err(|_| ApiError::NotFound(format!("Không có danh mục {}", kind)))
}

/// GET /api/status/{kind}
pub async fn list_statuses(
    path: Result<Path<String>, PathRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<StatusDescriptor>>>, ApiError> {
    let Path(kind) = path?;
    let kind = parse_kind(&kind)?;
    Ok(ResponseJson(ApiResponse::success(status_lookup::all(kind))))
}

/// GET /api/status/{kind}/{code}
pub async fn describe_status(
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<ResponseJson<ApiResponse<StatusDescriptor>>, ApiError> {
    let Path((kind, code)) = path?;
    let kind = parse_kind(&kind)?;
    Ok(ResponseJson(ApiResponse::success(status_lookup::describe(
        kind, &code,
    )?)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/status/{kind}", get(list_statuses))
        .route("/status/{kind}/{code}", get(describe_status))
}
