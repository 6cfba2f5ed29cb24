use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use deployment::Deployment;
use services::services::list_cache::CacheStats;
use utils::response::ApiResponse;

use crate::DeploymentImpl;

/// GET /api/cache/stats
pub async fn get_cache_stats(
    State(deployment): State<DeploymentImpl>,
) -> ResponseJson<ApiResponse<Vec<CacheStats>>> {
    ResponseJson(ApiResponse::success(deployment.list_caches().stats().await))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/cache/stats", get(get_cache_stats))
}
