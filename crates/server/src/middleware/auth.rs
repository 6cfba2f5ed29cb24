use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use deployment::Deployment;
use tracing::debug;

use crate::{DeploymentImpl, error::ApiError};

/// The token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects unauthenticated requests when `REQUIRE_AUTH` is on; otherwise a
/// pass-through. Verified claims are attached to the request.
pub async fn require_session_middleware(
    State(deployment): State<DeploymentImpl>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !deployment.config().require_auth {
        return Ok(next.run(request).await);
    }

    let token = bearer_token(request.headers()).ok_or_else(|| {
        debug!(path = %request.uri().path(), "Missing bearer token");
        ApiError::Unauthorized
    })?;
    let claims = deployment.auth().verify(token)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
