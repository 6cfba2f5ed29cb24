use std::str::FromStr;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{DeploymentImpl, error::ApiError, middleware::require_session_middleware};

pub mod addresses;
pub mod auth;
pub mod cache;
pub mod customers;
pub mod health;
pub mod pets;
pub mod schedules;
pub mod status;

pub fn router(deployment: DeploymentImpl) -> Router {
    let records = Router::new()
        .merge(addresses::router(&deployment))
        .merge(customers::router(&deployment))
        .merge(pets::router(&deployment))
        .merge(schedules::router(&deployment))
        .merge(cache::router(&deployment))
        .layer(from_fn_with_state(
            deployment.clone(),
            require_session_middleware,
        ));

    let base_routes = Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::router(&deployment))
        .merge(status::router(&deployment))
        .merge(records);

    Router::new()
        .nest("/api", base_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(deployment)
}

/// A required, non-blank text field, trimmed.
pub(crate) fn required_text(value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(message.to_string()))
}

/// An optional text field; blank counts as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a stored enum code, rejecting unknown ones with `message`.
pub(crate) fn parse_code<T: FromStr>(value: &str, message: &str) -> Result<T, ApiError> {
    T::from_str(value.trim()).map_err(|_| ApiError::BadRequest(message.to_string()))
}

/// Optional enum filter from a query string; blank means no filter.
pub(crate) fn parse_filter<T: FromStr>(
    value: Option<&str>,
    message: &str,
) -> Result<Option<T>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_code(v, message).map(Some),
        None => Ok(None),
    }
}
