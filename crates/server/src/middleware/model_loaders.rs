use axum::{
    extract::{Path, Request, State, rejection::PathRejection},
    middleware::Next,
    response::Response,
};
use db::models::{address::Address, customer::Customer, pet::Pet, schedule::Schedule};
use deployment::Deployment;
use tracing::warn;

use crate::{DeploymentImpl, error::ApiError};

pub async fn load_address_middleware(
    State(deployment): State<DeploymentImpl>,
    path: Result<Path<String>, PathRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Path(code) = path?;
    let address = Address::find_by_code(&deployment.db().pool, &code)
        .await?
        .ok_or_else(|| {
            warn!(code, "Address not found");
            ApiError::NotFound("Không tìm thấy xã".to_string())
        })?;

    request.extensions_mut().insert(address);
    Ok(next.run(request).await)
}

pub async fn load_customer_middleware(
    State(deployment): State<DeploymentImpl>,
    path: Result<Path<String>, PathRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Path(code) = path?;
    let customer = Customer::find_by_code(&deployment.db().pool, &code)
        .await?
        .ok_or_else(|| {
            warn!(code, "Customer not found");
            ApiError::NotFound("Không tìm thấy khách hàng".to_string())
        })?;

    request.extensions_mut().insert(customer);
    Ok(next.run(request).await)
}

pub async fn load_pet_middleware(
    State(deployment): State<DeploymentImpl>,
    path: Result<Path<String>, PathRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Path(code) = path?;
    let pet = Pet::find_by_code(&deployment.db().pool, &code)
        .await?
        .ok_or_else(|| {
            warn!(code, "Pet not found");
            ApiError::NotFound("Không tìm thấy hồ sơ thú".to_string())
        })?;

    request.extensions_mut().insert(pet);
    Ok(next.run(request).await)
}

/// Schedules are addressed by numeric id; anything else is a 400, not a 404.
pub async fn load_schedule_middleware(
    State(deployment): State<DeploymentImpl>,
    path: Result<Path<String>, PathRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Path(raw_id) = path?;
    let id: i64 = raw_id
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("ID lịch khám không hợp lệ".to_string()))?;

    let schedule = Schedule::find_by_id(&deployment.db().pool, id)
        .await?
        .ok_or_else(|| {
            warn!(id, "Schedule not found");
            ApiError::NotFound("Không tìm thấy lịch khám".to_string())
        })?;

    request.extensions_mut().insert(schedule);
    Ok(next.run(request).await)
}
