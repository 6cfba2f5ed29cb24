use axum::{
    Extension, Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::address::{Address, AddressWithCustomerCount, CreateAddress};
use deployment::Deployment;
use serde::Deserialize;
use tracing::info;
use ts_rs::TS;
use utils::{
    pagination::{ListQuery, PageRequest},
    response::ApiResponse,
};

use super::required_text;
use crate::{DeploymentImpl, error::ApiError, middleware::load_address_middleware};

/// Body of POST/PUT `/api/xa`.
#[derive(Debug, Deserialize, TS)]
pub struct AddressPayload {
    #[serde(rename = "tenXa")]
    pub name: Option<String>,
}

impl AddressPayload {
    fn validate(self) -> Result<CreateAddress, ApiError> {
        Ok(CreateAddress {
            name: required_text(self.name, "Tên xã là bắt buộc")?,
        })
    }
}

pub async fn get_addresses(
    State(deployment): State<DeploymentImpl>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<AddressWithCustomerCount>>>, ApiError> {
    let Query(query) = query?;
    let request = PageRequest::from_query(&query);
    let pool = &deployment.db().pool;
    let page = deployment
        .list_caches()
        .addresses()
        .get_or_load(request.cache_key(), || Address::list(pool, &request))
        .await?;

    Ok(ResponseJson(ApiResponse::paginated(page.items, page.pagination)))
}

pub async fn create_address(
    State(deployment): State<DeploymentImpl>,
    payload: Result<Json<AddressPayload>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Address>>, ApiError> {
    let Json(payload) = payload?;
    let data = payload.validate()?;

    let address = Address::create(&deployment.db().pool, &data).await?;
    deployment.list_caches().invalidate_all();
    info!(code = %address.code, "Created address");

    Ok(ResponseJson(ApiResponse::success_with_message(
        address,
        "Tạo xã thành công",
    )))
}

pub async fn get_address(
    Extension(address): Extension<Address>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<AddressWithCustomerCount>>, ApiError> {
    let address = Address::find_with_customer_count(&deployment.db().pool, &address.code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Không tìm thấy xã".to_string()))?;

    Ok(ResponseJson(ApiResponse::success(address)))
}

pub async fn update_address(
    Extension(address): Extension<Address>,
    State(deployment): State<DeploymentImpl>,
    payload: Result<Json<AddressPayload>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Address>>, ApiError> {
    let Json(payload) = payload?;
    let data = payload.validate()?;

    let updated = Address::update(&deployment.db().pool, &address.code, &data.name).await?;
    deployment.list_caches().invalidate_all();

    Ok(ResponseJson(ApiResponse::success_with_message(
        updated,
        "Cập nhật xã thành công",
    )))
}

pub async fn delete_address(
    Extension(address): Extension<Address>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &deployment.db().pool;

    let customers = Address::customer_count(pool, &address.code).await?;
    if customers > 0 {
        return Err(ApiError::BadRequest(format!(
            "Không thể xóa xã đang có {} khách hàng",
            customers
        )));
    }

    let rows_affected = Address::delete(pool, &address.code).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Không tìm thấy xã".to_string()));
    }
    deployment.list_caches().invalidate_all();
    info!(code = %address.code, "Deleted address");

    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Xóa xã thành công",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let address_code_router = Router::new()
        .route(
            "/",
            get(get_address).put(update_address).delete(delete_address),
        )
        .layer(from_fn_with_state(
            deployment.clone(),
            load_address_middleware,
        ));

    let addresses_router = Router::new()
        .route("/", get(get_addresses).post(create_address))
        .nest("/{code}", address_code_router);

    Router::new().nest("/xa", addresses_router)
}
