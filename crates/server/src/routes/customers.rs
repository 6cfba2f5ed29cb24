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
use db::models::{
    address::Address,
    customer::{CreateCustomer, Customer, CustomerDetail, CustomerSummary},
};
use deployment::Deployment;
use serde::Deserialize;
use tracing::info;
use ts_rs::TS;
use utils::{
    pagination::{ListQuery, PageRequest},
    response::ApiResponse,
};

use super::required_text;
use crate::{DeploymentImpl, error::ApiError, middleware::load_customer_middleware};

/// Body of POST/PUT `/api/khach-hang`.
#[derive(Debug, Deserialize, TS)]
pub struct CustomerPayload {
    #[serde(rename = "tenKhachHang")]
    pub name: Option<String>,
    #[serde(rename = "soDienThoai")]
    pub phone: Option<String>,
    #[serde(rename = "maXa")]
    pub address_code: Option<String>,
}

impl CustomerPayload {
    fn validate(self) -> Result<CreateCustomer, ApiError> {
        Ok(CreateCustomer {
            name: required_text(self.name, "Tên khách hàng là bắt buộc")?,
            phone: required_text(self.phone, "Số điện thoại là bắt buộc")?,
            address_code: required_text(self.address_code, "Mã xã là bắt buộc")?,
        })
    }
}

async fn ensure_address_exists(deployment: &DeploymentImpl, code: &str) -> Result<(), ApiError> {
    Address::find_by_code(&deployment.db().pool, code)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound(format!("Không tìm thấy xã {}", code)))
}

pub async fn get_customers(
    State(deployment): State<DeploymentImpl>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<CustomerSummary>>>, ApiError> {
    let Query(query) = query?;
    let request = PageRequest::from_query(&query);
    let pool = &deployment.db().pool;
    let page = deployment
        .list_caches()
        .customers()
        .get_or_load(request.cache_key(), || Customer::list(pool, &request))
        .await?;

    Ok(ResponseJson(ApiResponse::paginated(page.items, page.pagination)))
}

pub async fn create_customer(
    State(deployment): State<DeploymentImpl>,
    payload: Result<Json<CustomerPayload>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Customer>>, ApiError> {
    let Json(payload) = payload?;
    let data = payload.validate()?;
    ensure_address_exists(&deployment, &data.address_code).await?;

    let customer = Customer::create(&deployment.db().pool, &data).await?;
    deployment.list_caches().invalidate_all();
    info!(code = %customer.code, address = %customer.address_code, "Created customer");

    Ok(ResponseJson(ApiResponse::success_with_message(
        customer,
        "Tạo khách hàng thành công",
    )))
}

pub async fn get_customer(
    Extension(customer): Extension<Customer>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<CustomerDetail>>, ApiError> {
    let detail = Customer::find_detail(&deployment.db().pool, &customer.code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Không tìm thấy khách hàng".to_string()))?;

    Ok(ResponseJson(ApiResponse::success(detail)))
}

pub async fn update_customer(
    Extension(customer): Extension<Customer>,
    State(deployment): State<DeploymentImpl>,
    payload: Result<Json<CustomerPayload>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Customer>>, ApiError> {
    let Json(payload) = payload?;
    let data = payload.validate()?;
    if data.address_code != customer.address_code {
        ensure_address_exists(&deployment, &data.address_code).await?;
    }

    let updated = Customer::update(&deployment.db().pool, &customer.code, &data).await?;
    deployment.list_caches().invalidate_all();

    Ok(ResponseJson(ApiResponse::success_with_message(
        updated,
        "Cập nhật khách hàng thành công",
    )))
}

pub async fn delete_customer(
    Extension(customer): Extension<Customer>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Customer::delete(&deployment.db().pool, &customer.code).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Không tìm thấy khách hàng".to_string()));
    }
    deployment.list_caches().invalidate_all();
    info!(code = %customer.code, "Deleted customer and their pets");

    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Xóa khách hàng thành công",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let customer_code_router = Router::new()
        .route(
            "/",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .layer(from_fn_with_state(
            deployment.clone(),
            load_customer_middleware,
        ));

    let customers_router = Router::new()
        .route("/", get(get_customers).post(create_customer))
        .nest("/{code}", customer_code_router);

    Router::new().nest("/khach-hang", customers_router)
}
