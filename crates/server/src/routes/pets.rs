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
use chrono::NaiveDateTime;
use db::models::{
    customer::Customer,
    pet::{CreatePet, HealthStatus, Pet, PetFilter, PetSummary, Species, UpdatePet},
};
use deployment::Deployment;
use serde::Deserialize;
use tracing::info;
use ts_rs::TS;
use utils::{
    date::parse_date_input,
    pagination::{ListQuery, PageRequest},
    response::ApiResponse,
};

use super::{optional_text, parse_code, parse_filter, required_text, schedules};
use crate::{DeploymentImpl, error::ApiError, middleware::load_pet_middleware};

const INVALID_SPECIES: &str = "Loài không hợp lệ";
const INVALID_HEALTH_STATUS: &str = "Tình trạng không hợp lệ";

#[derive(Debug, Deserialize)]
pub struct PetListQuery {
    #[serde(flatten)]
    pub list: ListQuery,
    #[serde(rename = "tinhTrang")]
    pub health_status: Option<String>,
    #[serde(rename = "loai")]
    pub species: Option<String>,
}

/// Body of POST/PUT `/api/ho-so-thu`.
///
/// The exam dates are only read on PUT; creation leaves them empty until the
/// first schedule is recorded.
#[derive(Debug, Deserialize, TS)]
pub struct PetPayload {
    #[serde(rename = "tenThu")]
    pub name: Option<String>,
    #[serde(rename = "loai")]
    pub species: Option<String>,
    #[serde(rename = "tinhTrang")]
    pub health_status: Option<String>,
    #[serde(rename = "maKhachHang")]
    pub customer_code: Option<String>,
    #[serde(rename = "ngayKhamCuoi")]
    pub last_exam_at: Option<String>,
    #[serde(rename = "ngayTaiKham")]
    pub next_follow_up_at: Option<String>,
}

struct ValidPet {
    name: String,
    species: Species,
    health_status: HealthStatus,
    customer_code: String,
}

impl PetPayload {
    fn validate(&mut self) -> Result<ValidPet, ApiError> {
        let name = required_text(self.name.take(), "Tên thú là bắt buộc")?;
        let species = required_text(self.species.take(), "Loài là bắt buộc")?;
        let health_status = match optional_text(self.health_status.take()) {
            Some(code) => parse_code(&code, INVALID_HEALTH_STATUS)?,
            None => HealthStatus::default(),
        };
        Ok(ValidPet {
            name,
            species: parse_code(&species, INVALID_SPECIES)?,
            health_status,
            customer_code: required_text(self.customer_code.take(), "Mã khách hàng là bắt buộc")?,
        })
    }
}

fn optional_date(
    value: Option<String>,
    message: &str,
) -> Result<Option<Option<NaiveDateTime>>, ApiError> {
    match optional_text(value) {
        Some(raw) => parse_date_input(&raw)
            .map(|date| Some(Some(date)))
            .ok_or_else(|| ApiError::BadRequest(message.to_string())),
        None => Ok(None),
    }
}

async fn ensure_customer_exists(deployment: &DeploymentImpl, code: &str) -> Result<(), ApiError> {
    Customer::find_by_code(&deployment.db().pool, code)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound(format!("Không tìm thấy khách hàng {}", code)))
}

pub async fn get_pets(
    State(deployment): State<DeploymentImpl>,
    query: Result<Query<PetListQuery>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<PetSummary>>>, ApiError> {
    let Query(query) = query?;
    let request = PageRequest::from_query(&query.list);
    let filter = PetFilter {
        health_status: parse_filter(query.health_status.as_deref(), INVALID_HEALTH_STATUS)?,
        species: parse_filter(query.species.as_deref(), INVALID_SPECIES)?,
    };
    let key = format!(
        "{}&tinhTrang={}&loai={}",
        request.cache_key(),
        filter.health_status.map(|s| s.to_string()).unwrap_or_default(),
        filter.species.map(|s| s.to_string()).unwrap_or_default(),
    );

    let pool = &deployment.db().pool;
    let page = deployment
        .list_caches()
        .pets()
        .get_or_load(key, || Pet::list(pool, &request, &filter))
        .await?;

    Ok(ResponseJson(ApiResponse::paginated(page.items, page.pagination)))
}

pub async fn create_pet(
    State(deployment): State<DeploymentImpl>,
    payload: Result<Json<PetPayload>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Pet>>, ApiError> {
    let Json(mut payload) = payload?;
    let pet = payload.validate()?;
    ensure_customer_exists(&deployment, &pet.customer_code).await?;

    let created = Pet::create(
        &deployment.db().pool,
        &CreatePet {
            name: pet.name,
            species: pet.species,
            health_status: pet.health_status,
            customer_code: pet.customer_code,
        },
    )
    .await?;
    deployment.list_caches().invalidate_all();
    info!(code = %created.code, customer = %created.customer_code, "Created pet");

    Ok(ResponseJson(ApiResponse::success_with_message(
        created,
        "Tạo hồ sơ thú thành công",
    )))
}

pub async fn get_pet(
    Extension(pet): Extension<Pet>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<PetSummary>>, ApiError> {
    let summary = Pet::find_summary(&deployment.db().pool, &pet.code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Không tìm thấy hồ sơ thú".to_string()))?;

    Ok(ResponseJson(ApiResponse::success(summary)))
}

/// Replaces the pet. Exam dates left out of the body keep their current
/// values since schedules maintain them.
pub async fn update_pet(
    Extension(existing): Extension<Pet>,
    State(deployment): State<DeploymentImpl>,
    payload: Result<Json<PetPayload>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Pet>>, ApiError> {
    let Json(mut payload) = payload?;
    let pet = payload.validate()?;
    let last_exam_at = optional_date(payload.last_exam_at.take(), "Ngày khám cuối không hợp lệ")?
        .unwrap_or(existing.last_exam_at);
    let next_follow_up_at =
        optional_date(payload.next_follow_up_at.take(), "Ngày tái khám không hợp lệ")?
            .unwrap_or(existing.next_follow_up_at);
    if pet.customer_code != existing.customer_code {
        ensure_customer_exists(&deployment, &pet.customer_code).await?;
    }

    let updated = Pet::update(
        &deployment.db().pool,
        &existing.code,
        &UpdatePet {
            name: pet.name,
            species: pet.species,
            health_status: pet.health_status,
            last_exam_at,
            next_follow_up_at,
            customer_code: pet.customer_code,
        },
    )
    .await?;
    deployment.list_caches().invalidate_all();

    Ok(ResponseJson(ApiResponse::success_with_message(
        updated,
        "Cập nhật hồ sơ thú thành công",
    )))
}

pub async fn delete_pet(
    Extension(pet): Extension<Pet>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Pet::delete(&deployment.db().pool, &pet.code).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Không tìm thấy hồ sơ thú".to_string()));
    }
    deployment.list_caches().invalidate_all();
    info!(code = %pet.code, "Deleted pet and its schedules");

    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Xóa hồ sơ thú thành công",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let pet_code_router = Router::new()
        .route("/", get(get_pet).put(update_pet).delete(delete_pet))
        .route(
            "/lich-theo-doi",
            get(schedules::get_pet_schedules).post(schedules::create_schedule),
        )
        .layer(from_fn_with_state(deployment.clone(), load_pet_middleware));

    let pets_router = Router::new()
        .route("/", get(get_pets).post(create_pet))
        .nest("/{code}", pet_code_router);

    Router::new().nest("/ho-so-thu", pets_router)
}
