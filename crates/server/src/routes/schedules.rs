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
    pet::Pet,
    schedule::{ExamStatus, Schedule, ScheduleData, ScheduleWithPet},
};
use deployment::Deployment;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use ts_rs::TS;
use utils::{
    date::{days_between, follow_up_from, parse_date_input, parse_day_count},
    pagination::{ListQuery, PageRequest},
    response::ApiResponse,
};

use super::{optional_text, parse_code, parse_filter, required_text};
use crate::{DeploymentImpl, error::ApiError, middleware::load_schedule_middleware};

const INVALID_EXAM_STATUS: &str = "Trạng thái không hợp lệ";

#[derive(Debug, Deserialize)]
pub struct ScheduleListQuery {
    #[serde(flatten)]
    pub list: ListQuery,
    #[serde(rename = "trangThai")]
    pub status: Option<String>,
}

/// Body of schedule create/update requests. `soNgay` may be a number or a
/// numeric string.
#[derive(Debug, Default, Deserialize, TS)]
pub struct SchedulePayload {
    #[serde(rename = "ngayKham")]
    pub exam_date: Option<String>,
    #[serde(rename = "ngayTaiKham")]
    pub follow_up_date: Option<String>,
    #[serde(rename = "soNgay")]
    #[ts(type = "number | string | null")]
    pub days: Option<Value>,
    #[serde(rename = "trangThai")]
    pub status: Option<String>,
    #[serde(rename = "ghiChu")]
    pub note: Option<String>,
}

impl SchedulePayload {
    /// Creation: only `ngayKham` is required, status defaults to scheduled.
    pub fn into_create(self) -> Result<ScheduleData, ApiError> {
        let status = match optional_text(self.status.clone()) {
            Some(code) => parse_code(&code, INVALID_EXAM_STATUS)?,
            None => ExamStatus::default(),
        };
        self.into_data(status)
    }

    /// Update: `ngayKham`, `soNgay` and `trangThai` are all required.
    pub fn into_update(self) -> Result<ScheduleData, ApiError> {
        if day_count(self.days.as_ref())?.is_none() {
            return Err(ApiError::BadRequest("Số ngày là bắt buộc".to_string()));
        }
        let status = required_text(self.status.clone(), "Trạng thái là bắt buộc")?;
        let status = parse_code(&status, INVALID_EXAM_STATUS)?;
        self.into_data(status)
    }

    fn into_data(self, status: ExamStatus) -> Result<ScheduleData, ApiError> {
        let exam_raw = required_text(self.exam_date, "Ngày khám là bắt buộc")?;
        let exam_date = parse_date_input(&exam_raw)
            .ok_or_else(|| ApiError::BadRequest("Ngày khám không hợp lệ".to_string()))?;
        let follow_up_date = optional_text(self.follow_up_date)
            .map(|raw| {
                parse_date_input(&raw)
                    .ok_or_else(|| ApiError::BadRequest("Ngày tái khám không hợp lệ".to_string()))
            })
            .transpose()?;
        let days = day_count(self.days.as_ref())?;

        let (follow_up_date, days) = reconcile(exam_date, follow_up_date, days)?;

        Ok(ScheduleData {
            exam_date,
            follow_up_date,
            days,
            status,
            note: optional_text(self.note),
        })
    }
}

/// `soNgay` as a non-negative whole number; `null` and blank count as absent.
fn day_count(value: Option<&Value>) -> Result<Option<i64>, ApiError> {
    let invalid = || ApiError::BadRequest("Số ngày không hợp lệ".to_string());
    let days = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(invalid)?,
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => parse_day_count(s).ok_or_else(invalid)?,
        Some(_) => return Err(invalid()),
    };
    if days < 0 {
        return Err(invalid());
    }
    Ok(Some(days))
}

/// Fill in whichever of follow-up date and day offset is missing, then check
/// that any follow-up falls strictly after the exam.
///
/// A zero day offset with no explicit date means no follow-up.
fn reconcile(
    exam_date: NaiveDateTime,
    follow_up_date: Option<NaiveDateTime>,
    days: Option<i64>,
) -> Result<(Option<NaiveDateTime>, i64), ApiError> {
    let out_of_order =
        || ApiError::BadRequest("Ngày tái khám phải sau ngày khám".to_string());

    let (follow_up_date, days) = match (follow_up_date, days) {
        (Some(date), Some(days)) => (Some(date), days),
        (Some(date), None) => (Some(date), days_between(exam_date, date).ok_or_else(out_of_order)?),
        (None, Some(0)) | (None, None) => (None, 0),
        (None, Some(days)) => (
            Some(
                follow_up_from(exam_date, days)
                    .ok_or_else(|| ApiError::BadRequest("Số ngày không hợp lệ".to_string()))?,
            ),
            days,
        ),
    };

    if matches!(follow_up_date, Some(date) if date <= exam_date) {
        return Err(out_of_order());
    }

    Ok((follow_up_date, days))
}

async fn list_schedules(
    deployment: &DeploymentImpl,
    query: ScheduleListQuery,
    pet_code: Option<&str>,
) -> Result<ResponseJson<ApiResponse<Vec<ScheduleWithPet>>>, ApiError> {
    let request = PageRequest::from_query(&query.list);
    let status: Option<ExamStatus> = parse_filter(query.status.as_deref(), INVALID_EXAM_STATUS)?;
    let key = format!(
        "{}&maHoSo={}&trangThai={}",
        request.cache_key(),
        pet_code.unwrap_or_default(),
        status.map(|s| s.to_string()).unwrap_or_default(),
    );

    let pool = &deployment.db().pool;
    let page = deployment
        .list_caches()
        .schedules()
        .get_or_load(key, || Schedule::list(pool, &request, pet_code, status))
        .await?;

    Ok(ResponseJson(ApiResponse::paginated(page.items, page.pagination)))
}

pub async fn get_schedules(
    State(deployment): State<DeploymentImpl>,
    query: Result<Query<ScheduleListQuery>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<ScheduleWithPet>>>, ApiError> {
    let Query(query) = query?;
    list_schedules(&deployment, query, None).await
}

pub async fn get_pet_schedules(
    Extension(pet): Extension<Pet>,
    State(deployment): State<DeploymentImpl>,
    query: Result<Query<ScheduleListQuery>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<ScheduleWithPet>>>, ApiError> {
    let Query(query) = query?;
    list_schedules(&deployment, query, Some(pet.code.as_str())).await
}

/// Records an examination and copies its dates onto the pet.
pub async fn create_schedule(
    Extension(pet): Extension<Pet>,
    State(deployment): State<DeploymentImpl>,
    payload: Result<Json<SchedulePayload>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Schedule>>, ApiError> {
    let Json(payload) = payload?;
    let data = payload.into_create()?;
    let pool = &deployment.db().pool;

    let schedule = Schedule::create(pool, &pet.code, &data).await?;
    Pet::update_exam_dates(pool, &pet.code, schedule.exam_date, schedule.follow_up_date).await?;
    deployment.list_caches().invalidate_all();
    info!(
        id = schedule.id,
        pet = %pet.code,
        days = schedule.days,
        "Created schedule"
    );

    Ok(ResponseJson(ApiResponse::success_with_message(
        schedule,
        "Tạo lịch theo dõi thành công",
    )))
}

pub async fn get_schedule(
    Extension(schedule): Extension<Schedule>,
) -> Result<ResponseJson<ApiResponse<Schedule>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(schedule)))
}

pub async fn update_schedule(
    Extension(schedule): Extension<Schedule>,
    State(deployment): State<DeploymentImpl>,
    payload: Result<Json<SchedulePayload>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Schedule>>, ApiError> {
    let Json(payload) = payload?;
    let data = payload.into_update()?;

    let updated = Schedule::update(&deployment.db().pool, schedule.id, &data).await?;
    deployment.list_caches().invalidate_all();

    Ok(ResponseJson(ApiResponse::success_with_message(
        updated,
        "Cập nhật lịch khám thành công",
    )))
}

pub async fn delete_schedule(
    Extension(schedule): Extension<Schedule>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Schedule::delete(&deployment.db().pool, schedule.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Không tìm thấy lịch khám".to_string()));
    }
    deployment.list_caches().invalidate_all();
    info!(id = schedule.id, "Deleted schedule");

    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Xóa lịch khám thành công",
    )))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let schedule_id_router = Router::new()
        .route(
            "/",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
        .layer(from_fn_with_state(
            deployment.clone(),
            load_schedule_middleware,
        ));

    let schedules_router = Router::new()
        .route("/", get(get_schedules))
        .nest("/{id}", schedule_id_router);

    Router::new().nest("/lich-kham", schedules_router)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(body: Value) -> SchedulePayload {
        serde_json::from_value(body).unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        parse_date_input(s).unwrap()
    }

    #[test]
    fn days_derive_follow_up_date() {
        let data = payload(json!({ "ngayKham": "2025-03-01T09:00", "soNgay": "7" }))
            .into_create()
            .unwrap();
        assert_eq!(data.follow_up_date, Some(dt("2025-03-08T09:00")));
        assert_eq!(data.days, 7);
        assert_eq!(data.status, ExamStatus::DaLenLich);
    }

    #[test]
    fn follow_up_date_derives_days() {
        let data = payload(json!({
            "ngayKham": "2025-03-01T09:00",
            "ngayTaiKham": "2025-03-04T10:00",
            "trangThai": "can_tai_kham",
        }))
        .into_create()
        .unwrap();
        assert_eq!(data.days, 4);
        assert_eq!(data.status, ExamStatus::CanTaiKham);
    }

    #[test]
    fn neither_means_no_follow_up() {
        let data = payload(json!({ "ngayKham": "2025-03-01", "ghiChu": "  " }))
            .into_create()
            .unwrap();
        assert_eq!((data.follow_up_date, data.days), (None, 0));
        assert_eq!(data.note, None);
    }

    #[test]
    fn follow_up_must_be_after_exam() {
        let err = payload(json!({
            "ngayKham": "2025-03-05",
            "ngayTaiKham": "2025-03-01",
        }))
        .into_create()
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg == "Ngày tái khám phải sau ngày khám"));

        let same_day = payload(json!({
            "ngayKham": "2025-03-05T08:00",
            "ngayTaiKham": "2025-03-05T08:00",
            "soNgay": 0,
        }))
        .into_create();
        assert!(same_day.is_err());
    }

    #[test]
    fn rejects_bad_inputs_with_field_messages() {
        let cases = [
            (json!({}), "Ngày khám là bắt buộc"),
            (json!({ "ngayKham": "tomorrow" }), "Ngày khám không hợp lệ"),
            (json!({ "ngayKham": "2025-03-01", "soNgay": "abc" }), "Số ngày không hợp lệ"),
            (json!({ "ngayKham": "2025-03-01", "soNgay": -2 }), "Số ngày không hợp lệ"),
            (json!({ "ngayKham": "2025-03-01", "trangThai": "done" }), "Trạng thái không hợp lệ"),
        ];
        for (body, expected) in cases {
            match payload(body).into_create() {
                Err(ApiError::BadRequest(msg)) => assert_eq!(msg, expected),
                other => panic!("expected {expected:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn update_requires_days_and_status() {
        let missing_days = payload(json!({ "ngayKham": "2025-03-01", "trangThai": "da_kham" }))
            .into_update()
            .unwrap_err();
        assert!(matches!(missing_days, ApiError::BadRequest(msg) if msg == "Số ngày là bắt buộc"));

        let missing_status = payload(json!({ "ngayKham": "2025-03-01", "soNgay": 3 }))
            .into_update()
            .unwrap_err();
        assert!(matches!(missing_status, ApiError::BadRequest(msg) if msg == "Trạng thái là bắt buộc"));

        let data = payload(json!({ "ngayKham": "2025-03-01", "soNgay": 3, "trangThai": "da_kham" }))
            .into_update()
            .unwrap();
        assert_eq!(data.follow_up_date, Some(dt("2025-03-04")));
    }
}
