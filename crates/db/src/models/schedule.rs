use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumIter, EnumString};
use ts_rs::TS;
use utils::pagination::{Page, PageRequest};

use super::{push_list_filters, push_page, search_text};

/// Lifecycle stage of an examination (`trangThai`).
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display, EnumIter,
    Default,
)]
#[sqlx(type_name = "exam_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExamStatus {
    /// Scheduled
    #[default]
    DaLenLich,
    /// Examined
    DaKham,
    /// Needs a follow-up visit
    CanTaiKham,
    /// Cancelled
    DaHuy,
}

/// An examination or follow-up visit ("lịch theo dõi") tied to a pet.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Schedule {
    pub id: i64,
    #[serde(rename = "maHoSo")]
    pub pet_code: String,
    #[serde(rename = "ngayKham")]
    pub exam_date: NaiveDateTime,
    #[serde(rename = "ngayTaiKham")]
    pub follow_up_date: Option<NaiveDateTime>,
    #[serde(rename = "soNgay")]
    pub days: i64,
    #[serde(rename = "trangThai")]
    pub status: ExamStatus,
    #[serde(rename = "ghiChu")]
    pub note: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ScheduleWithPet {
    #[serde(flatten)]
    #[sqlx(flatten)]
    #[ts(flatten)]
    pub schedule: Schedule,
    #[serde(rename = "tenThu")]
    pub pet_name: Option<String>,
}

/// A validated schedule write. The follow-up date and day offset have
/// already been reconciled by the caller.
#[derive(Debug, Clone)]
pub struct ScheduleData {
    pub exam_date: NaiveDateTime,
    pub follow_up_date: Option<NaiveDateTime>,
    pub days: i64,
    pub status: ExamStatus,
    pub note: Option<String>,
}

const COLUMNS: &str = "id, pet_code, exam_date, follow_up_date, days, status, note, created_at";

const SELECT_WITH_PET: &str = r#"SELECT
    s.id,
    s.pet_code,
    s.exam_date,
    s.follow_up_date,
    s.days,
    s.status,
    s.note,
    s.created_at,
    p.name AS pet_name
FROM schedules s
LEFT JOIN pets p ON p.code = s.pet_code"#;

fn schedule_search_text(pet_code: &str, note: Option<&str>) -> String {
    search_text(&[note.unwrap_or_default(), pet_code])
}

impl Schedule {
    pub async fn create(
        pool: &SqlitePool,
        pet_code: &str,
        data: &ScheduleData,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Schedule>(&format!(
            r#"INSERT INTO schedules (pet_code, exam_date, follow_up_date, days, status, note, search_text)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {COLUMNS}"#
        ))
        .bind(pet_code)
        .bind(data.exam_date)
        .bind(data.follow_up_date)
        .bind(data.days)
        .bind(data.status)
        .bind(&data.note)
        .bind(schedule_search_text(pet_code, data.note.as_deref()))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Schedule>(&format!("SELECT {COLUMNS} FROM schedules WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Schedules across all pets, or only `pet_code`'s when given.
    pub async fn list(
        pool: &SqlitePool,
        request: &PageRequest,
        pet_code: Option<&str>,
        status: Option<ExamStatus>,
    ) -> Result<Page<ScheduleWithPet>, sqlx::Error> {
        let filters = [
            ("s.pet_code", pet_code.map(str::to_string)),
            ("s.status", status.map(|s| s.to_string())),
        ];

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM schedules s");
        push_list_filters(&mut count, request, "s.search_text", &filters);

        let mut rows = QueryBuilder::<Sqlite>::new(SELECT_WITH_PET);
        push_list_filters(&mut rows, request, "s.search_text", &filters);
        push_page(&mut rows, request, "s.exam_date DESC, s.id DESC");

        let (total, items) = futures::try_join!(
            count.build_query_scalar::<i64>().fetch_one(pool),
            rows.build_query_as::<ScheduleWithPet>().fetch_all(pool),
        )?;

        Ok(Page::new(items, total, request))
    }

    pub async fn update(pool: &SqlitePool, id: i64, data: &ScheduleData) -> Result<Self, sqlx::Error> {
        let pet_code: String = sqlx::query_scalar("SELECT pet_code FROM schedules WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        sqlx::query_as::<_, Schedule>(&format!(
            r#"UPDATE schedules
               SET exam_date = $2, follow_up_date = $3, days = $4, status = $5, note = $6,
                   search_text = $7
               WHERE id = $1
               RETURNING {COLUMNS}"#
        ))
        .bind(id)
        .bind(data.exam_date)
        .bind(data.follow_up_date)
        .bind(data.days)
        .bind(data.status)
        .bind(&data.note)
        .bind(schedule_search_text(&pet_code, data.note.as_deref()))
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
