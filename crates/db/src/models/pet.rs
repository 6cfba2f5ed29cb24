use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumIter, EnumString};
use ts_rs::TS;
use utils::pagination::{Page, PageRequest};

use super::{generate_code, push_list_filters, push_page, search_text};

/// Species category (`loai`).
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display, EnumIter,
)]
#[sqlx(type_name = "species", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Species {
    /// Dog
    Cho,
    /// Cat
    Meo,
    /// Bird
    Chim,
    /// Rabbit
    Tho,
    Khac,
}

/// Health status of a pet (`tinhTrang`).
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display, EnumIter,
    Default,
)]
#[sqlx(type_name = "health_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HealthStatus {
    /// Healthy
    #[default]
    KhoeManh,
    /// Under treatment
    DangDieuTri,
    /// Under observation
    TheoDoi,
    /// Critical
    NguyKich,
    /// Recovered
    DaKhoi,
}

/// A pet record ("hồ sơ thú").
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Pet {
    #[serde(rename = "maHoSo")]
    pub code: String,
    #[serde(rename = "tenThu")]
    pub name: String,
    #[serde(rename = "loai")]
    pub species: Species,
    #[serde(rename = "tinhTrang")]
    pub health_status: HealthStatus,
    #[serde(rename = "ngayKhamCuoi")]
    pub last_exam_at: Option<NaiveDateTime>,
    #[serde(rename = "ngayTaiKham")]
    pub next_follow_up_at: Option<NaiveDateTime>,
    #[serde(rename = "maKhachHang")]
    pub customer_code: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// List row: the pet with its owner's name.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct PetSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    #[ts(flatten)]
    pub pet: Pet,
    #[serde(rename = "tenKhachHang")]
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatePet {
    pub name: String,
    pub species: Species,
    pub health_status: HealthStatus,
    pub customer_code: String,
}

#[derive(Debug, Clone)]
pub struct UpdatePet {
    pub name: String,
    pub species: Species,
    pub health_status: HealthStatus,
    pub last_exam_at: Option<NaiveDateTime>,
    pub next_follow_up_at: Option<NaiveDateTime>,
    pub customer_code: String,
}

/// Exact-match filters accepted by [`Pet::list`].
#[derive(Debug, Clone, Default)]
pub struct PetFilter {
    pub health_status: Option<HealthStatus>,
    pub species: Option<Species>,
}

const COLUMNS: &str =
    "code, name, species, health_status, last_exam_at, next_follow_up_at, customer_code, created_at";

const SELECT_SUMMARY: &str = r#"SELECT
    p.code,
    p.name,
    p.species,
    p.health_status,
    p.last_exam_at,
    p.next_follow_up_at,
    p.customer_code,
    p.created_at,
    c.name AS customer_name
FROM pets p
LEFT JOIN customers c ON c.code = p.customer_code"#;

impl Pet {
    pub async fn create(pool: &SqlitePool, data: &CreatePet) -> Result<Self, sqlx::Error> {
        let code = generate_code("HS");
        sqlx::query_as::<_, Pet>(&format!(
            r#"INSERT INTO pets (code, name, species, health_status, customer_code, search_text)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {COLUMNS}"#
        ))
        .bind(&code)
        .bind(&data.name)
        .bind(data.species)
        .bind(data.health_status)
        .bind(&data.customer_code)
        .bind(search_text(&[&data.name, &code]))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Pet>(&format!("SELECT {COLUMNS} FROM pets WHERE code = $1"))
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_summary(
        pool: &SqlitePool,
        code: &str,
    ) -> Result<Option<PetSummary>, sqlx::Error> {
        sqlx::query_as::<_, PetSummary>(&format!("{SELECT_SUMMARY} WHERE p.code = $1"))
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_customer(
        pool: &SqlitePool,
        customer_code: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Pet>(&format!(
            "SELECT {COLUMNS} FROM pets WHERE customer_code = $1 ORDER BY created_at DESC"
        ))
        .bind(customer_code)
        .fetch_all(pool)
        .await
    }

    pub async fn list(
        pool: &SqlitePool,
        request: &PageRequest,
        filter: &PetFilter,
    ) -> Result<Page<PetSummary>, sqlx::Error> {
        let filters = [
            (
                "p.health_status",
                filter.health_status.map(|s| s.to_string()),
            ),
            ("p.species", filter.species.map(|s| s.to_string())),
        ];

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM pets p");
        push_list_filters(&mut count, request, "p.search_text", &filters);

        let mut rows = QueryBuilder::<Sqlite>::new(SELECT_SUMMARY);
        push_list_filters(&mut rows, request, "p.search_text", &filters);
        push_page(&mut rows, request, "p.created_at DESC, p.code ASC");

        let (total, items) = futures::try_join!(
            count.build_query_scalar::<i64>().fetch_one(pool),
            rows.build_query_as::<PetSummary>().fetch_all(pool),
        )?;

        Ok(Page::new(items, total, request))
    }

    pub async fn update(pool: &SqlitePool, code: &str, data: &UpdatePet) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Pet>(&format!(
            r#"UPDATE pets
               SET name = $2, species = $3, health_status = $4, last_exam_at = $5,
                   next_follow_up_at = $6, customer_code = $7, search_text = $8
               WHERE code = $1
               RETURNING {COLUMNS}"#
        ))
        .bind(code)
        .bind(&data.name)
        .bind(data.species)
        .bind(data.health_status)
        .bind(data.last_exam_at)
        .bind(data.next_follow_up_at)
        .bind(&data.customer_code)
        .bind(search_text(&[&data.name, code]))
        .fetch_one(pool)
        .await
    }

    /// Record the outcome of the latest examination on the pet itself.
    pub async fn update_exam_dates(
        pool: &SqlitePool,
        code: &str,
        last_exam_at: NaiveDateTime,
        next_follow_up_at: Option<NaiveDateTime>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE pets SET last_exam_at = $2, next_follow_up_at = $3 WHERE code = $1")
            .bind(code)
            .bind(last_exam_at)
            .bind(next_follow_up_at)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Hard delete. Schedules go with the pet.
    pub async fn delete(pool: &SqlitePool, code: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pets WHERE code = $1")
            .bind(code)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
