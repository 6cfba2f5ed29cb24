use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use ts_rs::TS;
use utils::pagination::{Page, PageRequest};

use super::{address::Address, generate_code, pet::Pet, push_list_filters, push_page, search_text};

/// A clinic client. Owns zero or more pets.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Customer {
    #[serde(rename = "maKhachHang")]
    pub code: String,
    #[serde(rename = "tenKhachHang")]
    pub name: String,
    #[serde(rename = "soDienThoai")]
    pub phone: String,
    #[serde(rename = "maXa")]
    pub address_code: String,
    #[serde(rename = "ngayTao")]
    pub created_at: DateTime<Utc>,
}

/// List row: the customer with its address name and number of pets.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CustomerSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    #[ts(flatten)]
    pub customer: Customer,
    #[serde(rename = "tenXa")]
    pub address_name: Option<String>,
    #[serde(rename = "petCount")]
    pub pet_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CustomerDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub customer: Customer,
    #[serde(rename = "xa")]
    pub address: Option<Address>,
    #[serde(rename = "hoSoThus")]
    pub pets: Vec<Pet>,
}

#[derive(Debug, Clone)]
pub struct CreateCustomer {
    pub name: String,
    pub phone: String,
    pub address_code: String,
}

pub type UpdateCustomer = CreateCustomer;

const COLUMNS: &str = "code, name, phone, address_code, created_at";

const SELECT_SUMMARY: &str = r#"SELECT
    c.code,
    c.name,
    c.phone,
    c.address_code,
    c.created_at,
    a.name AS address_name,
    (SELECT COUNT(*) FROM pets p WHERE p.customer_code = c.code) AS pet_count
FROM customers c
LEFT JOIN addresses a ON a.code = c.address_code"#;

impl Customer {
    pub async fn create(pool: &SqlitePool, data: &CreateCustomer) -> Result<Self, sqlx::Error> {
        let code = generate_code("KH");
        sqlx::query_as::<_, Customer>(&format!(
            r#"INSERT INTO customers (code, name, phone, address_code, search_text)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {COLUMNS}"#
        ))
        .bind(&code)
        .bind(&data.name)
        .bind(&data.phone)
        .bind(&data.address_code)
        .bind(search_text(&[&data.name, &data.phone, &code]))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(&format!("SELECT {COLUMNS} FROM customers WHERE code = $1"))
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// The customer together with its address and pets.
    pub async fn find_detail(
        pool: &SqlitePool,
        code: &str,
    ) -> Result<Option<CustomerDetail>, sqlx::Error> {
        let Some(customer) = Self::find_by_code(pool, code).await? else {
            return Ok(None);
        };
        let (address, pets) = futures::try_join!(
            Address::find_by_code(pool, &customer.address_code),
            Pet::find_by_customer(pool, &customer.code),
        )?;
        Ok(Some(CustomerDetail {
            customer,
            address,
            pets,
        }))
    }

    pub async fn list(
        pool: &SqlitePool,
        request: &PageRequest,
    ) -> Result<Page<CustomerSummary>, sqlx::Error> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM customers c");
        push_list_filters(&mut count, request, "c.search_text", &[]);

        let mut rows = QueryBuilder::<Sqlite>::new(SELECT_SUMMARY);
        push_list_filters(&mut rows, request, "c.search_text", &[]);
        push_page(&mut rows, request, "c.created_at DESC, c.code ASC");

        let (total, items) = futures::try_join!(
            count.build_query_scalar::<i64>().fetch_one(pool),
            rows.build_query_as::<CustomerSummary>().fetch_all(pool),
        )?;

        Ok(Page::new(items, total, request))
    }

    pub async fn update(
        pool: &SqlitePool,
        code: &str,
        data: &UpdateCustomer,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Customer>(&format!(
            r#"UPDATE customers
               SET name = $2, phone = $3, address_code = $4, search_text = $5
               WHERE code = $1
               RETURNING {COLUMNS}"#
        ))
        .bind(code)
        .bind(&data.name)
        .bind(&data.phone)
        .bind(&data.address_code)
        .bind(search_text(&[&data.name, &data.phone, code]))
        .fetch_one(pool)
        .await
    }

    /// Hard delete. Pets and their schedules go with the customer.
    pub async fn delete(pool: &SqlitePool, code: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM customers WHERE code = $1")
            .bind(code)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
