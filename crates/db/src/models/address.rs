use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use ts_rs::TS;
use utils::pagination::{Page, PageRequest};

use super::{generate_code, push_list_filters, push_page, search_text};

/// Ward-level address ("xã") referenced by customers.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "maXa")]
    pub code: String,
    #[serde(rename = "tenXa")]
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AddressWithCustomerCount {
    #[serde(flatten)]
    #[sqlx(flatten)]
    #[ts(flatten)]
    pub address: Address,
    pub customer_count: i64,
}

#[derive(Debug, Clone)]
pub struct CreateAddress {
    pub name: String,
}

const SELECT_WITH_COUNT: &str = r#"SELECT
    a.code,
    a.name,
    a.created_at,
    a.updated_at,
    (SELECT COUNT(*) FROM customers c WHERE c.address_code = a.code) AS customer_count
FROM addresses a"#;

impl Address {
    pub async fn create(pool: &SqlitePool, data: &CreateAddress) -> Result<Self, sqlx::Error> {
        let code = generate_code("XA");
        sqlx::query_as::<_, Address>(
            r#"INSERT INTO addresses (code, name, search_text)
               VALUES ($1, $2, $3)
               RETURNING code, name, created_at, updated_at"#,
        )
        .bind(&code)
        .bind(&data.name)
        .bind(search_text(&[&data.name, &code]))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Address>(
            "SELECT code, name, created_at, updated_at FROM addresses WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_with_customer_count(
        pool: &SqlitePool,
        code: &str,
    ) -> Result<Option<AddressWithCustomerCount>, sqlx::Error> {
        sqlx::query_as::<_, AddressWithCustomerCount>(&format!(
            "{SELECT_WITH_COUNT} WHERE a.code = $1"
        ))
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    /// One page of addresses, searched over name and code, with the count and
    /// page queries issued concurrently.
    pub async fn list(
        pool: &SqlitePool,
        request: &PageRequest,
    ) -> Result<Page<AddressWithCustomerCount>, sqlx::Error> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM addresses a");
        push_list_filters(&mut count, request, "a.search_text", &[]);

        let mut rows = QueryBuilder::<Sqlite>::new(SELECT_WITH_COUNT);
        push_list_filters(&mut rows, request, "a.search_text", &[]);
        push_page(&mut rows, request, "a.name ASC, a.code ASC");

        let (total, items) = futures::try_join!(
            count.build_query_scalar::<i64>().fetch_one(pool),
            rows.build_query_as::<AddressWithCustomerCount>()
                .fetch_all(pool),
        )?;

        Ok(Page::new(items, total, request))
    }

    pub async fn update(pool: &SqlitePool, code: &str, name: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Address>(
            r#"UPDATE addresses
               SET name = $2, search_text = $3, updated_at = datetime('now', 'subsec')
               WHERE code = $1
               RETURNING code, name, created_at, updated_at"#,
        )
        .bind(code)
        .bind(name)
        .bind(search_text(&[name, code]))
        .fetch_one(pool)
        .await
    }

    pub async fn customer_count(pool: &SqlitePool, code: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers WHERE address_code = $1")
            .bind(code)
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &SqlitePool, code: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM addresses WHERE code = $1")
            .bind(code)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support;

    #[tokio::test]
    async fn create_generates_code_and_finds_it() {
        let db = test_support::db().await;
        let created = test_support::address(&db, "Phường 1").await;
        assert!(created.code.starts_with("XA"));

        let found = Address::find_by_code(&db.pool, &created.code)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "Phường 1");
    }

    #[tokio::test]
    async fn search_is_case_insensitive_for_vietnamese() {
        let db = test_support::db().await;
        test_support::address(&db, "Phường Bến Nghé").await;
        test_support::address(&db, "Xã Tân Phú").await;

        let page = Address::list(&db.pool, &PageRequest::new(Some("PHƯỜNG".into()), 1, 10))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].address.name, "Phường Bến Nghé");
        assert_eq!(page.pagination.total, 1);
    }

    #[tokio::test]
    async fn one_character_search_returns_everything() {
        let db = test_support::db().await;
        test_support::address(&db, "Phường 1").await;
        test_support::address(&db, "Xã 2").await;

        let unfiltered = Address::list(&db.pool, &PageRequest::default()).await.unwrap();
        let short = Address::list(&db.pool, &PageRequest::new(Some("P".into()), 1, 10))
            .await
            .unwrap();
        assert_eq!(unfiltered.pagination.total, 2);
        assert_eq!(short.pagination.total, 2);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let db = test_support::db().await;
        for i in 0..3 {
            test_support::address(&db, &format!("Phường {i}")).await;
        }

        let page = Address::list(&db.pool, &PageRequest::new(None, 5, 2))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn customer_count_tracks_references() {
        let db = test_support::db().await;
        let address = test_support::address(&db, "Phường 1").await;
        assert_eq!(Address::customer_count(&db.pool, &address.code).await.unwrap(), 0);

        test_support::customer(&db, "Nguyễn Văn A", &address.code).await;
        assert_eq!(Address::customer_count(&db.pool, &address.code).await.unwrap(), 1);

        let with_count = Address::find_with_customer_count(&db.pool, &address.code)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(with_count.customer_count, 1);
    }

    #[tokio::test]
    async fn referenced_address_is_protected_by_schema() {
        let db = test_support::db().await;
        let address = test_support::address(&db, "Phường 1").await;
        test_support::customer(&db, "Nguyễn Văn A", &address.code).await;

        assert!(Address::delete(&db.pool, &address.code).await.is_err());
        assert!(Address::find_by_code(&db.pool, &address.code).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_renames_and_refreshes_search() {
        let db = test_support::db().await;
        let address = test_support::address(&db, "Phường 1").await;

        Address::update(&db.pool, &address.code, "Phường Đa Kao").await.unwrap();
        let page = Address::list(&db.pool, &PageRequest::new(Some("đa kao".into()), 1, 10))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
    }
}
