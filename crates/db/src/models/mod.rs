pub mod address;
pub mod customer;
pub mod pet;
pub mod schedule;
pub mod user;

use sqlx::{QueryBuilder, Sqlite};
use utils::pagination::PageRequest;
use uuid::Uuid;

const SEARCH_SEPARATOR: &str = "\u{1f}";

/// Lowercased searchable fields for the `search_text` column.
pub(crate) fn search_text(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| f.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join(SEARCH_SEPARATOR)
}

/// `prefix` followed by eight uppercase hex characters, e.g. `XA1F9C03B2`.
pub(crate) fn generate_code(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, id[..8].to_uppercase())
}

/// Appends a WHERE clause combining the search term with exact-match filters.
///
/// `search_column` is the table's `search_text` column (qualified when the
/// query joins). Filters with a `None` value are skipped.
pub(crate) fn push_list_filters<'a>(
    builder: &mut QueryBuilder<'a, Sqlite>,
    request: &PageRequest,
    search_column: &str,
    filters: &[(&str, Option<String>)],
) {
    let mut has_clause = false;
    let mut next_clause = |builder: &mut QueryBuilder<'a, Sqlite>| {
        builder.push(if has_clause { " AND " } else { " WHERE " });
        has_clause = true;
    };

    if let Some(pattern) = request.like_pattern() {
        next_clause(builder);
        builder
            .push(search_column)
            .push(" LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\'");
    }

    for (column, value) in filters {
        if let Some(value) = value {
            next_clause(builder);
            builder.push(*column).push(" = ").push_bind(value.clone());
        }
    }
}

/// Appends `ORDER BY .. LIMIT .. OFFSET ..` for the requested page.
pub(crate) fn push_page<'a>(
    builder: &mut QueryBuilder<'a, Sqlite>,
    request: &PageRequest,
    order_by: &str,
) {
    builder
        .push(" ORDER BY ")
        .push(order_by)
        .push(" LIMIT ")
        .push_bind(request.limit())
        .push(" OFFSET ")
        .push_bind(request.offset());
}
