use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::pagination::Pagination;

/// Envelope shared by every JSON endpoint.
///
/// Success responses carry `data` (plus an optional `message` and, for list
/// endpoints, `pagination`); failures carry `error` only.
#[derive(Debug, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
            error: None,
            pagination: None,
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        ApiResponse {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }

    pub fn paginated(data: T, pagination: Pagination) -> Self {
        ApiResponse {
            pagination: Some(pagination),
            ..Self::success(data)
        }
    }

    pub fn error(message: &str) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message: None,
            error: Some(message.to_string()),
            pagination: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::pagination::PageRequest;

    #[test]
    fn success_omits_error_fields() {
        let body = serde_json::to_value(ApiResponse::success_with_message(1, "ok")).unwrap();
        assert_eq!(body, json!({ "success": true, "data": 1, "message": "ok" }));
    }

    #[test]
    fn error_carries_only_error() {
        let body = serde_json::to_value(ApiResponse::<()>::error("boom")).unwrap();
        assert_eq!(body, json!({ "success": false, "error": "boom" }));
    }

    #[test]
    fn paginated_includes_summary() {
        let request = PageRequest::new(None, 2, 10);
        let body =
            serde_json::to_value(ApiResponse::paginated(vec![1, 2], Pagination::new(12, &request)))
                .unwrap();
        assert_eq!(
            body["pagination"],
            json!({ "total": 12, "page": 2, "limit": 10, "totalPages": 2 })
        );
    }
}
