//! Admin API type definitions

use serde::Serialize;

use crate::store::{Customer, Region, StoreCredit};

// ============ Store Credits ============

/// Store credit as returned by the API, with requested relations attached
#[derive(Debug, Clone, Serialize)]
pub struct StoreCreditView {
    #[serde(flatten)]
    pub store_credit: StoreCredit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

/// Single store credit response
#[derive(Debug, Serialize)]
pub struct StoreCreditResponse {
    pub store_credit: StoreCreditView,
}

/// Paginated store credit list
#[derive(Debug, Serialize)]
pub struct StoreCreditListResponse {
    pub store_credits: Vec<StoreCreditView>,
    /// Total number of matching store credits
    pub count: usize,
    /// Number of store credits skipped
    pub offset: usize,
    /// Page size
    pub limit: usize,
}

/// Delete confirmation
#[derive(Debug, Serialize)]
pub struct StoreCreditDeleteResponse {
    pub id: String,
    pub object: &'static str,
    pub deleted: bool,
}

impl StoreCreditDeleteResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: "store_credit",
            deleted: true,
        }
    }
}

// ============ Customers ============

/// Store credit rollup for one customer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerStoreCreditSummary {
    pub customer: Option<Customer>,
    /// Region of the customer's earliest live store credit
    pub region: Option<Region>,
    /// Sum of original store credit values
    pub amount: i64,
    /// Sum of current balances
    pub balance: i64,
    pub store_credit_count: usize,
}

/// Paginated customer rollup list
#[derive(Debug, Serialize)]
pub struct CustomerListResponse {
    pub customers: Vec<CustomerStoreCreditSummary>,
    /// Number of distinct customers with live store credits
    pub count: usize,
    pub offset: usize,
    pub limit: usize,
}

// ============ Errors ============

/// Error envelope shared by every admin route
#[derive(Debug, Serialize)]
pub struct AdminErrorResponse {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: String,
}

impl AdminErrorResponse {
    pub fn new(
        error_type: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            error_type: error_type.into(),
            code: code.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::new("invalid_data", "invalid_request_error", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", "invalid_request_error", message)
    }

    pub fn not_allowed(message: impl Into<String>) -> Self {
        Self::new("not_allowed", "invalid_state_error", message)
    }

    pub fn method_not_allowed() -> Self {
        Self::new("not_allowed", "invalid_request_error", "Method not allowed")
    }

    pub fn unauthorized() -> Self {
        Self::new(
            "unauthorized",
            "unauthorized",
            "Invalid or missing admin API key",
        )
    }

    pub fn unexpected_state() -> Self {
        Self::new(
            "unexpected_state",
            "api_error",
            "An unknown error occurred.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_view_omits_unexpanded_relations() {
        let credit = StoreCredit::issue("cus_1", "reg_1", 1000, None);
        let view = StoreCreditView {
            store_credit: credit.clone(),
            customer: None,
            region: Some(Region {
                id: "reg_1".to_string(),
                name: "Europe".to_string(),
                currency_code: "eur".to_string(),
            }),
        };

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["id"], credit.id.as_str());
        assert_eq!(value["balance"], 1000);
        assert_eq!(value["region"]["currency_code"], "eur");
        assert!(value.get("customer").is_none());
    }

    #[test]
    fn test_delete_response_shape() {
        let value = serde_json::to_value(StoreCreditDeleteResponse::new("sc_1")).unwrap();
        assert_eq!(
            value,
            json!({"id": "sc_1", "object": "store_credit", "deleted": true})
        );
    }

    #[test]
    fn test_error_envelope_shape() {
        let value = serde_json::to_value(AdminErrorResponse::not_found("gone")).unwrap();
        assert_eq!(
            value,
            json!({"message": "gone", "type": "not_found", "code": "invalid_request_error"})
        );
    }
}
