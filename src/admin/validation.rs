//! Request validation
//!
//! Raw query strings and JSON bodies are deserialized into loosely typed
//! shapes first, then checked field by field. Every offending field is
//! reported at once in a single `ValidationError`.

use std::fmt;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::AdminServiceError;

// ============ Errors ============

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Field-level validation failure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::default();
        err.push(field, message);
        err
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether `field` was rejected
    #[cfg(test)]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid request: ")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} {}", field.field, field.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

// ============ Extractors ============

/// JSON body extractor reporting decode failures as `ValidationError`
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AdminServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(ValidationError::single("body", rejection.body_text()).into()),
        }
    }
}

/// Query string extractor reporting decode failures as `ValidationError`
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AdminServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ValidQuery(value)),
            Err(rejection) => Err(ValidationError::single("query", rejection.body_text()).into()),
        }
    }
}

// ============ Shared parameters ============

/// Page size bounds taken from configuration
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

/// Validated offset/limit pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

impl Pagination {
    fn parse(
        offset: Option<&str>,
        limit: Option<&str>,
        limits: PageLimits,
        errors: &mut ValidationError,
    ) -> Self {
        let offset = match offset.map(str::trim) {
            None | Some("") => 0,
            Some(raw) => match raw.parse::<usize>() {
                Ok(v) => v,
                Err(_) => {
                    errors.push("offset", "must be an integer greater than or equal to 0");
                    0
                }
            },
        };

        let limit = match limit.map(str::trim) {
            None | Some("") => limits.default_limit,
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) | Err(_) => {
                    errors.push("limit", "must be an integer greater than 0");
                    limits.default_limit
                }
                Ok(v) if v > limits.max_limit => {
                    errors.push("limit", format!("must not exceed {}", limits.max_limit));
                    limits.default_limit
                }
                Ok(v) => v,
            },
        };

        Self { offset, limit }
    }

    /// Slice one page out of an already ordered list
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

/// Relations to attach to returned store credits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Expand {
    pub customer: bool,
    pub region: bool,
}

impl Expand {
    pub const NONE: Expand = Expand {
        customer: false,
        region: false,
    };
    pub const REGION: Expand = Expand {
        customer: false,
        region: true,
    };
    pub const ALL: Expand = Expand {
        customer: true,
        region: true,
    };

    fn parse(raw: &str, errors: &mut ValidationError) -> Self {
        let mut expand = Expand::NONE;
        for relation in raw.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            match relation {
                "customer" => expand.customer = true,
                "region" => expand.region = true,
                other => errors.push(
                    "expand",
                    format!("contains unknown relation '{}' (allowed: customer, region)", other),
                ),
            }
        }
        expand
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn search_term(value: Option<String>) -> Option<String> {
    non_empty(value).map(|v| v.to_lowercase())
}

// ============ Store credit list ============

/// Raw `GET /admin/store-credits` query
#[derive(Debug, Default, Deserialize)]
pub struct ListStoreCreditsQuery {
    pub offset: Option<String>,
    pub limit: Option<String>,
    pub expand: Option<String>,
    pub q: Option<String>,
    pub customer_id: Option<String>,
    pub region_id: Option<String>,
}

/// Store credit list filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreCreditFilter {
    /// Lowercased free-text search
    pub q: Option<String>,
    pub customer_id: Option<String>,
    pub region_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListStoreCreditsParams {
    pub filter: StoreCreditFilter,
    pub pagination: Pagination,
    pub expand: Expand,
}

impl ListStoreCreditsQuery {
    pub fn validate(
        self,
        limits: PageLimits,
        default_expand: Expand,
    ) -> Result<ListStoreCreditsParams, ValidationError> {
        let mut errors = ValidationError::default();
        let pagination = Pagination::parse(
            self.offset.as_deref(),
            self.limit.as_deref(),
            limits,
            &mut errors,
        );
        let expand = match self.expand.as_deref() {
            Some(raw) => Expand::parse(raw, &mut errors),
            None => default_expand,
        };
        let filter = StoreCreditFilter {
            q: search_term(self.q),
            customer_id: non_empty(self.customer_id),
            region_id: non_empty(self.region_id),
        };

        errors.finish(ListStoreCreditsParams {
            filter,
            pagination,
            expand,
        })
    }
}

// ============ Single store credit ============

/// Raw `GET /admin/store-credits/:id` query
#[derive(Debug, Default, Deserialize)]
pub struct RetrieveStoreCreditQuery {
    pub expand: Option<String>,
}

impl RetrieveStoreCreditQuery {
    pub fn validate(self, default_expand: Expand) -> Result<Expand, ValidationError> {
        let mut errors = ValidationError::default();
        let expand = match self.expand.as_deref() {
            Some(raw) => Expand::parse(raw, &mut errors),
            None => default_expand,
        };
        errors.finish(expand)
    }
}

// ============ Customer aggregate list ============

/// Raw `GET /admin/store-credits/customers` query
#[derive(Debug, Default, Deserialize)]
pub struct ListCustomersQuery {
    pub offset: Option<String>,
    pub limit: Option<String>,
    pub q: Option<String>,
    pub region_id: Option<String>,
}

/// Customer aggregate filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    /// Lowercased free-text search over customer id, email and names
    pub q: Option<String>,
    pub region_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCustomersParams {
    pub filter: CustomerFilter,
    pub pagination: Pagination,
}

impl ListCustomersQuery {
    pub fn validate(self, limits: PageLimits) -> Result<ListCustomersParams, ValidationError> {
        let mut errors = ValidationError::default();
        let pagination = Pagination::parse(
            self.offset.as_deref(),
            self.limit.as_deref(),
            limits,
            &mut errors,
        );
        let filter = CustomerFilter {
            q: search_term(self.q),
            region_id: non_empty(self.region_id),
        };

        errors.finish(ListCustomersParams { filter, pagination })
    }
}

// ============ Create ============

/// Raw `POST /admin/store-credits` body
#[derive(Debug, Default, Deserialize)]
pub struct CreateStoreCreditRequest {
    pub customer_id: Option<String>,
    pub region_id: Option<String>,
    pub value: Option<i64>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Validated create payload
#[derive(Debug, Clone, PartialEq)]
pub struct NewStoreCredit {
    pub customer_id: String,
    pub region_id: String,
    pub value: i64,
    pub metadata: Option<Map<String, Value>>,
}

impl CreateStoreCreditRequest {
    pub fn validate(self) -> Result<NewStoreCredit, ValidationError> {
        let mut errors = ValidationError::default();

        let customer_id = non_empty(self.customer_id);
        if customer_id.is_none() {
            errors.push("customer_id", "is required");
        }
        let region_id = non_empty(self.region_id);
        if region_id.is_none() {
            errors.push("region_id", "is required");
        }
        match self.value {
            None => errors.push("value", "is required"),
            Some(v) if v <= 0 => errors.push("value", "must be greater than 0"),
            Some(_) => {}
        }

        match (customer_id, region_id, self.value) {
            (Some(customer_id), Some(region_id), Some(value)) if errors.is_empty() => {
                Ok(NewStoreCredit {
                    customer_id,
                    region_id,
                    value,
                    metadata: self.metadata,
                })
            }
            _ => Err(errors),
        }
    }
}

// ============ Update ============

/// Raw `POST /admin/store-credits/:id` body
///
/// The owning customer and region cannot change, so those fields are
/// rejected as unknown. `"metadata": null` clears all metadata, while an
/// object is merged key by key.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStoreCreditRequest {
    pub value: Option<i64>,
    pub balance: Option<i64>,
    /// Outer `None` when absent, inner `None` when explicitly `null`
    #[serde(default, deserialize_with = "present")]
    pub metadata: Option<Option<Map<String, Value>>>,
}

/// Marks a field as present, so an explicit `null` survives as `Some(None)`
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Requested metadata change
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataUpdate {
    /// Keys mapped to `null` or `""` are removed, the rest are merged
    Merge(Map<String, Value>),
    /// Drop every key
    Clear,
}

/// Validated partial update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreCreditPatch {
    pub value: Option<i64>,
    pub balance: Option<i64>,
    pub metadata: Option<MetadataUpdate>,
}

impl UpdateStoreCreditRequest {
    pub fn validate(self) -> Result<StoreCreditPatch, ValidationError> {
        let mut errors = ValidationError::default();

        if self.value.is_none() && self.balance.is_none() && self.metadata.is_none() {
            errors.push("body", "must set at least one of value, balance, metadata");
        }
        if let Some(v) = self.value {
            if v <= 0 {
                errors.push("value", "must be greater than 0");
            }
        }
        if let Some(b) = self.balance {
            if b < 0 {
                errors.push("balance", "must be greater than or equal to 0");
            }
        }

        errors.finish(StoreCreditPatch {
            value: self.value,
            balance: self.balance,
            metadata: self
                .metadata
                .map(|m| m.map_or(MetadataUpdate::Clear, MetadataUpdate::Merge)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LIMITS: PageLimits = PageLimits {
        default_limit: 50,
        max_limit: 100,
    };

    fn list_query(pairs: &[(&str, &str)]) -> ListStoreCreditsQuery {
        let mut query = ListStoreCreditsQuery::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "offset" => query.offset = v,
                "limit" => query.limit = v,
                "expand" => query.expand = v,
                "q" => query.q = v,
                "customer_id" => query.customer_id = v,
                "region_id" => query.region_id = v,
                _ => unreachable!(),
            }
        }
        query
    }

    #[test]
    fn test_list_defaults() {
        let params = list_query(&[]).validate(LIMITS, Expand::ALL).unwrap();
        assert_eq!(params.pagination, Pagination { offset: 0, limit: 50 });
        assert_eq!(params.expand, Expand::ALL);
        assert_eq!(params.filter, StoreCreditFilter::default());
    }

    #[test]
    fn test_list_reports_every_bad_field() {
        let err = list_query(&[("offset", "-1"), ("limit", "0"), ("expand", "orders")])
            .validate(LIMITS, Expand::ALL)
            .unwrap_err();
        assert!(err.has_field("offset"));
        assert!(err.has_field("limit"));
        assert!(err.has_field("expand"));
        assert_eq!(err.fields.len(), 3);
    }

    #[test]
    fn test_list_limit_above_max() {
        let err = list_query(&[("limit", "101")])
            .validate(LIMITS, Expand::ALL)
            .unwrap_err();
        assert_eq!(err.fields[0].message, "must not exceed 100");
    }

    #[test]
    fn test_list_filters_are_normalized() {
        let params = list_query(&[
            ("q", "  Jane "),
            ("customer_id", "cus_1"),
            ("region_id", " "),
            ("expand", "region"),
        ])
        .validate(LIMITS, Expand::ALL)
        .unwrap();
        assert_eq!(params.filter.q.as_deref(), Some("jane"));
        assert_eq!(params.filter.customer_id.as_deref(), Some("cus_1"));
        assert!(params.filter.region_id.is_none());
        assert_eq!(params.expand, Expand::REGION);
    }

    #[test]
    fn test_empty_expand_means_no_relations() {
        let params = list_query(&[("expand", "")])
            .validate(LIMITS, Expand::ALL)
            .unwrap();
        assert_eq!(params.expand, Expand::NONE);
    }

    #[test]
    fn test_retrieve_expand() {
        let query = RetrieveStoreCreditQuery {
            expand: Some("customer".to_string()),
        };
        let expand = query.validate(Expand::ALL).unwrap();
        assert!(expand.customer);
        assert!(!expand.region);

        let query = RetrieveStoreCreditQuery {
            expand: Some("orders".to_string()),
        };
        assert!(query.validate(Expand::ALL).unwrap_err().has_field("expand"));
    }

    #[test]
    fn test_pagination_apply() {
        let page = Pagination { offset: 2, limit: 2 }.apply(vec![1, 2, 3, 4, 5]);
        assert_eq!(page, vec![3, 4]);
        let page = Pagination { offset: 10, limit: 2 }.apply(vec![1, 2, 3]);
        assert!(page.is_empty());
    }

    #[test]
    fn test_create_requires_all_fields() {
        let err = CreateStoreCreditRequest::default().validate().unwrap_err();
        assert!(err.has_field("customer_id"));
        assert!(err.has_field("region_id"));
        assert!(err.has_field("value"));
    }

    #[test]
    fn test_create_rejects_non_positive_value() {
        let req: CreateStoreCreditRequest =
            serde_json::from_value(json!({
                "customer_id": "cus_1",
                "region_id": "reg_1",
                "value": 0
            }))
            .unwrap();
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid request: value must be greater than 0");
    }

    #[test]
    fn test_create_valid() {
        let req: CreateStoreCreditRequest = serde_json::from_value(json!({
            "customer_id": "cus_1",
            "region_id": "reg_1",
            "value": 1000,
            "metadata": {"reason": "refund"}
        }))
        .unwrap();
        let new = req.validate().unwrap();
        assert_eq!(new.customer_id, "cus_1");
        assert_eq!(new.value, 1000);
        assert_eq!(new.metadata.unwrap()["reason"], "refund");
    }

    #[test]
    fn test_update_rejects_owner_change() {
        let result: Result<UpdateStoreCreditRequest, _> =
            serde_json::from_value(json!({"customer_id": "cus_2"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_update_null_metadata_clears() {
        let req: UpdateStoreCreditRequest =
            serde_json::from_value(json!({"metadata": null})).unwrap();
        assert_eq!(req.validate().unwrap().metadata, Some(MetadataUpdate::Clear));

        let req: UpdateStoreCreditRequest =
            serde_json::from_value(json!({"metadata": {"a": 1}})).unwrap();
        let patch = req.validate().unwrap();
        assert!(matches!(patch.metadata, Some(MetadataUpdate::Merge(m)) if m["a"] == 1));

        let req: UpdateStoreCreditRequest = serde_json::from_value(json!({"balance": 1})).unwrap();
        assert!(req.validate().unwrap().metadata.is_none());
    }

    #[test]
    fn test_update_requires_a_field() {
        let err = UpdateStoreCreditRequest::default().validate().unwrap_err();
        assert!(err.has_field("body"));
    }

    #[test]
    fn test_update_ranges() {
        let req: UpdateStoreCreditRequest =
            serde_json::from_value(json!({"value": -3, "balance": -1})).unwrap();
        let err = req.validate().unwrap_err();
        assert!(err.has_field("value"));
        assert!(err.has_field("balance"));

        let req: UpdateStoreCreditRequest =
            serde_json::from_value(json!({"balance": 0})).unwrap();
        assert_eq!(req.validate().unwrap().balance, Some(0));
    }
}
