//! Store credit data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Id prefix for store credits
pub const STORE_CREDIT_ID_PREFIX: &str = "sc_";

/// Customer, owned by the host platform and only referenced here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Customer {
    /// Case-insensitive match of `needle` (already lowercased) against id, email and names
    pub fn matches(&self, needle: &str) -> bool {
        [
            Some(self.id.as_str()),
            Some(self.email.as_str()),
            self.first_name.as_deref(),
            self.last_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Region, defines the currency a store credit is denominated in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub currency_code: String,
}

/// A store credit issued to a customer
///
/// Amounts are in the minor unit of the region currency.
/// `0 <= balance <= value` holds for every stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreCredit {
    pub id: String,
    pub customer_id: String,
    pub region_id: String,
    /// Original issued value
    pub value: i64,
    /// Remaining balance
    pub balance: i64,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StoreCredit {
    /// Issue a new store credit with its full value as balance
    pub fn issue(
        customer_id: impl Into<String>,
        region_id: impl Into<String>,
        value: i64,
        metadata: Option<Map<String, Value>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}{}", STORE_CREDIT_ID_PREFIX, uuid::Uuid::new_v4().simple()),
            customer_id: customer_id.into(),
            region_id: region_id.into(),
            value,
            balance: value,
            metadata,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Check the balance bounds, returning a description of the violation
    pub fn check_bounds(&self) -> Result<(), String> {
        if self.value <= 0 {
            return Err(format!("value must be positive, got {}", self.value));
        }
        if self.balance < 0 {
            return Err(format!("balance cannot be negative, got {}", self.balance));
        }
        if self.balance > self.value {
            return Err(format!(
                "balance {} exceeds store credit value {}",
                self.balance, self.value
            ));
        }
        Ok(())
    }
}

/// On-disk layout of the data file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataFile {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub store_credits: Vec<StoreCredit>,
}
