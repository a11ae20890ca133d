//! Store credit persistence
//!
//! `StoreCreditRepository` is the seam between the admin service and storage.
//! `MemoryStore` keeps every table in memory and can write them back to a
//! JSON data file after each mutation.

mod memory;
pub mod model;

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

pub use memory::MemoryStore;
pub use model::{Customer, DataFile, Region, StoreCredit};

/// Storage layer errors
#[derive(Debug)]
pub enum StoreError {
    /// No record with this id was ever stored
    NotFound { id: String },

    /// The requested change violates a record invariant
    Conflict(String),

    /// Writing to the backing storage failed (change was rolled back)
    Persistence(anyhow::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { id } => write!(f, "Store credit not found: {}", id),
            StoreError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            StoreError::Persistence(e) => write!(f, "Persistence failure: {:#}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Result of a soft delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftDelete {
    /// The record was live and is now marked deleted
    Deleted,
    /// The record was already marked deleted, nothing changed
    AlreadyDeleted,
}

/// Read-only copy of the tables taken under a single lock
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Live store credits only
    pub store_credits: Vec<StoreCredit>,
    pub customers: HashMap<String, Customer>,
    pub regions: HashMap<String, Region>,
}

/// Store credit persistence
///
/// Every mutating method is atomic with respect to the others.
pub trait StoreCreditRepository: Send + Sync {
    fn find_customer(&self, id: &str) -> Option<Customer>;

    fn find_region(&self, id: &str) -> Option<Region>;

    /// Get a store credit by id, soft-deleted records included
    fn get(&self, id: &str) -> Option<StoreCredit>;

    fn insert(&self, credit: StoreCredit) -> Result<StoreCredit, StoreError>;

    /// Read-modify-write a record under the repository's write lock
    ///
    /// `apply` receives the current record and mutates it in place. The
    /// result must satisfy `StoreCredit::check_bounds`, otherwise nothing is
    /// stored and `StoreError::Conflict` is returned.
    fn update_with(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut StoreCredit) -> Result<(), StoreError>,
    ) -> Result<StoreCredit, StoreError>;

    fn soft_delete(&self, id: &str, at: DateTime<Utc>) -> Result<SoftDelete, StoreError>;

    fn snapshot(&self) -> Snapshot;
}
