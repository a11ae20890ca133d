//! In-memory repository with optional JSON write-back

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::runtime::RuntimeFlavor;

use super::model::{Customer, DataFile, Region, StoreCredit};
use super::{SoftDelete, Snapshot, StoreCreditRepository, StoreError};

#[derive(Debug, Default)]
struct Tables {
    customers: HashMap<String, Customer>,
    regions: HashMap<String, Region>,
    store_credits: HashMap<String, StoreCredit>,
}

impl Tables {
    fn from_data(data: DataFile) -> anyhow::Result<Self> {
        let mut tables = Tables::default();

        for customer in data.customers {
            let id = customer.id.clone();
            if tables.customers.insert(id.clone(), customer).is_some() {
                anyhow::bail!("Duplicate customer id in data file: {}", id);
            }
        }
        for region in data.regions {
            let id = region.id.clone();
            if tables.regions.insert(id.clone(), region).is_some() {
                anyhow::bail!("Duplicate region id in data file: {}", id);
            }
        }
        for credit in data.store_credits {
            credit
                .check_bounds()
                .map_err(|e| anyhow::anyhow!("Store credit {} is invalid: {}", credit.id, e))?;
            if !tables.customers.contains_key(&credit.customer_id) {
                anyhow::bail!(
                    "Store credit {} references unknown customer {}",
                    credit.id,
                    credit.customer_id
                );
            }
            if !tables.regions.contains_key(&credit.region_id) {
                anyhow::bail!(
                    "Store credit {} references unknown region {}",
                    credit.id,
                    credit.region_id
                );
            }
            let id = credit.id.clone();
            if tables.store_credits.insert(id.clone(), credit).is_some() {
                anyhow::bail!("Duplicate store credit id in data file: {}", id);
            }
        }

        Ok(tables)
    }

    fn to_data(&self) -> DataFile {
        let mut customers: Vec<Customer> = self.customers.values().cloned().collect();
        customers.sort_by(|a, b| a.id.cmp(&b.id));

        let mut regions: Vec<Region> = self.regions.values().cloned().collect();
        regions.sort_by(|a, b| a.id.cmp(&b.id));

        let mut store_credits: Vec<StoreCredit> = self.store_credits.values().cloned().collect();
        store_credits.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        DataFile {
            customers,
            regions,
            store_credits,
        }
    }
}

/// Sibling file the data is staged in before replacing `path`
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `content` so readers see either the old or the new file
fn write_replace(path: &Path, content: &str) -> anyhow::Result<()> {
    let staging = staging_path(path);
    fs::write(&staging, content)
        .with_context(|| format!("Failed to write data file: {}", staging.display()))?;
    fs::rename(&staging, path)
        .with_context(|| format!("Failed to replace data file: {}", path.display()))?;
    Ok(())
}

/// In-memory store credit repository
///
/// All tables sit behind one `RwLock`. Mutations hold the write lock for the
/// whole read-modify-write and for the data file write-back, so concurrent
/// balance adjustments are serialized and the file never lags the memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    data_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Empty store without a data file
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from already-parsed data (no write-back)
    pub fn from_data(data: DataFile) -> anyhow::Result<Self> {
        Ok(Self {
            tables: RwLock::new(Tables::from_data(data)?),
            data_path: None,
        })
    }

    /// Load the data file, starting empty if it does not exist yet
    ///
    /// Every later mutation is written back to `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let tables = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read data file: {}", path.display()))?;
            let data: DataFile = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse data file: {}", path.display()))?;
            Tables::from_data(data)?
        } else {
            tracing::warn!("Data file {} not found, starting empty", path.display());
            Tables::default()
        };

        Ok(Self {
            tables: RwLock::new(tables),
            data_path: Some(path.to_path_buf()),
        })
    }

    /// Get data file path (if write-back is enabled)
    pub fn data_path(&self) -> Option<&Path> {
        self.data_path.as_deref()
    }

    /// Table sizes for startup logging: (customers, regions, store credits)
    pub fn counts(&self) -> (usize, usize, usize) {
        let tables = self.tables.read();
        (
            tables.customers.len(),
            tables.regions.len(),
            tables.store_credits.len(),
        )
    }

    /// Write tables back to the data file; caller holds the write lock
    fn persist(&self, tables: &Tables) -> anyhow::Result<()> {
        let path = match &self.data_path {
            Some(p) => p,
            None => return Ok(()),
        };

        let content = serde_json::to_string_pretty(&tables.to_data())
            .context("Failed to serialize data file")?;

        // block_in_place is only available on the multi-threaded runtime
        let on_worker = tokio::runtime::Handle::try_current()
            .is_ok_and(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread);
        if on_worker {
            tokio::task::block_in_place(|| write_replace(path, &content))?;
        } else {
            write_replace(path, &content)?;
        }

        tracing::debug!("Wrote back data file: {}", path.display());
        Ok(())
    }

    /// Persist, restoring `previous` for `id` if the write fails
    fn commit(
        &self,
        tables: &mut Tables,
        id: &str,
        previous: Option<StoreCredit>,
    ) -> Result<(), StoreError> {
        if let Err(e) = self.persist(tables) {
            tracing::error!("Rolling back store credit {}: {:#}", id, e);
            match previous {
                Some(record) => {
                    tables.store_credits.insert(id.to_string(), record);
                }
                None => {
                    tables.store_credits.remove(id);
                }
            }
            return Err(StoreError::Persistence(e));
        }
        Ok(())
    }
}

impl StoreCreditRepository for MemoryStore {
    fn find_customer(&self, id: &str) -> Option<Customer> {
        self.tables.read().customers.get(id).cloned()
    }

    fn find_region(&self, id: &str) -> Option<Region> {
        self.tables.read().regions.get(id).cloned()
    }

    fn get(&self, id: &str) -> Option<StoreCredit> {
        self.tables.read().store_credits.get(id).cloned()
    }

    fn insert(&self, credit: StoreCredit) -> Result<StoreCredit, StoreError> {
        credit.check_bounds().map_err(StoreError::Conflict)?;

        let mut tables = self.tables.write();
        if tables.store_credits.contains_key(&credit.id) {
            return Err(StoreError::Conflict(format!(
                "store credit {} already exists",
                credit.id
            )));
        }

        let id = credit.id.clone();
        tables.store_credits.insert(id.clone(), credit.clone());
        self.commit(&mut tables, &id, None)?;
        Ok(credit)
    }

    fn update_with(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut StoreCredit) -> Result<(), StoreError>,
    ) -> Result<StoreCredit, StoreError> {
        let mut tables = self.tables.write();
        let current = tables
            .store_credits
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let mut updated = current.clone();
        apply(&mut updated)?;
        updated.check_bounds().map_err(StoreError::Conflict)?;

        tables.store_credits.insert(id.to_string(), updated.clone());
        self.commit(&mut tables, id, Some(current))?;
        Ok(updated)
    }

    fn soft_delete(&self, id: &str, at: DateTime<Utc>) -> Result<SoftDelete, StoreError> {
        let mut tables = self.tables.write();
        let current = tables
            .store_credits
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        if current.is_deleted() {
            return Ok(SoftDelete::AlreadyDeleted);
        }

        let mut deleted = current.clone();
        deleted.deleted_at = Some(at);
        deleted.updated_at = at;
        tables.store_credits.insert(id.to_string(), deleted);
        self.commit(&mut tables, id, Some(current))?;
        Ok(SoftDelete::Deleted)
    }

    fn snapshot(&self) -> Snapshot {
        let tables = self.tables.read();
        Snapshot {
            store_credits: tables
                .store_credits
                .values()
                .filter(|c| !c.is_deleted())
                .cloned()
                .collect(),
            customers: tables.customers.clone(),
            regions: tables.regions.clone(),
        }
    }
}
