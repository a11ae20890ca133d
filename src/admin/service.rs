//! Store credit business logic service

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};

use crate::store::{SoftDelete, StoreCredit, StoreCreditRepository, StoreError};

use super::aggregation;
use super::error::AdminServiceError;
use super::types::{CustomerStoreCreditSummary, StoreCreditView};
use super::validation::{
    CustomerFilter, Expand, MetadataUpdate, NewStoreCredit, PageLimits, Pagination,
    StoreCreditFilter, StoreCreditPatch,
};

/// Store credit service
///
/// Owns every write to store credits. Balance policy: `balance` only
/// changes when a patch sets it explicitly; changing `value` never moves
/// `balance`, and a patch leaving `balance > value` is rejected.
pub struct StoreCreditService {
    repository: Arc<dyn StoreCreditRepository>,
    limits: PageLimits,
}

impl StoreCreditService {
    pub fn new(repository: Arc<dyn StoreCreditRepository>, limits: PageLimits) -> Self {
        Self { repository, limits }
    }

    pub fn page_limits(&self) -> PageLimits {
        self.limits
    }

    /// Issue a store credit; its balance starts at the full value
    pub fn create(&self, req: NewStoreCredit) -> Result<StoreCreditView, AdminServiceError> {
        let customer = self
            .repository
            .find_customer(&req.customer_id)
            .ok_or_else(|| AdminServiceError::not_found("Customer", &req.customer_id))?;
        let region = self
            .repository
            .find_region(&req.region_id)
            .ok_or_else(|| AdminServiceError::not_found("Region", &req.region_id))?;

        let credit = self.repository.insert(StoreCredit::issue(
            customer.id.clone(),
            region.id.clone(),
            req.value,
            req.metadata,
        ))?;

        tracing::info!(
            id = %credit.id,
            customer_id = %credit.customer_id,
            region_id = %credit.region_id,
            value = credit.value,
            "Store credit created"
        );

        Ok(StoreCreditView {
            store_credit: credit,
            customer: Some(customer),
            region: Some(region),
        })
    }

    /// Apply a partial update atomically
    pub fn update(
        &self,
        id: &str,
        patch: StoreCreditPatch,
    ) -> Result<StoreCreditView, AdminServiceError> {
        let mut previous_balance = 0;
        let updated = self.repository.update_with(id, &mut |credit: &mut StoreCredit| {
            if credit.is_deleted() {
                return Err(StoreError::NotFound { id: id.to_string() });
            }
            previous_balance = credit.balance;

            if let Some(value) = patch.value {
                credit.value = value;
            }
            if let Some(balance) = patch.balance {
                credit.balance = balance;
            }
            match &patch.metadata {
                Some(MetadataUpdate::Merge(metadata)) => {
                    merge_metadata(&mut credit.metadata, metadata)
                }
                Some(MetadataUpdate::Clear) => credit.metadata = None,
                None => {}
            }
            credit.updated_at = Utc::now();

            credit.check_bounds().map_err(StoreError::Conflict)
        })?;

        if updated.balance > previous_balance {
            tracing::info!(
                id = %updated.id,
                from = previous_balance,
                to = updated.balance,
                "Store credit balance raised"
            );
        } else {
            tracing::info!(
                id = %updated.id,
                value = updated.value,
                balance = updated.balance,
                "Store credit updated"
            );
        }

        Ok(self.view(updated, Expand::ALL))
    }

    /// Soft delete; deleting an already deleted store credit succeeds
    pub fn delete(&self, id: &str) -> Result<(), AdminServiceError> {
        match self.repository.soft_delete(id, Utc::now())? {
            SoftDelete::Deleted => tracing::info!(id = %id, "Store credit deleted"),
            SoftDelete::AlreadyDeleted => {
                tracing::debug!(id = %id, "Store credit already deleted")
            }
        }
        Ok(())
    }

    /// Get a live store credit
    pub fn get(&self, id: &str, expand: Expand) -> Result<StoreCreditView, AdminServiceError> {
        match self.repository.get(id) {
            Some(credit) if !credit.is_deleted() => Ok(self.view(credit, expand)),
            _ => Err(AdminServiceError::not_found("StoreCredit", id)),
        }
    }

    /// List live store credits ordered by creation time, ties broken by id
    ///
    /// Returns one page plus the total number of matches.
    pub fn list(
        &self,
        filter: &StoreCreditFilter,
        pagination: Pagination,
        expand: Expand,
    ) -> (Vec<StoreCreditView>, usize) {
        let snapshot = self.repository.snapshot();

        let mut matches: Vec<&StoreCredit> = snapshot
            .store_credits
            .iter()
            .filter(|credit| {
                filter
                    .customer_id
                    .as_deref()
                    .is_none_or(|id| credit.customer_id == id)
            })
            .filter(|credit| {
                filter
                    .region_id
                    .as_deref()
                    .is_none_or(|id| credit.region_id == id)
            })
            .filter(|credit| match filter.q.as_deref() {
                None => true,
                Some(q) => {
                    credit.id.to_lowercase().contains(q)
                        || credit.customer_id.to_lowercase().contains(q)
                        || snapshot
                            .customers
                            .get(&credit.customer_id)
                            .is_some_and(|customer| customer.matches(q))
                }
            })
            .collect();

        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        let count = matches.len();

        let page = pagination
            .apply(matches)
            .into_iter()
            .map(|credit| StoreCreditView {
                store_credit: credit.clone(),
                customer: expand
                    .customer
                    .then(|| snapshot.customers.get(&credit.customer_id).cloned())
                    .flatten(),
                region: expand
                    .region
                    .then(|| snapshot.regions.get(&credit.region_id).cloned())
                    .flatten(),
            })
            .collect();

        (page, count)
    }

    /// List one customer's live store credits
    pub fn list_for_customer(
        &self,
        customer_id: &str,
        filter: StoreCreditFilter,
        pagination: Pagination,
        expand: Expand,
    ) -> Result<(Vec<StoreCreditView>, usize), AdminServiceError> {
        if self.repository.find_customer(customer_id).is_none() {
            return Err(AdminServiceError::not_found("Customer", customer_id));
        }

        let filter = StoreCreditFilter {
            customer_id: Some(customer_id.to_string()),
            ..filter
        };
        Ok(self.list(&filter, pagination, expand))
    }

    /// Customers holding live store credits, paginated over distinct customers
    pub fn list_customers(
        &self,
        filter: &CustomerFilter,
        pagination: Pagination,
    ) -> Result<(Vec<CustomerStoreCreditSummary>, usize), AdminServiceError> {
        let snapshot = self.repository.snapshot();
        let rows = aggregation::customer_rollups(&snapshot, filter)?;
        let count = rows.len();
        Ok((pagination.apply(rows), count))
    }

    /// Rollup for one customer
    pub fn get_customer_summary(
        &self,
        customer_id: &str,
    ) -> Result<CustomerStoreCreditSummary, AdminServiceError> {
        let snapshot = self.repository.snapshot();
        aggregation::customer_rollup(&snapshot, customer_id)?.ok_or_else(|| {
            AdminServiceError::not_found("Customer with store credits", customer_id)
        })
    }

    fn view(&self, credit: StoreCredit, expand: Expand) -> StoreCreditView {
        let customer = if expand.customer {
            self.repository.find_customer(&credit.customer_id)
        } else {
            None
        };
        let region = if expand.region {
            self.repository.find_region(&credit.region_id)
        } else {
            None
        };

        StoreCreditView {
            store_credit: credit,
            customer,
            region,
        }
    }
}

/// Merge metadata keys; `null` or `""` removes a key
fn merge_metadata(target: &mut Option<Map<String, Value>>, patch: &Map<String, Value>) {
    let map = target.get_or_insert_with(Map::new);
    for (key, value) in patch {
        match value {
            Value::Null => {
                map.remove(key);
            }
            Value::String(s) if s.is_empty() => {
                map.remove(key);
            }
            _ => {
                map.insert(key.clone(), value.clone());
            }
        }
    }
    if map.is_empty() {
        *target = None;
    }
}
