//! Per-customer store credit rollups
//!
//! Rollups are computed from a repository snapshot, which only holds live
//! store credits, so a soft-deleted credit can never contribute to a sum.

use std::collections::HashMap;

use crate::store::{Snapshot, StoreCredit};

use super::error::AdminServiceError;
use super::types::CustomerStoreCreditSummary;
use super::validation::CustomerFilter;

struct Rollup<'a> {
    earliest: &'a StoreCredit,
    amount: i64,
    balance: i64,
    count: usize,
}

impl<'a> Rollup<'a> {
    fn new(credit: &'a StoreCredit) -> Self {
        Self {
            earliest: credit,
            amount: 0,
            balance: 0,
            count: 0,
        }
    }

    /// Fold one credit in; `None` when a total no longer fits in `i64`
    fn add(&mut self, credit: &'a StoreCredit) -> Option<()> {
        if (credit.created_at, &credit.id) < (self.earliest.created_at, &self.earliest.id) {
            self.earliest = credit;
        }
        self.amount = self.amount.checked_add(credit.value)?;
        self.balance = self.balance.checked_add(credit.balance)?;
        self.count += 1;
        Some(())
    }
}

/// One summary per customer holding at least one matching live store credit
///
/// With `region_id` set, only credits in that region are summed. Rows are
/// ordered by the customer's earliest credit, ties broken by customer id.
pub fn customer_rollups(
    snapshot: &Snapshot,
    filter: &CustomerFilter,
) -> Result<Vec<CustomerStoreCreditSummary>, AdminServiceError> {
    let mut rollups: HashMap<&str, Rollup<'_>> = HashMap::new();

    let credits = snapshot.store_credits.iter().filter(|c| {
        filter
            .region_id
            .as_deref()
            .is_none_or(|region_id| c.region_id == region_id)
    });

    for credit in credits {
        rollups
            .entry(credit.customer_id.as_str())
            .or_insert_with(|| Rollup::new(credit))
            .add(credit)
            .ok_or_else(|| {
                AdminServiceError::InternalError(format!(
                    "store credit totals overflow for customer {}",
                    credit.customer_id
                ))
            })?;
    }

    let mut rows: Vec<(&str, Rollup<'_>)> = rollups
        .into_iter()
        .filter(|(customer_id, _)| match filter.q.as_deref() {
            None => true,
            Some(q) => match snapshot.customers.get(*customer_id) {
                Some(customer) => customer.matches(q),
                None => customer_id.to_lowercase().contains(q),
            },
        })
        .collect();

    rows.sort_by(|(a_id, a), (b_id, b)| {
        a.earliest
            .created_at
            .cmp(&b.earliest.created_at)
            .then_with(|| a_id.cmp(b_id))
    });

    Ok(rows
        .into_iter()
        .map(|(customer_id, rollup)| CustomerStoreCreditSummary {
            customer: snapshot.customers.get(customer_id).cloned(),
            region: snapshot.regions.get(&rollup.earliest.region_id).cloned(),
            amount: rollup.amount,
            balance: rollup.balance,
            store_credit_count: rollup.count,
        })
        .collect())
}

/// Summary for a single customer, `None` when they hold no live store credit
pub fn customer_rollup(
    snapshot: &Snapshot,
    customer_id: &str,
) -> Result<Option<CustomerStoreCreditSummary>, AdminServiceError> {
    let mut rollups = customer_rollups(snapshot, &CustomerFilter::default())?;
    let index = rollups.iter().position(|row| {
        row.customer
            .as_ref()
            .is_some_and(|customer| customer.id == customer_id)
    });
    Ok(index.map(|index| rollups.swap_remove(index)))
}
