//! Loads parents and joins their child collections in one pass.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use sea_orm::{ColumnTrait, Condition, DatabaseConnection};
use serde::Serialize;
use uuid::Uuid;

use crate::error::CrmResult;
use crate::model::*;
use crate::repository::{Record, list_on};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChildCollection {
    History,
    Activities,
    Documents,
    Stipulations,
    FundingItems,
    AccountActivities,
}

/// A child fetch that failed; the matching collection is empty on every parent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChildFailure {
    pub collection: ChildCollection,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedDeal {
    #[serde(flatten)]
    pub deal: Deal,
    pub history: Vec<DealHistoryEntry>,
    pub activities: Vec<DealActivity>,
    pub documents: Vec<DealDocument>,
    pub stips: Vec<Stipulation>,
    pub funding_items: Vec<FundingItem>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct LoadedDeals {
    pub deals: Vec<ComposedDeal>,
    pub failures: Vec<ChildFailure>,
}

impl LoadedDeals {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, collection: ChildCollection) -> bool {
        self.failures.iter().any(|f| f.collection == collection)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedAccount {
    #[serde(flatten)]
    pub account: Account,
    pub activities: Vec<AccountActivity>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct LoadedAccounts {
    pub accounts: Vec<ComposedAccount>,
    pub failures: Vec<ChildFailure>,
}

/// Buckets `items` by parent key in a single pass, keeping their relative order.
pub fn group_by_parent<T, K, F>(items: Vec<T>, key: F) -> HashMap<K, Vec<T>>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut groups: HashMap<K, Vec<T>> = HashMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups
}

#[derive(Clone)]
pub struct Loader {
    db: Arc<DatabaseConnection>,
}

impl Loader {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Every deal, newest first, with its children attached.
    pub async fn load_deals(&self) -> CrmResult<LoadedDeals> {
        self.load_deals_where(Condition::all()).await
    }

    /// The dealer portal view: only deals pointing at `dealer_id`.
    pub async fn load_deals_for_dealer(&self, dealer_id: Uuid) -> CrmResult<LoadedDeals> {
        self.load_deals_where(
            Condition::all().add(entity::deals::Column::DealerId.eq(dealer_id)),
        )
        .await
    }

    /// Deals whose contact email matches, for the customer portal.
    pub async fn load_deals_for_email(&self, email: &str) -> CrmResult<LoadedDeals> {
        self.load_deals_where(
            Condition::all().add(entity::deals::Column::Email.eq(email.trim().to_lowercase())),
        )
        .await
    }

    pub async fn load_deal(&self, deal_id: Uuid) -> CrmResult<Option<ComposedDeal>> {
        let mut loaded = self
            .load_deals_where(Condition::all().add(entity::deals::Column::Id.eq(deal_id)))
            .await?;
        Ok(loaded.deals.pop())
    }

    async fn load_deals_where(&self, filter: Condition) -> CrmResult<LoadedDeals> {
        let db = self.db.as_ref();
        let deals: Vec<Deal> = list_on(db, filter)
            .await
            .inspect_err(|err| tracing::error!(error = %err, "deal fetch failed"))?;
        if deals.is_empty() {
            return Ok(LoadedDeals::default());
        }
        let ids: Vec<Uuid> = deals.iter().map(|d| d.id).collect();

        let (history, activities, documents, stips, funding) = tokio::join!(
            children::<DealHistoryEntry>(db, entity::deal_history::Column::DealId, &ids),
            children::<DealActivity>(db, entity::deal_activities::Column::DealId, &ids),
            children::<DealDocument>(db, entity::deal_documents::Column::DealId, &ids),
            children::<Stipulation>(db, entity::deal_stips::Column::DealId, &ids),
            children::<FundingItem>(db, entity::deal_funding_items::Column::DealId, &ids),
        );

        let mut failures = Vec::new();
        let mut history = group_by_parent(
            settle(history, ChildCollection::History, &mut failures),
            |h| h.deal_id,
        );
        let mut activities = group_by_parent(
            settle(activities, ChildCollection::Activities, &mut failures),
            |a| a.deal_id,
        );
        let mut documents = group_by_parent(
            settle(documents, ChildCollection::Documents, &mut failures),
            |d| d.deal_id,
        );
        let mut stips = group_by_parent(
            settle(stips, ChildCollection::Stipulations, &mut failures),
            |s| s.deal_id,
        );
        let mut funding = group_by_parent(
            settle(funding, ChildCollection::FundingItems, &mut failures),
            |f| f.deal_id,
        );

        let deals = deals
            .into_iter()
            .map(|deal| ComposedDeal {
                history: history.remove(&deal.id).unwrap_or_default(),
                activities: activities.remove(&deal.id).unwrap_or_default(),
                documents: documents.remove(&deal.id).unwrap_or_default(),
                stips: stips.remove(&deal.id).unwrap_or_default(),
                funding_items: funding.remove(&deal.id).unwrap_or_default(),
                deal,
            })
            .collect();
        Ok(LoadedDeals { deals, failures })
    }

    /// Every account, newest first, with its activity log.
    pub async fn load_accounts(&self) -> CrmResult<LoadedAccounts> {
        let db = self.db.as_ref();
        let accounts: Vec<Account> = list_on(db, Condition::all())
            .await
            .inspect_err(|err| tracing::error!(error = %err, "account fetch failed"))?;
        if accounts.is_empty() {
            return Ok(LoadedAccounts::default());
        }
        let ids: Vec<Uuid> = accounts.iter().map(|a| a.id).collect();

        let mut failures = Vec::new();
        let fetched = children::<AccountActivity>(
            db,
            entity::account_activities::Column::AccountId,
            &ids,
        )
        .await;
        let mut activities = group_by_parent(
            settle(fetched, ChildCollection::AccountActivities, &mut failures),
            |a| a.account_id,
        );

        let accounts = accounts
            .into_iter()
            .map(|account| ComposedAccount {
                activities: activities.remove(&account.id).unwrap_or_default(),
                account,
            })
            .collect();
        Ok(LoadedAccounts { accounts, failures })
    }
}

async fn children<R: Record>(
    db: &DatabaseConnection,
    parent: <R::Entity as sea_orm::EntityTrait>::Column,
    ids: &[Uuid],
) -> CrmResult<Vec<R>> {
    list_on(db, Condition::all().add(parent.is_in(ids.iter().copied()))).await
}

fn settle<T>(
    result: CrmResult<Vec<T>>,
    collection: ChildCollection,
    failures: &mut Vec<ChildFailure>,
) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!(?collection, error = %err, "child fetch failed, attaching empty");
            failures.push(ChildFailure {
                collection,
                reason: err.to_string(),
            });
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_keeps_order_within_parent() {
        let items = vec![("a", 1), ("b", 2), ("a", 3), ("c", 4), ("a", 5)];
        let groups = group_by_parent(items, |(k, _)| *k);
        assert_eq!(groups["a"], vec![("a", 1), ("a", 3), ("a", 5)]);
        assert_eq!(groups["b"], vec![("b", 2)]);
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn settle_records_failure() {
        let mut failures = Vec::new();
        let items: Vec<u8> = settle(
            Err(crate::error::CrmError::invalid("boom")),
            ChildCollection::Stipulations,
            &mut failures,
        );
        assert!(items.is_empty());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].collection, ChildCollection::Stipulations);
    }
}
