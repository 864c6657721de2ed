use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::{Condition, DatabaseConnection};
use serde::Serialize;
use uuid::Uuid;

use crate::error::CrmResult;
use crate::model::{Deal, Dealer, Stage};
use crate::repository::list_on;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DealerStats {
    pub total: u32,
    pub pending: u32,
    pub approved: u32,
    pub funded: u32,
    pub declined: u32,
}

impl DealerStats {
    pub fn record(&mut self, stage: Stage) {
        self.total += 1;
        match stage {
            Stage::Pending => self.pending += 1,
            Stage::Approved => self.approved += 1,
            Stage::Funded => self.funded += 1,
            Stage::Declined => self.declined += 1,
        }
    }

    pub fn tally(stages: impl IntoIterator<Item = Stage>) -> Self {
        let mut stats = Self::default();
        for stage in stages {
            stats.record(stage);
        }
        stats
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealerSummary {
    #[serde(flatten)]
    pub dealer: Dealer,
    pub stats: DealerStats,
}

#[derive(Clone)]
pub struct DealerDirectory {
    db: Arc<DatabaseConnection>,
}

impl DealerDirectory {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Dealers by name, each with counts of its deals per stage.
    pub async fn directory(&self) -> CrmResult<Vec<DealerSummary>> {
        let db = self.db.as_ref();
        let dealers: Vec<Dealer> = list_on(db, Condition::all()).await?;
        let deals: Vec<Deal> = list_on(db, Condition::all()).await?;

        let mut stats: HashMap<Uuid, DealerStats> = HashMap::new();
        for deal in deals {
            if let Some(dealer_id) = deal.dealer_id {
                stats.entry(dealer_id).or_default().record(deal.stage);
            }
        }
        Ok(dealers
            .into_iter()
            .map(|dealer| DealerSummary {
                stats: stats.remove(&dealer.id).unwrap_or_default(),
                dealer,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_pending_one_approved() {
        let stats = DealerStats::tally([Stage::Pending, Stage::Approved, Stage::Pending]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.funded, 0);
    }
}
