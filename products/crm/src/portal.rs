//! Read models for the dealer and customer portals. Visibility is enforced here.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde::Serialize;
use uuid::Uuid;

use crate::checklist::Audience;
use crate::dealer_notes::DealerInbox;
use crate::dealers::DealerStats;
use crate::error::CrmResult;
use crate::intake::Intake;
use crate::loader::{ChildFailure, ComposedDeal, Loader};
use crate::model::{Application, Dealer, DealerNote};
use crate::repository::get_on;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealerPortal {
    pub dealer: Dealer,
    pub stats: DealerStats,
    pub deals: Vec<ComposedDeal>,
    pub notes: Vec<DealerNote>,
    pub unread: u64,
    pub failures: Vec<ChildFailure>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPortal {
    pub applications: Vec<Application>,
    pub deals: Vec<ComposedDeal>,
    pub failures: Vec<ChildFailure>,
}

/// Strips what `audience` may not see. Internal activity is staff-only.
pub fn redact(mut deal: ComposedDeal, audience: Audience) -> ComposedDeal {
    deal.stips.retain(|s| s.visible_to(audience));
    if audience != Audience::Staff {
        deal.activities.clear();
        deal.deal.notes = None;
    }
    deal
}

#[derive(Clone)]
pub struct Portals {
    db: Arc<DatabaseConnection>,
    loader: Loader,
    inbox: DealerInbox,
    intake: Intake,
}

impl Portals {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            loader: Loader::new(db.clone()),
            inbox: DealerInbox::new(db.clone()),
            intake: Intake::new(db.clone()),
            db,
        }
    }

    pub async fn dealer_portal(&self, dealer_id: Uuid) -> CrmResult<DealerPortal> {
        let dealer: Dealer = get_on(self.db.as_ref(), dealer_id).await?;
        let loaded = self.loader.load_deals_for_dealer(dealer_id).await?;
        let stats = DealerStats::tally(loaded.deals.iter().map(|d| d.deal.stage));
        let notes = self.inbox.list(Some(dealer_id)).await?;
        let unread = notes.iter().filter(|n| !n.read).count() as u64;
        Ok(DealerPortal {
            dealer,
            stats,
            deals: loaded
                .deals
                .into_iter()
                .map(|d| redact(d, Audience::Dealer))
                .collect(),
            notes,
            unread,
            failures: loaded.failures,
        })
    }

    pub async fn customer_portal(&self, email: &str) -> CrmResult<CustomerPortal> {
        let applications = self.intake.list_for_email(email).await?;
        let loaded = self.loader.load_deals_for_email(email).await?;
        Ok(CustomerPortal {
            applications,
            deals: loaded
                .deals
                .into_iter()
                .map(|d| redact(d, Audience::Customer))
                .collect(),
            failures: loaded.failures,
        })
    }
}
