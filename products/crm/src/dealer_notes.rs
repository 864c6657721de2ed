//! One-way mailbox of short messages for dealers.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CrmError, CrmResult, require_text};
use crate::model::{Deal, Dealer, DealerNote};
use crate::repository::{Repository, insert_on, list_on};

use entity::dealer_notes::Column;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDealerNote {
    pub dealer_id: Uuid,
    pub deal_id: Option<Uuid>,
    pub text: String,
}

#[derive(Clone)]
pub struct DealerInbox {
    db: Arc<DatabaseConnection>,
    repo: Repository,
}

impl DealerInbox {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            repo: Repository::new(db.clone()),
            db,
        }
    }

    /// Posts an unread note; the dealer name is snapshotted from the dealer record.
    pub async fn post(&self, note: NewDealerNote) -> CrmResult<DealerNote> {
        require_text("text", &note.text)?;
        let dealer: Dealer = self.repo.reference(note.dealer_id).await?;
        if let Some(deal_id) = note.deal_id {
            self.repo.reference::<Deal>(deal_id).await?;
        }
        let stored = DealerNote {
            id: Uuid::new_v4(),
            deal_id: note.deal_id,
            dealer_id: dealer.id,
            dealer_name: dealer.name,
            text: note.text.trim().to_string(),
            read: false,
            created_at: Utc::now(),
        };
        insert_on(self.db.as_ref(), stored.clone())
            .await
            .inspect_err(|err| tracing::error!(dealer_id = %stored.dealer_id, error = %err, "dealer note insert failed"))?;
        Ok(stored)
    }

    /// Marks one note read. Already-read notes stay read.
    pub async fn dismiss(&self, id: Uuid) -> CrmResult<()> {
        let result = entity::dealer_notes::Entity::update_many()
            .col_expr(Column::Read, Expr::value(true))
            .filter(Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(CrmError::not_found("dealer note", id));
        }
        Ok(())
    }

    /// Marks every unread note read, system-wide. Returns how many flipped.
    pub async fn dismiss_all(&self) -> CrmResult<u64> {
        self.mark_read(Condition::all()).await
    }

    pub async fn dismiss_all_for_dealer(&self, dealer_id: Uuid) -> CrmResult<u64> {
        self.mark_read(Condition::all().add(Column::DealerId.eq(dealer_id)))
            .await
    }

    async fn mark_read(&self, scope: Condition) -> CrmResult<u64> {
        let result = entity::dealer_notes::Entity::update_many()
            .col_expr(Column::Read, Expr::value(true))
            .filter(scope.add(Column::Read.eq(false)))
            .exec(self.db.as_ref())
            .await
            .inspect_err(|err| tracing::error!(error = %err, "dismiss failed"))?;
        Ok(result.rows_affected)
    }

    /// Newest first; `None` lists every dealer's notes.
    pub async fn list(&self, dealer_id: Option<Uuid>) -> CrmResult<Vec<DealerNote>> {
        let mut filter = Condition::all();
        if let Some(dealer_id) = dealer_id {
            filter = filter.add(Column::DealerId.eq(dealer_id));
        }
        list_on(self.db.as_ref(), filter).await
    }

    pub async fn unread_count(&self, dealer_id: Uuid) -> CrmResult<u64> {
        let count = entity::dealer_notes::Entity::find()
            .filter(Column::DealerId.eq(dealer_id))
            .filter(Column::Read.eq(false))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    /// Re-points a deal at `dealer_id` and tells the dealer about it.
    pub async fn assign_dealer(&self, deal_id: Uuid, dealer_id: Uuid) -> CrmResult<(Deal, DealerNote)> {
        let mut deal: Deal = self.repo.get(deal_id).await?;
        let dealer: Dealer = self.repo.reference(dealer_id).await?;
        deal.dealer_id = Some(dealer.id);
        deal.dealer_name = Some(dealer.name.clone());
        let deal = self.repo.save_deal(deal).await?;
        let note = self
            .post(NewDealerNote {
                dealer_id,
                deal_id: Some(deal_id),
                text: format!("Deal assigned: {}", deal.biz),
            })
            .await?;
        Ok((deal, note))
    }

    /// Posts a free-text note about a deal to the deal's dealer.
    pub async fn flag_for_dealer(&self, deal_id: Uuid, text: &str) -> CrmResult<DealerNote> {
        let deal: Deal = self.repo.get(deal_id).await?;
        let dealer_id = deal
            .dealer_id
            .ok_or_else(|| CrmError::invalid(format!("deal {deal_id} has no dealer")))?;
        self.post(NewDealerNote {
            dealer_id,
            deal_id: Some(deal_id),
            text: text.to_string(),
        })
        .await
    }
}
