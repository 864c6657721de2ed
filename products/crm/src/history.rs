//! Append-only stage audit trail and the transactional stage change built on it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde::Serialize;
use tracing::{Instrument, info_span};
use uuid::Uuid;

use crate::error::{CrmError, CrmResult};
use crate::model::{Deal, DealActivity, DealHistoryEntry, Stage};
use crate::repository::{find_on, insert_on, list_on, upsert_on};

pub const STAGE_CHANGE_ACTIVITY: &str = "stage_change";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageChange {
    pub deal: Deal,
    /// `None` when the deal was already in the requested stage.
    pub entry: Option<DealHistoryEntry>,
}

#[derive(Clone)]
pub struct StageRecorder {
    db: Arc<DatabaseConnection>,
}

impl StageRecorder {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Appends one entry. Does not read or validate the deal's current stage.
    pub async fn record_transition(
        &self,
        deal_id: Uuid,
        stage: Stage,
        note: Option<String>,
    ) -> CrmResult<DealHistoryEntry> {
        append_history(self.db.as_ref(), deal_id, stage, note, Utc::now())
            .await
            .inspect_err(|err| tracing::error!(%deal_id, error = %err, "history append failed"))
    }

    /// Entries for one deal, oldest first.
    pub async fn history(&self, deal_id: Uuid) -> CrmResult<Vec<DealHistoryEntry>> {
        list_on(
            self.db.as_ref(),
            Condition::all().add(entity::deal_history::Column::DealId.eq(deal_id)),
        )
        .await
    }

    /// Moves a deal to `stage`, appending history and a `stage_change` activity atomically.
    pub async fn change_stage(
        &self,
        deal_id: Uuid,
        stage: Stage,
        note: Option<String>,
        actor: &str,
    ) -> CrmResult<StageChange> {
        let span = info_span!("crm.deals.change_stage", %deal_id, to = stage.as_str());
        self.change_stage_inner(deal_id, stage, note, actor)
            .instrument(span)
            .await
    }

    async fn change_stage_inner(
        &self,
        deal_id: Uuid,
        stage: Stage,
        note: Option<String>,
        actor: &str,
    ) -> CrmResult<StageChange> {
        let txn = self.db.begin().await?;
        let mut deal: Deal = find_on(&txn, deal_id)
            .await?
            .ok_or_else(|| CrmError::not_found("deal", deal_id))?;
        if deal.stage == stage {
            txn.rollback().await?;
            return Ok(StageChange { deal, entry: None });
        }

        let from = deal.stage;
        let now = Utc::now();
        deal.stage = stage;
        deal.updated_at = now;
        upsert_on(&txn, deal.clone()).await?;

        let entry = append_history(&txn, deal_id, stage, note, now).await?;
        let activity = DealActivity {
            id: Uuid::new_v4(),
            deal_id,
            kind: STAGE_CHANGE_ACTIVITY.to_string(),
            actor: actor.to_string(),
            detail: format!("Stage: {} -> {}", from.as_str(), stage.as_str()),
            created_at: now,
        };
        insert_on(&txn, activity).await?;

        txn.commit()
            .await
            .inspect_err(|err| tracing::error!(%deal_id, error = %err, "stage change commit failed"))?;
        tracing::info!(%deal_id, from = from.as_str(), to = stage.as_str(), "deal stage changed");
        Ok(StageChange {
            deal,
            entry: Some(entry),
        })
    }
}

pub(crate) async fn append_history<C: ConnectionTrait>(
    conn: &C,
    deal_id: Uuid,
    stage: Stage,
    note: Option<String>,
    at: DateTime<Utc>,
) -> CrmResult<DealHistoryEntry> {
    let entry = DealHistoryEntry {
        id: Uuid::new_v4(),
        deal_id,
        stage,
        note: note.filter(|n| !n.trim().is_empty()),
        created_at: at,
    };
    insert_on(conn, entry.clone()).await?;
    Ok(entry)
}
