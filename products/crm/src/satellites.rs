//! Activities, documents and internal notes hanging off deals and accounts.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
};
use uuid::Uuid;

use crate::error::{CrmError, CrmResult, require_text};
use crate::loader::group_by_parent;
use crate::model::{Account, AccountActivity, Deal, DealActivity, DealDocument, DealNote};
use crate::repository::{Repository, get_on, insert_on, list_on};

pub const DEFAULT_NOTE_AUTHOR: &str = "admin";

#[derive(Clone)]
pub struct Satellites {
    db: Arc<DatabaseConnection>,
    repo: Repository,
}

impl Satellites {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            repo: Repository::new(db.clone()),
            db,
        }
    }

    pub async fn log_deal_activity(
        &self,
        deal_id: Uuid,
        kind: &str,
        actor: &str,
        detail: &str,
    ) -> CrmResult<DealActivity> {
        require_text("type", kind)?;
        self.repo.get::<Deal>(deal_id).await?;
        let activity = DealActivity {
            id: Uuid::new_v4(),
            deal_id,
            kind: kind.trim().to_string(),
            actor: actor.to_string(),
            detail: detail.to_string(),
            created_at: Utc::now(),
        };
        insert_on(self.db.as_ref(), activity.clone()).await?;
        Ok(activity)
    }

    pub async fn log_account_activity(
        &self,
        account_id: Uuid,
        kind: &str,
        actor: &str,
        detail: &str,
    ) -> CrmResult<AccountActivity> {
        require_text("type", kind)?;
        self.repo.get::<Account>(account_id).await?;
        let activity = AccountActivity {
            id: Uuid::new_v4(),
            account_id,
            kind: kind.trim().to_string(),
            actor: actor.to_string(),
            detail: detail.to_string(),
            created_at: Utc::now(),
        };
        insert_on(self.db.as_ref(), activity.clone()).await?;
        Ok(activity)
    }

    /// `doc_id` is unique within a deal.
    pub async fn add_document(
        &self,
        deal_id: Uuid,
        doc_id: &str,
        name: &str,
        uploaded_by: Option<&str>,
        file_url: Option<&str>,
    ) -> CrmResult<DealDocument> {
        require_text("docId", doc_id)?;
        require_text("name", name)?;
        self.repo.get::<Deal>(deal_id).await?;
        let duplicate = entity::deal_documents::Entity::find()
            .filter(entity::deal_documents::Column::DealId.eq(deal_id))
            .filter(entity::deal_documents::Column::DocId.eq(doc_id))
            .one(self.db.as_ref())
            .await?;
        if duplicate.is_some() {
            return Err(CrmError::Conflict(format!(
                "document {doc_id} already attached to deal {deal_id}"
            )));
        }
        let document = DealDocument {
            id: Uuid::new_v4(),
            deal_id,
            doc_id: doc_id.to_string(),
            name: name.to_string(),
            uploaded_by: uploaded_by.map(str::to_string),
            file_url: file_url.filter(|u| !u.is_empty()).map(str::to_string),
            created_at: Utc::now(),
        };
        insert_on(self.db.as_ref(), document.clone())
            .await
            .inspect_err(|err| tracing::error!(%deal_id, doc_id, error = %err, "document insert failed"))?;
        Ok(document)
    }

    pub async fn remove_document(&self, deal_id: Uuid, doc_id: &str) -> CrmResult<bool> {
        let result = entity::deal_documents::Entity::delete_many()
            .filter(entity::deal_documents::Column::DealId.eq(deal_id))
            .filter(entity::deal_documents::Column::DocId.eq(doc_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn add_note(
        &self,
        deal_id: Uuid,
        text: &str,
        author: Option<&str>,
    ) -> CrmResult<DealNote> {
        require_text("text", text)?;
        self.repo.get::<Deal>(deal_id).await?;
        let note = DealNote {
            id: Uuid::new_v4(),
            deal_id,
            text: text.trim().to_string(),
            author: author
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .unwrap_or(DEFAULT_NOTE_AUTHOR)
                .to_string(),
            pinned: false,
            created_at: Utc::now(),
        };
        insert_on(self.db.as_ref(), note.clone()).await?;
        Ok(note)
    }

    /// Every note grouped by deal, newest first within each group.
    pub async fn notes_by_deal(&self) -> CrmResult<HashMap<Uuid, Vec<DealNote>>> {
        let notes: Vec<DealNote> = list_on(self.db.as_ref(), Condition::all()).await?;
        Ok(group_by_parent(notes, |n| n.deal_id))
    }

    pub async fn notes_for_deal(&self, deal_id: Uuid) -> CrmResult<Vec<DealNote>> {
        list_on(
            self.db.as_ref(),
            Condition::all().add(entity::deal_notes::Column::DealId.eq(deal_id)),
        )
        .await
    }

    pub async fn set_pinned(&self, note_id: Uuid, pinned: bool) -> CrmResult<DealNote> {
        entity::deal_notes::Entity::update_many()
            .col_expr(entity::deal_notes::Column::Pinned, Expr::value(pinned))
            .filter(entity::deal_notes::Column::Id.eq(note_id))
            .exec(self.db.as_ref())
            .await?;
        get_on(self.db.as_ref(), note_id).await
    }

    /// Hard-deletes a deal and everything it owns in one transaction. Dealer notes and
    /// reminders keep their snapshot and are left alone.
    pub async fn delete_deal(&self, deal_id: Uuid) -> CrmResult<bool> {
        let txn = self.db.begin().await?;
        entity::deal_history::Entity::delete_many()
            .filter(entity::deal_history::Column::DealId.eq(deal_id))
            .exec(&txn)
            .await?;
        entity::deal_activities::Entity::delete_many()
            .filter(entity::deal_activities::Column::DealId.eq(deal_id))
            .exec(&txn)
            .await?;
        entity::deal_documents::Entity::delete_many()
            .filter(entity::deal_documents::Column::DealId.eq(deal_id))
            .exec(&txn)
            .await?;
        entity::deal_stips::Entity::delete_many()
            .filter(entity::deal_stips::Column::DealId.eq(deal_id))
            .exec(&txn)
            .await?;
        entity::deal_funding_items::Entity::delete_many()
            .filter(entity::deal_funding_items::Column::DealId.eq(deal_id))
            .exec(&txn)
            .await?;
        entity::deal_notes::Entity::delete_many()
            .filter(entity::deal_notes::Column::DealId.eq(deal_id))
            .exec(&txn)
            .await?;
        let removed = entity::deals::Entity::delete_by_id(deal_id).exec(&txn).await?;
        txn.commit()
            .await
            .inspect_err(|err| tracing::error!(%deal_id, error = %err, "deal delete commit failed"))?;
        tracing::info!(%deal_id, removed = removed.rows_affected, "deal deleted");
        Ok(removed.rows_affected > 0)
    }
}
