use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CrmResult, require_text};
use crate::model::{Deal, Reminder};
use crate::repository::{Repository, delete_on, get_on, insert_on, list_on, upsert_on};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReminder {
    pub text: String,
    pub due_at: DateTime<Utc>,
    pub deal_id: Option<Uuid>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPatch {
    pub fired: Option<bool>,
    pub dismissed: Option<bool>,
    pub due_at: Option<DateTime<Utc>>,
}

/// Stores reminders; due-ness is evaluated by callers against their own clock.
#[derive(Clone)]
pub struct Reminders {
    db: Arc<DatabaseConnection>,
    repo: Repository,
}

impl Reminders {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            repo: Repository::new(db.clone()),
            db,
        }
    }

    pub async fn add(&self, owner: Uuid, new: NewReminder) -> CrmResult<Reminder> {
        require_text("text", &new.text)?;
        let deal_biz = match new.deal_id {
            Some(deal_id) => Some(self.repo.reference::<Deal>(deal_id).await?.biz),
            None => None,
        };
        let reminder = Reminder {
            id: Uuid::new_v4(),
            user_id: owner,
            text: new.text.trim().to_string(),
            due_at: new.due_at,
            deal_id: new.deal_id,
            deal_biz,
            fired: false,
            dismissed: false,
            created_at: Utc::now(),
        };
        insert_on(self.db.as_ref(), reminder.clone())
            .await
            .inspect_err(|err| tracing::error!(%owner, error = %err, "reminder insert failed"))?;
        Ok(reminder)
    }

    /// `fired` and `dismissed` are set independently; neither implies the other.
    pub async fn update(&self, id: Uuid, patch: ReminderPatch) -> CrmResult<Reminder> {
        let mut reminder: Reminder = get_on(self.db.as_ref(), id).await?;
        if let Some(fired) = patch.fired {
            reminder.fired = fired;
        }
        if let Some(dismissed) = patch.dismissed {
            reminder.dismissed = dismissed;
        }
        if let Some(due_at) = patch.due_at {
            reminder.due_at = due_at;
        }
        upsert_on(self.db.as_ref(), reminder.clone())
            .await
            .inspect_err(|err| tracing::error!(%id, error = %err, "reminder update failed"))?;
        Ok(reminder)
    }

    pub async fn remove(&self, id: Uuid) -> CrmResult<bool> {
        delete_on::<Reminder, _>(self.db.as_ref(), id).await
    }

    /// The owner's reminders ordered by due time.
    pub async fn list(&self, owner: Uuid) -> CrmResult<Vec<Reminder>> {
        list_on(
            self.db.as_ref(),
            Condition::all().add(entity::reminders::Column::UserId.eq(owner)),
        )
        .await
    }

    pub async fn needing_attention(&self, owner: Uuid, now: DateTime<Utc>) -> CrmResult<Vec<Reminder>> {
        let mut reminders = self.list(owner).await?;
        reminders.retain(|r| r.needs_attention(now));
        Ok(reminders)
    }
}
