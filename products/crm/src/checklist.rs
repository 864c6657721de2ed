//! Stipulations (pre-approval) and funding items (pre-funding) attached to a deal.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CrmError, CrmResult, require_text};
use crate::model::{Category, Deal, FundingItem, Lender, Stipulation, Visibility};
use crate::repository::{Record, delete_on, find_on, get_on, insert_on, list_on, upsert_on};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStipulation {
    pub text: String,
    #[serde(default)]
    pub done: bool,
    pub visibility: Option<Visibility>,
    pub category: Option<Category>,
    #[serde(default)]
    pub auto: bool,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFundingItem {
    pub text: String,
    #[serde(default)]
    pub done: bool,
    pub category: Option<Category>,
    #[serde(default)]
    pub auto: bool,
}

/// Fields an update may touch. `auto` is deliberately absent.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StipulationPatch {
    pub text: Option<String>,
    pub done: Option<bool>,
    pub resolved_by: Option<String>,
    pub file_url: Option<String>,
    pub visibility: Option<Visibility>,
    pub category: Option<Category>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingItemPatch {
    pub text: Option<String>,
    pub done: Option<bool>,
    pub file_url: Option<String>,
    pub category: Option<Category>,
}

pub trait ChecklistPatch<T> {
    /// Applies the patch and reports whether anything changed.
    fn apply(&self, item: &mut T) -> bool;

    fn text(&self) -> Option<&str>;
}

fn assign<V: PartialEq + Clone>(slot: &mut V, value: Option<&V>) -> bool {
    match value {
        Some(v) if slot != v => {
            *slot = v.clone();
            true
        }
        _ => false,
    }
}

fn assign_opt<V: PartialEq + Clone>(slot: &mut Option<V>, value: Option<&V>) -> bool {
    match value {
        Some(v) if slot.as_ref() != Some(v) => {
            *slot = Some(v.clone());
            true
        }
        _ => false,
    }
}

impl ChecklistPatch<Stipulation> for StipulationPatch {
    fn apply(&self, item: &mut Stipulation) -> bool {
        // Non-short-circuiting `|` so every field is applied.
        assign(&mut item.text, self.text.as_ref())
            | assign(&mut item.done, self.done.as_ref())
            | assign_opt(&mut item.resolved_by, self.resolved_by.as_ref())
            | assign_opt(&mut item.file_url, self.file_url.as_ref())
            | assign(&mut item.visibility, self.visibility.as_ref())
            | assign_opt(&mut item.category, self.category.as_ref())
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl ChecklistPatch<FundingItem> for FundingItemPatch {
    fn apply(&self, item: &mut FundingItem) -> bool {
        assign(&mut item.text, self.text.as_ref())
            | assign(&mut item.done, self.done.as_ref())
            | assign_opt(&mut item.file_url, self.file_url.as_ref())
            | assign_opt(&mut item.category, self.category.as_ref())
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// Who is reading a checklist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Audience {
    Staff,
    Dealer,
    Customer,
}

impl Stipulation {
    pub fn visible_to(&self, audience: Audience) -> bool {
        match audience {
            Audience::Staff => true,
            Audience::Dealer => self.visibility != Visibility::Internal,
            Audience::Customer => self.visibility == Visibility::All,
        }
    }
}

pub const SIGNED_DOCUMENTS: &str = "Signed financing documents";
pub const VENDOR_INVOICE: &str = "Vendor invoice";
pub const INSURANCE_LISTS_YMM: &str = "Insurance lists equipment year, make and model";
pub const INSURANCE_LISTS_VIN: &str = "Insurance lists VIN / serial number";

/// Funding items every deal needs, plus the insurance items the lender demands.
pub fn required_funding_items(lender: Option<&Lender>) -> Vec<(String, Category)> {
    let mut items = vec![
        (SIGNED_DOCUMENTS.to_string(), Category::Documents),
        (VENDOR_INVOICE.to_string(), Category::Equipment),
    ];
    let Some(lender) = lender else {
        return items;
    };
    if let Some(lienholder) = lender
        .lienholder
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        items.push((
            format!("Insurance certificate naming {lienholder} as lienholder"),
            Category::Insurance,
        ));
    }
    if lender.ins_list_ymm {
        items.push((INSURANCE_LISTS_YMM.to_string(), Category::Insurance));
    }
    if lender.ins_list_vin {
        items.push((INSURANCE_LISTS_VIN.to_string(), Category::Insurance));
    }
    items
}

fn normalized(text: &str) -> String {
    text.trim().to_lowercase()
}

#[derive(Clone)]
pub struct Checklists {
    db: Arc<DatabaseConnection>,
}

impl Checklists {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn ensure_deal(&self, deal_id: Uuid) -> CrmResult<Deal> {
        find_on::<Deal, _>(self.db.as_ref(), deal_id)
            .await?
            .ok_or_else(|| CrmError::not_found("deal", deal_id))
    }

    pub async fn add_stip(&self, deal_id: Uuid, new: NewStipulation) -> CrmResult<Stipulation> {
        require_text("text", &new.text)?;
        self.ensure_deal(deal_id).await?;
        let stip = Stipulation {
            id: Uuid::new_v4(),
            deal_id,
            text: new.text.trim().to_string(),
            done: new.done,
            resolved_by: None,
            file_url: None,
            visibility: new.visibility.unwrap_or_default(),
            category: new.category,
            auto: new.auto,
            added_at: Utc::now(),
        };
        insert_on(self.db.as_ref(), stip.clone())
            .await
            .inspect_err(|err| tracing::error!(%deal_id, error = %err, "stip insert failed"))?;
        Ok(stip)
    }

    pub async fn add_funding_item(
        &self,
        deal_id: Uuid,
        new: NewFundingItem,
    ) -> CrmResult<FundingItem> {
        require_text("text", &new.text)?;
        self.ensure_deal(deal_id).await?;
        let item = FundingItem {
            id: Uuid::new_v4(),
            deal_id,
            text: new.text.trim().to_string(),
            done: new.done,
            file_url: None,
            category: new.category,
            auto: new.auto,
            added_at: Utc::now(),
        };
        insert_on(self.db.as_ref(), item.clone())
            .await
            .inspect_err(|err| tracing::error!(%deal_id, error = %err, "funding item insert failed"))?;
        Ok(item)
    }

    pub async fn update_stip(&self, id: Uuid, patch: StipulationPatch) -> CrmResult<Stipulation> {
        self.update(id, &patch).await
    }

    pub async fn update_funding_item(
        &self,
        id: Uuid,
        patch: FundingItemPatch,
    ) -> CrmResult<FundingItem> {
        self.update(id, &patch).await
    }

    async fn update<T, P>(&self, id: Uuid, patch: &P) -> CrmResult<T>
    where
        T: Record,
        P: ChecklistPatch<T>,
    {
        if let Some(text) = patch.text() {
            require_text("text", text)?;
        }
        let mut item: T = get_on(self.db.as_ref(), id).await?;
        if !patch.apply(&mut item) {
            tracing::debug!(kind = T::KIND, %id, "checklist update changes nothing");
            return Ok(item);
        }
        upsert_on(self.db.as_ref(), item)
            .await
            .inspect_err(|err| tracing::error!(kind = T::KIND, %id, error = %err, "checklist update failed"))?;
        get_on(self.db.as_ref(), id).await
    }

    pub async fn remove_stip(&self, id: Uuid) -> CrmResult<bool> {
        delete_on::<Stipulation, _>(self.db.as_ref(), id).await
    }

    pub async fn remove_funding_item(&self, id: Uuid) -> CrmResult<bool> {
        delete_on::<FundingItem, _>(self.db.as_ref(), id).await
    }

    pub async fn stips(&self, deal_id: Uuid) -> CrmResult<Vec<Stipulation>> {
        list_on(
            self.db.as_ref(),
            Condition::all().add(entity::deal_stips::Column::DealId.eq(deal_id)),
        )
        .await
    }

    pub async fn funding_items(&self, deal_id: Uuid) -> CrmResult<Vec<FundingItem>> {
        list_on(
            self.db.as_ref(),
            Condition::all().add(entity::deal_funding_items::Column::DealId.eq(deal_id)),
        )
        .await
    }

    /// Adds the system-required funding items (flagged `auto`) that the deal lacks.
    /// Returns only the items created by this call.
    pub async fn seed_funding_checklist(&self, deal_id: Uuid) -> CrmResult<Vec<FundingItem>> {
        let deal = self.ensure_deal(deal_id).await?;
        let lender = match deal.lender_id {
            Some(lender_id) => find_on::<Lender, _>(self.db.as_ref(), lender_id).await?,
            None => None,
        };
        let existing: HashSet<String> = self
            .funding_items(deal_id)
            .await?
            .iter()
            .map(|item| normalized(&item.text))
            .collect();

        let mut created = Vec::new();
        for (text, category) in required_funding_items(lender.as_ref()) {
            if existing.contains(&normalized(&text)) {
                continue;
            }
            let item = self
                .add_funding_item(
                    deal_id,
                    NewFundingItem {
                        text,
                        done: false,
                        category: Some(category),
                        auto: true,
                    },
                )
                .await?;
            created.push(item);
        }
        tracing::info!(%deal_id, created = created.len(), "funding checklist seeded");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stip(visibility: Visibility) -> Stipulation {
        Stipulation {
            id: Uuid::new_v4(),
            deal_id: Uuid::new_v4(),
            text: "Driver license".into(),
            done: false,
            resolved_by: None,
            file_url: None,
            visibility,
            category: Some(Category::Identity),
            auto: false,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn remarking_done_is_not_a_change() {
        let mut item = stip(Visibility::All);
        item.done = true;
        let patch = StipulationPatch {
            done: Some(true),
            ..Default::default()
        };
        let before = item.clone();
        assert!(!patch.apply(&mut item));
        assert_eq!(item, before);
    }

    #[test]
    fn patch_applies_every_field() {
        let mut item = stip(Visibility::All);
        let patch = StipulationPatch {
            done: Some(true),
            resolved_by: Some("kim".into()),
            visibility: Some(Visibility::Internal),
            ..Default::default()
        };
        assert!(patch.apply(&mut item));
        assert!(item.done);
        assert_eq!(item.resolved_by.as_deref(), Some("kim"));
        assert_eq!(item.visibility, Visibility::Internal);
    }

    #[test]
    fn audiences_filter_visibility() {
        let all = stip(Visibility::All);
        let dealer = stip(Visibility::Dealer);
        let internal = stip(Visibility::Internal);
        assert!(internal.visible_to(Audience::Staff));
        assert!(dealer.visible_to(Audience::Dealer));
        assert!(!internal.visible_to(Audience::Dealer));
        assert!(all.visible_to(Audience::Customer));
        assert!(!dealer.visible_to(Audience::Customer));
    }

    #[test]
    fn lender_drives_required_items() {
        assert_eq!(required_funding_items(None).len(), 2);

        let mut lender = Lender::new("Prairie Capital");
        lender.lienholder = Some("Prairie Capital LLC".into());
        lender.ins_list_vin = true;
        let items = required_funding_items(Some(&lender));
        let texts: Vec<&str> = items.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(items.len(), 4);
        assert!(texts.contains(&INSURANCE_LISTS_VIN));
        assert!(!texts.contains(&INSURANCE_LISTS_YMM));
        assert!(texts.iter().any(|t| t.contains("Prairie Capital LLC")));
    }
}
