use async_graphql::{Context, Json, Object};
use platform_api::ApiError;
use products_crm::checklist::{FundingItemPatch, NewFundingItem, NewStipulation, StipulationPatch};
use products_crm::dealer_notes::NewDealerNote;
use products_crm::history::StageChange;
use products_crm::model::{
    Account, Deal, DealActivity, DealDocument, DealNote, Dealer, DealerNote, FundingItem, Lender,
    Reminder, Role, Stipulation,
};
use products_crm::reminders::{NewReminder, ReminderPatch};
use tracing::instrument;
use uuid::Uuid;

use super::{DealStage, caller, engine, gql, require_admin, require_staff};

#[derive(Default)]
pub struct CrmMutation;

#[Object]
impl CrmMutation {
    /// Creates or replaces a deal. References to dealer, lender and account must exist, and
    /// an existing deal keeps its stage (use `changeStage`).
    async fn save_deal(&self, ctx: &Context<'_>, deal: Json<Deal>) -> async_graphql::Result<Json<Deal>> {
        require_staff(ctx)?;
        let saved = engine(ctx)?.repo.save_deal(deal.0).await.map_err(gql)?;
        Ok(Json(saved))
    }

    #[instrument(name = "graphql.crm.change_stage", skip_all, fields(%deal_id))]
    async fn change_stage(
        &self,
        ctx: &Context<'_>,
        deal_id: Uuid,
        stage: DealStage,
        note: Option<String>,
    ) -> async_graphql::Result<Json<StageChange>> {
        let actor = require_staff(ctx)?.display_name();
        let change = engine(ctx)?
            .history
            .change_stage(deal_id, stage.into(), note, &actor)
            .await
            .map_err(gql)?;
        Ok(Json(change))
    }

    /// Hard delete of a deal and everything attached to it. Admins only.
    async fn delete_deal(&self, ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<bool> {
        let admin = require_admin(ctx)?;
        let removed = engine(ctx)?.satellites.delete_deal(id).await.map_err(gql)?;
        tracing::info!(deal_id = %id, by = %admin.id(), removed, "deal delete requested");
        Ok(removed)
    }

    async fn save_dealer(&self, ctx: &Context<'_>, dealer: Json<Dealer>) -> async_graphql::Result<Json<Dealer>> {
        require_staff(ctx)?;
        let saved = engine(ctx)?.repo.save_dealer(dealer.0).await.map_err(gql)?;
        Ok(Json(saved))
    }

    async fn save_lender(&self, ctx: &Context<'_>, lender: Json<Lender>) -> async_graphql::Result<Json<Lender>> {
        require_staff(ctx)?;
        let saved = engine(ctx)?.repo.save_lender(lender.0).await.map_err(gql)?;
        Ok(Json(saved))
    }

    async fn save_account(&self, ctx: &Context<'_>, account: Json<Account>) -> async_graphql::Result<Json<Account>> {
        require_staff(ctx)?;
        let saved = engine(ctx)?.repo.save_account(account.0).await.map_err(gql)?;
        Ok(Json(saved))
    }

    async fn set_dealer_password(
        &self,
        ctx: &Context<'_>,
        dealer_id: Uuid,
        password: String,
    ) -> async_graphql::Result<bool> {
        require_admin(ctx)?;
        engine(ctx)?
            .credentials
            .set_dealer_password(dealer_id, &password)
            .await
            .map_err(gql)?;
        Ok(true)
    }

    async fn add_stip(
        &self,
        ctx: &Context<'_>,
        deal_id: Uuid,
        input: Json<NewStipulation>,
    ) -> async_graphql::Result<Json<Stipulation>> {
        require_staff(ctx)?;
        let stip = engine(ctx)?.checklists.add_stip(deal_id, input.0).await.map_err(gql)?;
        Ok(Json(stip))
    }

    async fn update_stip(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        patch: Json<StipulationPatch>,
    ) -> async_graphql::Result<Json<Stipulation>> {
        require_staff(ctx)?;
        let stip = engine(ctx)?.checklists.update_stip(id, patch.0).await.map_err(gql)?;
        Ok(Json(stip))
    }

    async fn remove_stip(&self, ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<bool> {
        require_staff(ctx)?;
        engine(ctx)?.checklists.remove_stip(id).await.map_err(gql)
    }

    async fn add_funding_item(
        &self,
        ctx: &Context<'_>,
        deal_id: Uuid,
        input: Json<NewFundingItem>,
    ) -> async_graphql::Result<Json<FundingItem>> {
        require_staff(ctx)?;
        let item = engine(ctx)?
            .checklists
            .add_funding_item(deal_id, input.0)
            .await
            .map_err(gql)?;
        Ok(Json(item))
    }

    async fn update_funding_item(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        patch: Json<FundingItemPatch>,
    ) -> async_graphql::Result<Json<FundingItem>> {
        require_staff(ctx)?;
        let item = engine(ctx)?
            .checklists
            .update_funding_item(id, patch.0)
            .await
            .map_err(gql)?;
        Ok(Json(item))
    }

    async fn remove_funding_item(&self, ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<bool> {
        require_staff(ctx)?;
        engine(ctx)?.checklists.remove_funding_item(id).await.map_err(gql)
    }

    /// Adds whichever system-required funding items the deal is missing.
    async fn seed_funding_checklist(
        &self,
        ctx: &Context<'_>,
        deal_id: Uuid,
    ) -> async_graphql::Result<Json<Vec<FundingItem>>> {
        require_staff(ctx)?;
        let created = engine(ctx)?
            .checklists
            .seed_funding_checklist(deal_id)
            .await
            .map_err(gql)?;
        Ok(Json(created))
    }

    async fn assign_dealer(
        &self,
        ctx: &Context<'_>,
        deal_id: Uuid,
        dealer_id: Uuid,
    ) -> async_graphql::Result<Json<Deal>> {
        require_staff(ctx)?;
        let (deal, _note) = engine(ctx)?
            .inbox
            .assign_dealer(deal_id, dealer_id)
            .await
            .map_err(gql)?;
        Ok(Json(deal))
    }

    async fn flag_for_dealer(
        &self,
        ctx: &Context<'_>,
        deal_id: Uuid,
        text: String,
    ) -> async_graphql::Result<Json<DealerNote>> {
        require_staff(ctx)?;
        let note = engine(ctx)?
            .inbox
            .flag_for_dealer(deal_id, &text)
            .await
            .map_err(gql)?;
        Ok(Json(note))
    }

    async fn post_dealer_note(
        &self,
        ctx: &Context<'_>,
        input: Json<NewDealerNote>,
    ) -> async_graphql::Result<Json<DealerNote>> {
        require_staff(ctx)?;
        let note = engine(ctx)?.inbox.post(input.0).await.map_err(gql)?;
        Ok(Json(note))
    }

    /// Marks one note read. Dealers may only touch their own notes.
    async fn dismiss_dealer_note(&self, ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<bool> {
        let caller = caller(ctx)?;
        let crm = engine(ctx)?;
        if !caller.role().is_staff() {
            let note: DealerNote = crm.repo.get(id).await.map_err(gql)?;
            caller.dealer_scope(Some(note.dealer_id)).map_err(gql)?;
        }
        crm.inbox.dismiss(id).await.map_err(gql)?;
        Ok(true)
    }

    /// Marks unread notes read. Staff clear everything unless a dealer is named; a dealer
    /// clears only their own. Returns how many notes changed.
    async fn dismiss_all_dealer_notes(
        &self,
        ctx: &Context<'_>,
        dealer_id: Option<Uuid>,
    ) -> async_graphql::Result<u64> {
        let caller = caller(ctx)?;
        let inbox = &engine(ctx)?.inbox;
        let changed = match (caller.role(), dealer_id) {
            (role, None) if role.is_staff() => inbox.dismiss_all().await,
            (Role::Customer, _) => return Err(gql(ApiError::Forbidden)),
            (_, requested) => {
                let dealer_id = caller.dealer_scope(requested).map_err(gql)?;
                inbox.dismiss_all_for_dealer(dealer_id).await
            }
        };
        changed.map_err(gql)
    }

    async fn add_reminder(
        &self,
        ctx: &Context<'_>,
        input: Json<NewReminder>,
    ) -> async_graphql::Result<Json<Reminder>> {
        let owner = require_staff(ctx)?.id();
        let reminder = engine(ctx)?.reminders.add(owner, input.0).await.map_err(gql)?;
        Ok(Json(reminder))
    }

    async fn update_reminder(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        patch: Json<ReminderPatch>,
    ) -> async_graphql::Result<Json<Reminder>> {
        let crm = engine(ctx)?;
        own_reminder(ctx, id).await?;
        let reminder = crm.reminders.update(id, patch.0).await.map_err(gql)?;
        Ok(Json(reminder))
    }

    async fn remove_reminder(&self, ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<bool> {
        own_reminder(ctx, id).await?;
        engine(ctx)?.reminders.remove(id).await.map_err(gql)
    }

    async fn add_deal_note(
        &self,
        ctx: &Context<'_>,
        deal_id: Uuid,
        text: String,
    ) -> async_graphql::Result<Json<DealNote>> {
        let author = require_staff(ctx)?.display_name();
        let note = engine(ctx)?
            .satellites
            .add_note(deal_id, &text, Some(&author))
            .await
            .map_err(gql)?;
        Ok(Json(note))
    }

    async fn set_deal_note_pinned(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        pinned: bool,
    ) -> async_graphql::Result<Json<DealNote>> {
        require_staff(ctx)?;
        let note = engine(ctx)?.satellites.set_pinned(id, pinned).await.map_err(gql)?;
        Ok(Json(note))
    }

    async fn log_deal_activity(
        &self,
        ctx: &Context<'_>,
        deal_id: Uuid,
        kind: String,
        detail: String,
    ) -> async_graphql::Result<Json<DealActivity>> {
        let actor = require_staff(ctx)?.display_name();
        let activity = engine(ctx)?
            .satellites
            .log_deal_activity(deal_id, &kind, &actor, &detail)
            .await
            .map_err(gql)?;
        Ok(Json(activity))
    }

    async fn add_document(
        &self,
        ctx: &Context<'_>,
        deal_id: Uuid,
        doc_id: String,
        name: String,
        file_url: Option<String>,
    ) -> async_graphql::Result<Json<DealDocument>> {
        let uploader = require_staff(ctx)?.display_name();
        let document = engine(ctx)?
            .satellites
            .add_document(deal_id, &doc_id, &name, Some(&uploader), file_url.as_deref())
            .await
            .map_err(gql)?;
        Ok(Json(document))
    }

    async fn remove_document(
        &self,
        ctx: &Context<'_>,
        deal_id: Uuid,
        doc_id: String,
    ) -> async_graphql::Result<bool> {
        require_staff(ctx)?;
        engine(ctx)?
            .satellites
            .remove_document(deal_id, &doc_id)
            .await
            .map_err(gql)
    }

    /// Promotes a submitted application to a pending deal.
    async fn open_application(
        &self,
        ctx: &Context<'_>,
        application_id: Uuid,
    ) -> async_graphql::Result<Json<Deal>> {
        let actor = require_staff(ctx)?.display_name();
        let deal = engine(ctx)?
            .intake
            .open_deal(application_id, &actor)
            .await
            .map_err(gql)?;
        Ok(Json(deal))
    }
}

async fn own_reminder(ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<()> {
    let owner = require_staff(ctx)?.id();
    let reminder: Reminder = engine(ctx)?.repo.get(id).await.map_err(gql)?;
    if reminder.user_id != owner {
        return Err(gql(ApiError::Forbidden));
    }
    Ok(())
}
