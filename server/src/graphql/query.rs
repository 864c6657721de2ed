use std::collections::HashMap;

use async_graphql::{Context, Json, Object};
use chrono::Utc;
use platform_api::ApiError;
use products_crm::dealers::DealerSummary;
use products_crm::loader::{ComposedDeal, LoadedAccounts, LoadedDeals};
use products_crm::model::{Application, DealNote, DealerNote, Lender, Profile, Reminder, Role};
use products_crm::portal::{CustomerPortal, DealerPortal};
use tracing::instrument;
use uuid::Uuid;

use super::{caller, engine, gql, require_staff};

#[derive(Default)]
pub struct CrmQuery;

#[Object]
impl CrmQuery {
    /// The caller's own profile.
    async fn me(&self, ctx: &Context<'_>) -> async_graphql::Result<Json<Profile>> {
        Ok(Json(caller(ctx)?.profile.clone()))
    }

    /// Every deal with its child collections. `failures` lists any collection that could not
    /// be loaded; those come back empty on every deal.
    #[instrument(name = "graphql.crm.deals", skip_all)]
    async fn deals(&self, ctx: &Context<'_>) -> async_graphql::Result<Json<LoadedDeals>> {
        require_staff(ctx)?;
        let loaded = engine(ctx)?.loader.load_deals().await.map_err(gql)?;
        Ok(Json(loaded))
    }

    async fn deal(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
    ) -> async_graphql::Result<Option<Json<ComposedDeal>>> {
        require_staff(ctx)?;
        let deal = engine(ctx)?.loader.load_deal(id).await.map_err(gql)?;
        Ok(deal.map(Json))
    }

    async fn accounts(&self, ctx: &Context<'_>) -> async_graphql::Result<Json<LoadedAccounts>> {
        require_staff(ctx)?;
        let loaded = engine(ctx)?.loader.load_accounts().await.map_err(gql)?;
        Ok(Json(loaded))
    }

    async fn dealers(&self, ctx: &Context<'_>) -> async_graphql::Result<Json<Vec<DealerSummary>>> {
        require_staff(ctx)?;
        let directory = engine(ctx)?.dealers.directory().await.map_err(gql)?;
        Ok(Json(directory))
    }

    async fn lenders(&self, ctx: &Context<'_>) -> async_graphql::Result<Json<Vec<Lender>>> {
        require_staff(ctx)?;
        let lenders = engine(ctx)?.repo.all::<Lender>().await.map_err(gql)?;
        Ok(Json(lenders))
    }

    async fn applications(&self, ctx: &Context<'_>) -> async_graphql::Result<Json<Vec<Application>>> {
        require_staff(ctx)?;
        let applications = engine(ctx)?.intake.list().await.map_err(gql)?;
        Ok(Json(applications))
    }

    /// Notes for all deals, keyed by deal id, newest first within each deal.
    async fn deal_notes(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Json<HashMap<Uuid, Vec<DealNote>>>> {
        require_staff(ctx)?;
        let notes = engine(ctx)?.satellites.notes_by_deal().await.map_err(gql)?;
        Ok(Json(notes))
    }

    async fn dealer_notes(
        &self,
        ctx: &Context<'_>,
        dealer_id: Option<Uuid>,
    ) -> async_graphql::Result<Json<Vec<DealerNote>>> {
        require_staff(ctx)?;
        let notes = engine(ctx)?.inbox.list(dealer_id).await.map_err(gql)?;
        Ok(Json(notes))
    }

    /// A dealer's portal. Dealers only ever see their own; staff must name the dealer.
    #[instrument(name = "graphql.crm.dealer_portal", skip_all)]
    async fn dealer_portal(
        &self,
        ctx: &Context<'_>,
        dealer_id: Option<Uuid>,
    ) -> async_graphql::Result<Json<DealerPortal>> {
        let dealer_id = caller(ctx)?.dealer_scope(dealer_id).map_err(gql)?;
        let portal = engine(ctx)?
            .portals
            .dealer_portal(dealer_id)
            .await
            .map_err(gql)?;
        Ok(Json(portal))
    }

    /// A customer's applications and deals, matched by email. Customers use their own.
    async fn customer_portal(
        &self,
        ctx: &Context<'_>,
        email: Option<String>,
    ) -> async_graphql::Result<Json<CustomerPortal>> {
        let caller = caller(ctx)?;
        let email = match (caller.role(), email) {
            (role, Some(email)) if role.is_staff() => email,
            (Role::Customer, _) => caller
                .profile
                .email
                .clone()
                .ok_or_else(|| gql(ApiError::invalid("profile has no email")))?,
            _ => return Err(gql(ApiError::Forbidden)),
        };
        let portal = engine(ctx)?
            .portals
            .customer_portal(&email)
            .await
            .map_err(gql)?;
        Ok(Json(portal))
    }

    /// The caller's reminders, soonest first.
    async fn reminders(&self, ctx: &Context<'_>) -> async_graphql::Result<Json<Vec<Reminder>>> {
        let owner = require_staff(ctx)?.id();
        let reminders = engine(ctx)?.reminders.list(owner).await.map_err(gql)?;
        Ok(Json(reminders))
    }

    /// Reminders that are due now and neither fired nor dismissed.
    async fn due_reminders(&self, ctx: &Context<'_>) -> async_graphql::Result<Json<Vec<Reminder>>> {
        let owner = require_staff(ctx)?.id();
        let due = engine(ctx)?
            .reminders
            .needing_attention(owner, Utc::now())
            .await
            .map_err(gql)?;
        Ok(Json(due))
    }
}
