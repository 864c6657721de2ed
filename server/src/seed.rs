use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Args;
use platform_authn::JwtVerifier;
use platform_db::DbPool;
use products_crm::{
    Crm,
    checklist::NewStipulation,
    model::{Category, Deal, Dealer, Lender, Profile, Role, Stage, Visibility},
    reminders::NewReminder,
};
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;

#[derive(Args, Debug)]
pub struct SeedCommand {
    /// Also create an admin profile for this email and print a short-lived bearer token.
    #[arg(long)]
    admin_email: Option<String>,
}

pub async fn run(pool: DbPool, config: &AppConfig, cmd: SeedCommand) -> Result<()> {
    let crm = Crm::new(Arc::new(pool));

    let mut prairie = Lender::new("Prairie Capital");
    prairie.code = Some("PC".into());
    prairie.lienholder = Some("Prairie Capital LLC".into());
    prairie.ins_list_vin = true;
    prairie.ins_max_deductible = Some(2500.0);
    let prairie = crm.repo.save_lender(prairie).await?;
    crm.repo.save_lender(Lender::new("First Equipment Bank")).await?;

    let mut big_iron = Dealer::new("Big Iron Sales");
    big_iron.contact = Some("Dana Ruiz".into());
    big_iron.email = Some("dana@bigiron.example".into());
    let big_iron = crm.repo.save_dealer(big_iron).await?;
    let ridge = crm.repo.save_dealer(Dealer::new("Ridge Trucks")).await?;

    let mut paving = Deal::new("Acme Paving");
    paving.dealer_id = Some(big_iron.id);
    paving.lender_id = Some(prairie.id);
    paving.amount = 85_000.0;
    paving.eq_type = Some("Asphalt paver".into());
    paving.email = Some("ops@acmepaving.example".into());
    let paving = crm.repo.save_deal(paving).await?;

    let mut hauling = Deal::new("Northside Hauling");
    hauling.dealer_id = Some(ridge.id);
    hauling.amount = 42_500.0;
    let hauling = crm.repo.save_deal(hauling).await?;

    for (text, visibility, category) in [
        ("Last 3 months bank statements", Visibility::All, Category::Financials),
        ("Equipment quote from dealer", Visibility::Dealer, Category::Equipment),
        ("Credit committee memo", Visibility::Internal, Category::Credit),
    ] {
        crm.checklists
            .add_stip(
                paving.id,
                NewStipulation {
                    text: text.into(),
                    visibility: Some(visibility),
                    category: Some(category),
                    ..Default::default()
                },
            )
            .await?;
    }
    crm.history
        .change_stage(paving.id, Stage::Approved, Some("Approved at 60 months".into()), "seed")
        .await?;
    crm.checklists.seed_funding_checklist(paving.id).await?;
    crm.inbox
        .flag_for_dealer(hauling.id, "Please send the signed invoice")
        .await?;

    if let Some(email) = cmd.admin_email {
        let admin = Profile {
            id: Uuid::new_v4(),
            email: Some(email.trim().to_lowercase()),
            role: Role::Admin,
            full_name: Some("Seed Admin".into()),
            dealer_id: None,
            account_id: None,
            created_at: Utc::now(),
        };
        crm.repo.upsert(admin.clone()).await?;
        crm.reminders
            .add(
                admin.id,
                NewReminder {
                    text: "Follow up on Northside Hauling".into(),
                    due_at: Utc::now() + Duration::days(1),
                    deal_id: Some(hauling.id),
                },
            )
            .await?;
        let token = JwtVerifier::new(config.jwt_secret.clone())
            .issue(admin.id, admin.email.as_deref(), Duration::hours(12))
            .context("failed to mint admin token")?;
        println!("admin token: {token}");
    }

    info!(deals = 2, dealers = 2, lenders = 2, "seed data loaded");
    Ok(())
}
