use anyhow::Result;
use dealdesk_tests::PgTestContext;
use products_crm::{
    Crm, CrmError,
    checklist::{NewStipulation, StipulationPatch},
    intake::ApplicationForm,
    model::{Deal, Dealer, Stage},
};

#[tokio::test]
async fn stage_changes_on_postgres_keep_history_ordered() -> Result<()> {
    let Some(ctx) = PgTestContext::new().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let crm = Crm::new(ctx.db.clone());

    let dealer = crm.repo.save_dealer(Dealer::new("Big Iron Sales")).await?;
    let mut deal = Deal::new("Acme Paving");
    deal.dealer_id = Some(dealer.id);
    let deal = crm.repo.save_deal(deal).await?;

    for stage in [Stage::Approved, Stage::Funded] {
        crm.history.change_stage(deal.id, stage, None, "pg-test").await?;
    }
    let history = crm.history.history(deal.id).await?;
    let stages: Vec<Stage> = history.iter().map(|h| h.stage).collect();
    assert_eq!(stages, vec![Stage::Approved, Stage::Funded]);
    assert!(history[0].created_at <= history[1].created_at);

    let directory = crm.dealers.directory().await?;
    assert_eq!(directory[0].stats.funded, 1);

    ctx.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn concurrent_loads_see_every_child() -> Result<()> {
    let Some(ctx) = PgTestContext::new().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let crm = Crm::new(ctx.db.clone());

    let mut ids = Vec::new();
    for biz in ["One", "Two", "Three"] {
        let deal = crm.repo.save_deal(Deal::new(biz)).await?;
        let stip = crm
            .checklists
            .add_stip(deal.id, NewStipulation { text: format!("{biz} statements"), ..Default::default() })
            .await?;
        crm.checklists
            .update_stip(stip.id, StipulationPatch { done: Some(true), ..Default::default() })
            .await?;
        ids.push(deal.id);
    }

    let (a, b) = tokio::join!(crm.loader.load_deals(), crm.loader.load_deals());
    for loaded in [a?, b?] {
        assert!(loaded.is_complete());
        assert_eq!(loaded.deals.len(), 3);
        for composed in &loaded.deals {
            assert!(ids.contains(&composed.deal.id));
            assert_eq!(composed.stips.len(), 1);
            assert!(composed.stips[0].done);
        }
    }

    ctx.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn application_promotion_is_transactional() -> Result<()> {
    let Some(ctx) = PgTestContext::new().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let crm = Crm::new(ctx.db.clone());

    let application = crm
        .intake
        .submit(ApplicationForm {
            business_name: "Ridge Excavating".into(),
            email: "owner@ridge.example".into(),
            equipment_cost: Some("$120,500.00".into()),
            ..Default::default()
        })
        .await?;
    let deal = crm.intake.open_deal(application.id, "pg-test").await?;
    assert_eq!(deal.amount, 120_500.0);
    assert!(matches!(
        crm.intake.open_deal(application.id, "pg-test").await,
        Err(CrmError::Conflict(_))
    ));
    assert_eq!(crm.repo.all::<Deal>().await?.len(), 1);

    assert!(crm.satellites.delete_deal(deal.id).await?);
    assert!(crm.history.history(deal.id).await?.is_empty());

    ctx.cleanup().await;
    Ok(())
}
