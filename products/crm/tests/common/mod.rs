#![allow(dead_code)]

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use products_crm::Crm;
use products_crm::model::{Dealer, Deal, Lender};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

pub async fn setup() -> (Arc<DatabaseConnection>, Crm) {
    let conn = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&conn, None).await.unwrap();
    let db = Arc::new(conn);
    let crm = Crm::new(db.clone());
    (db, crm)
}

pub async fn dealer(crm: &Crm, name: &str) -> Dealer {
    crm.repo.save_dealer(Dealer::new(name)).await.unwrap()
}

pub async fn lender(crm: &Crm, lender: Lender) -> Lender {
    crm.repo.save_lender(lender).await.unwrap()
}

pub async fn deal(crm: &Crm, biz: &str, dealer: Option<&Dealer>) -> Deal {
    let mut deal = Deal::new(biz);
    deal.dealer_id = dealer.map(|d| d.id);
    crm.repo.save_deal(deal).await.unwrap()
}

pub async fn drop_table(db: &DatabaseConnection, table: &str) {
    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        format!("DROP TABLE {table};"),
    ))
    .await
    .unwrap();
}
