pub use sea_orm_migration::prelude::*;

mod m20240101_000001_parties;
mod m20240101_000002_deals;
mod m20240101_000003_inbox_and_intake;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_parties::Migration),
            Box::new(m20240101_000002_deals::Migration),
            Box::new(m20240101_000003_inbox_and_intake::Migration),
        ]
    }
}
