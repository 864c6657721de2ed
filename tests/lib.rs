//! Throwaway Postgres databases for integration tests.
//!
//! Every context creates a uniquely named database next to `TEST_DATABASE_URL`, runs the
//! migrations, and drops it again in [`PgTestContext::cleanup`]. Without the variable the
//! constructor returns `None` and the caller skips.

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use url::Url;
use uuid::Uuid;

pub struct PgTestContext {
    pub db: Arc<DatabaseConnection>,
    admin_url: String,
    db_name: String,
}

impl PgTestContext {
    pub async fn new() -> Option<Self> {
        let base = std::env::var("TEST_DATABASE_URL").ok()?;
        let (admin_url, db_name, test_url) = build_urls(&base)?;
        let admin = Database::connect(&admin_url).await.ok()?;
        let drop_sql = format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE);");
        let create_sql = format!("CREATE DATABASE \"{db_name}\";");
        let _ = admin
            .execute(Statement::from_string(DatabaseBackend::Postgres, drop_sql))
            .await;
        admin
            .execute(Statement::from_string(DatabaseBackend::Postgres, create_sql))
            .await
            .ok()?;
        let conn = Database::connect(&test_url).await.ok()?;
        Migrator::up(&conn, None).await.ok()?;
        Some(Self {
            db: Arc::new(conn),
            admin_url,
            db_name,
        })
    }

    pub async fn cleanup(self) {
        let Self {
            db,
            admin_url,
            db_name,
        } = self;
        drop(db);
        if let Ok(admin) = Database::connect(&admin_url).await {
            let drop_sql = format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE);");
            let _ = admin
                .execute(Statement::from_string(DatabaseBackend::Postgres, drop_sql))
                .await;
        }
    }
}

fn build_urls(base: &str) -> Option<(String, String, String)> {
    let url = Url::parse(base).ok()?;
    let db_path = url.path().trim_start_matches('/').to_string();
    let base_name = if db_path.is_empty() {
        "dealdesk_test".to_string()
    } else {
        db_path
    };
    let db_name = format!("{}_{}", base_name, Uuid::new_v4().simple());
    let mut admin_url = url.clone();
    admin_url.set_path("/postgres");
    let mut test_url = url;
    test_url.set_path(&format!("/{db_name}"));
    Some((admin_url.to_string(), db_name, test_url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_sits_next_to_base() {
        let (admin, name, test) =
            build_urls("postgres://u:p@localhost:5432/dealdesk").unwrap();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert!(name.starts_with("dealdesk_"));
        assert!(test.ends_with(&format!("/{name}")));
    }
}
