//! Portal passwords for dealers and customer accounts, stored only as argon2 hashes.

use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::error::{CrmError, CrmResult};
use crate::model::{Account, Dealer};
use crate::repository::get_on;

const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> CrmResult<String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CrmError::invalid(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| CrmError::Credential(format!("hash error: {err}")))
}

/// A missing or malformed stored hash never verifies.
pub fn verify_password(stored: Option<&str>, candidate: &str) -> bool {
    let Some(stored) = stored else {
        return false;
    };
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "stored password hash is unreadable");
            false
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    db: Arc<DatabaseConnection>,
}

impl Credentials {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn set_dealer_password(&self, dealer_id: Uuid, password: &str) -> CrmResult<()> {
        let hash = hash_password(password)?;
        let result = entity::dealers::Entity::update_many()
            .col_expr(entity::dealers::Column::PasswordHash, Expr::value(hash))
            .filter(entity::dealers::Column::Id.eq(dealer_id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(CrmError::not_found("dealer", dealer_id));
        }
        tracing::info!(%dealer_id, "dealer portal password set");
        Ok(())
    }

    pub async fn verify_dealer_password(&self, dealer_id: Uuid, password: &str) -> CrmResult<bool> {
        let dealer: Dealer = get_on(self.db.as_ref(), dealer_id).await?;
        Ok(dealer.active && verify_password(dealer.password_hash.as_deref(), password))
    }

    pub async fn set_account_password(&self, account_id: Uuid, password: &str) -> CrmResult<()> {
        let hash = hash_password(password)?;
        let result = entity::accounts::Entity::update_many()
            .col_expr(entity::accounts::Column::CustPasswordHash, Expr::value(hash))
            .filter(entity::accounts::Column::Id.eq(account_id))
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(CrmError::not_found("account", account_id));
        }
        tracing::info!(%account_id, "customer portal password set");
        Ok(())
    }

    pub async fn verify_account_password(
        &self,
        account_id: Uuid,
        password: &str,
    ) -> CrmResult<bool> {
        let account: Account = get_on(self.db.as_ref(), account_id).await?;
        Ok(verify_password(account.cust_password_hash.as_deref(), password))
    }
}
