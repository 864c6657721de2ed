//! Resolves a bearer token into a caller with a role.

use std::sync::Arc;

use platform_api::ApiError;
use platform_authn::{AuthUser, TokenVerifier, bearer_token};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::model::{Profile, Role};
use crate::repository::find_on;

#[derive(Clone, Debug)]
pub struct Caller {
    pub user: AuthUser,
    pub profile: Profile,
}

impl Caller {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.profile.role
    }

    pub fn require_staff(&self) -> Result<(), ApiError> {
        if self.role().is_staff() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role() == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    /// The dealer this caller may see in the dealer portal. Staff may look at any dealer.
    pub fn dealer_scope(&self, requested: Option<Uuid>) -> Result<Uuid, ApiError> {
        match (self.role(), requested, self.profile.dealer_id) {
            (role, Some(id), _) if role.is_staff() => Ok(id),
            (Role::Dealer, requested, Some(own)) if requested.is_none_or(|id| id == own) => {
                Ok(own)
            }
            (role, None, _) if role.is_staff() => {
                Err(ApiError::invalid("dealerId is required for staff"))
            }
            _ => Err(ApiError::Forbidden),
        }
    }

    /// Name recorded as the actor on activities and notes.
    pub fn display_name(&self) -> String {
        self.profile
            .full_name
            .clone()
            .or_else(|| self.profile.email.clone())
            .or_else(|| self.user.email.clone())
            .unwrap_or_else(|| self.role().as_str().to_string())
    }
}

#[derive(Clone)]
pub struct Access {
    db: Arc<DatabaseConnection>,
    verifier: Arc<dyn TokenVerifier>,
}

impl Access {
    pub fn new(db: Arc<DatabaseConnection>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { db, verifier }
    }

    /// 401 without a valid token; 403 when the identity has no profile.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<Caller, ApiError> {
        let token = bearer_token(authorization).map_err(|_| ApiError::Unauthenticated)?;
        let user = self.verifier.verify(token).map_err(|err| {
            tracing::debug!(error = %err, "bearer token rejected");
            ApiError::Unauthenticated
        })?;
        let profile: Profile = find_on(self.db.as_ref(), user.id)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| {
                tracing::warn!(user_id = %user.id, "authenticated user has no profile");
                ApiError::Forbidden
            })?;
        Ok(Caller { user, profile })
    }
}
