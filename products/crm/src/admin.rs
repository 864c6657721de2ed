//! User-management gate: authenticate, authorize by role, then call the identity provider.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform_api::ApiError;
use platform_authn::{AuthnError, IdentityAdmin, NewIdentity};
use sea_orm::{Condition, DatabaseConnection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::access::{Access, Caller};
use crate::model::{Account, Dealer, Profile, Role};
use crate::repository::{Repository, delete_on, list_on, upsert_on};

#[derive(Clone, Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: String,
    pub dealer_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub user_id: Uuid,
}

#[derive(Clone, Debug)]
pub enum AdminAction {
    CreateUser(CreateUserRequest),
    ListUsers,
    DeleteUser(DeleteUserRequest),
}

impl AdminAction {
    /// Parses `{action, ...}`. A missing or unknown action is a bad request.
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|err| ApiError::invalid(format!("malformed body: {err}")))?;
        let action = value
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let fields = |err: serde_json::Error| ApiError::invalid(err.to_string());
        match action.as_str() {
            "create_user" => serde_json::from_value(value)
                .map(AdminAction::CreateUser)
                .map_err(fields),
            "list_users" => Ok(AdminAction::ListUsers),
            "delete_user" => serde_json::from_value(value)
                .map(AdminAction::DeleteUser)
                .map_err(fields),
            _ => Err(ApiError::invalid("Unknown action")),
        }
    }
}

/// A profile row as the user-management endpoint reports it, in the table's own column names.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AdminUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Role,
    pub full_name: Option<String>,
    pub dealer_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for AdminUser {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            role: profile.role,
            full_name: profile.full_name,
            dealer_id: profile.dealer_id,
            account_id: profile.account_id,
            created_at: profile.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AdminResponse {
    User { user: AdminUser },
    Users { users: Vec<AdminUser> },
    Deleted { success: bool },
}

#[derive(Clone)]
pub struct AdminGate {
    db: Arc<DatabaseConnection>,
    access: Access,
    identity: Arc<dyn IdentityAdmin>,
}

impl AdminGate {
    pub fn new(db: Arc<DatabaseConnection>, access: Access, identity: Arc<dyn IdentityAdmin>) -> Self {
        Self {
            db,
            access,
            identity,
        }
    }

    /// Runs one request. Each failed check short-circuits before any privileged call, and
    /// the body is only read once the caller is authorized.
    pub async fn handle(
        &self,
        authorization: Option<&str>,
        body: &[u8],
    ) -> Result<AdminResponse, ApiError> {
        let caller = self.access.authenticate(authorization).await?;
        caller.require_staff().inspect_err(|_| {
            tracing::warn!(user_id = %caller.id(), role = caller.role().as_str(), "admin request refused");
        })?;
        match AdminAction::parse(body)? {
            AdminAction::CreateUser(request) => self.create_user(&caller, request).await,
            AdminAction::ListUsers => self.list_users().await,
            AdminAction::DeleteUser(request) => self.delete_user(&caller, request.user_id).await,
        }
    }

    async fn create_user(
        &self,
        caller: &Caller,
        request: CreateUserRequest,
    ) -> Result<AdminResponse, ApiError> {
        let role = Role::parse(&request.role)
            .ok_or_else(|| ApiError::invalid(format!("unknown role {}", request.role)))?;
        let email = request.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(ApiError::invalid("email must be a valid address"));
        }
        let repo = Repository::new(self.db.clone());
        if let Some(dealer_id) = request.dealer_id {
            repo.reference::<Dealer>(dealer_id).await?;
        }
        if let Some(account_id) = request.account_id {
            repo.reference::<Account>(account_id).await?;
        }

        let identity = self
            .identity
            .create_user(&NewIdentity {
                email: email.clone(),
                password: request.password,
                full_name: request.full_name.clone(),
            })
            .await
            .map_err(identity_error)?;

        let profile = Profile {
            id: identity.id,
            email: Some(email),
            role,
            full_name: request.full_name,
            dealer_id: request.dealer_id,
            account_id: request.account_id,
            created_at: Utc::now(),
        };
        if let Err(err) = upsert_on(self.db.as_ref(), profile.clone()).await {
            tracing::error!(user_id = %identity.id, error = %err, "profile write failed, removing identity");
            if let Err(cleanup) = self.identity.delete_user(identity.id).await {
                tracing::error!(user_id = %identity.id, error = %cleanup, "identity cleanup failed");
            }
            return Err(ApiError::from(err));
        }
        tracing::info!(user_id = %profile.id, role = role.as_str(), by = %caller.id(), "user created");
        Ok(AdminResponse::User {
            user: profile.into(),
        })
    }

    async fn list_users(&self) -> Result<AdminResponse, ApiError> {
        let users = list_on::<Profile, _>(self.db.as_ref(), Condition::all()).await?;
        Ok(AdminResponse::Users {
            users: users.into_iter().map(AdminUser::from).collect(),
        })
    }

    async fn delete_user(&self, caller: &Caller, user_id: Uuid) -> Result<AdminResponse, ApiError> {
        self.identity
            .delete_user(user_id)
            .await
            .map_err(identity_error)?;
        delete_on::<Profile, _>(self.db.as_ref(), user_id).await?;
        tracing::info!(%user_id, by = %caller.id(), "user deleted");
        Ok(AdminResponse::Deleted { success: true })
    }
}

/// Provider refusals are the caller's problem; transport failures are ours.
fn identity_error(err: AuthnError) -> ApiError {
    match err {
        AuthnError::Rejected(message) => ApiError::InvalidInput(message),
        other => ApiError::internal(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_actions() {
        assert!(matches!(
            AdminAction::parse(br#"{"action":"list_users"}"#),
            Ok(AdminAction::ListUsers)
        ));
        let id = Uuid::new_v4();
        let body = format!(r#"{{"action":"delete_user","user_id":"{id}"}}"#);
        match AdminAction::parse(body.as_bytes()) {
            Ok(AdminAction::DeleteUser(req)) => assert_eq!(req.user_id, id),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_or_missing_action_is_bad_request() {
        for body in [
            &br#"{"action":"drop_tables"}"#[..],
            &br#"{}"#[..],
            &b"not json"[..],
        ] {
            let err = AdminAction::parse(body).unwrap_err();
            assert_eq!(err.status_code(), 400);
        }
    }

    #[test]
    fn create_user_requires_fields() {
        let err = AdminAction::parse(br#"{"action":"create_user","email":"a@b.c"}"#).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn responses_match_wire_shape() {
        let json = serde_json::to_value(AdminResponse::Deleted { success: true }).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true }));
        let json = serde_json::to_value(AdminResponse::Users { users: vec![] }).unwrap();
        assert_eq!(json, serde_json::json!({ "users": [] }));
    }

    #[test]
    fn users_keep_column_names() {
        let dealer_id = Uuid::new_v4();
        let user = AdminUser::from(Profile {
            id: Uuid::new_v4(),
            email: Some("dee@example.com".into()),
            role: Role::Dealer,
            full_name: Some("Dee Dealer".into()),
            dealer_id: Some(dealer_id),
            account_id: None,
            created_at: Utc::now(),
        });
        let json = serde_json::to_value(AdminResponse::User { user }).unwrap();
        assert_eq!(json["user"]["full_name"], "Dee Dealer");
        assert_eq!(json["user"]["dealer_id"], dealer_id.to_string());
        assert_eq!(json["user"]["role"], "dealer");
        assert!(json["user"].get("fullName").is_none());
        assert!(json["user"].get("created_at").is_some());
    }
}
