mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use platform_api::ApiError;
use platform_authn::{AuthnError, IdentityAdmin, IdentityUser, JwtVerifier, NewIdentity};
use products_crm::access::Access;
use products_crm::admin::{AdminGate, AdminResponse};
use products_crm::model::{Profile, Role};
use products_crm::repository::Repository;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

const SECRET: &str = "admin-gate-test-secret";

#[derive(Default)]
struct FakeIdentity {
    created: Mutex<Vec<Uuid>>,
    deleted: Mutex<Vec<Uuid>>,
    reject_with: Option<String>,
    // Simulates the profile store going away between the two writes.
    break_profiles: Option<Arc<DatabaseConnection>>,
}

impl FakeIdentity {
    fn calls(&self) -> usize {
        self.created.lock().unwrap().len() + self.deleted.lock().unwrap().len()
    }
}

#[async_trait]
impl IdentityAdmin for FakeIdentity {
    async fn create_user(&self, input: &NewIdentity) -> Result<IdentityUser, AuthnError> {
        if let Some(message) = &self.reject_with {
            return Err(AuthnError::Rejected(message.clone()));
        }
        let id = Uuid::new_v4();
        self.created.lock().unwrap().push(id);
        if let Some(db) = &self.break_profiles {
            common::drop_table(db, "profiles").await;
        }
        Ok(IdentityUser {
            id,
            email: Some(input.email.clone()),
        })
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthnError> {
        self.deleted.lock().unwrap().push(user_id);
        Ok(())
    }
}

struct Harness {
    db: Arc<DatabaseConnection>,
    gate: AdminGate,
    identity: Arc<FakeIdentity>,
    jwt: JwtVerifier,
}

async fn harness(identity: impl FnOnce(Arc<DatabaseConnection>) -> FakeIdentity) -> Harness {
    let (db, _crm) = common::setup().await;
    let identity = Arc::new(identity(db.clone()));
    let jwt = JwtVerifier::new(SECRET);
    let access = Access::new(db.clone(), Arc::new(JwtVerifier::new(SECRET)));
    let gate = AdminGate::new(db.clone(), access, identity.clone());
    Harness {
        db,
        gate,
        identity,
        jwt,
    }
}

impl Harness {
    async fn user_with_role(&self, role: Role) -> String {
        let profile = Profile {
            id: Uuid::new_v4(),
            email: Some(format!("{}@example.com", role.as_str())),
            role,
            full_name: None,
            dealer_id: None,
            account_id: None,
            created_at: Utc::now(),
        };
        Repository::new(self.db.clone()).upsert(profile.clone()).await.unwrap();
        let token = self
            .jwt
            .issue(profile.id, profile.email.as_deref(), Duration::minutes(5))
            .unwrap();
        format!("Bearer {token}")
    }
}

const CREATE: &[u8] =
    br#"{"action":"create_user","email":"New.Dealer@Example.com","password":"s3cret-pass","role":"dealer"}"#;

#[tokio::test]
async fn missing_or_bad_token_is_unauthenticated() {
    let h = harness(|_| FakeIdentity::default()).await;

    let err = h.gate.handle(None, CREATE).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated));
    assert_eq!(err.status_code(), 401);

    let forged = JwtVerifier::new("other-secret")
        .issue(Uuid::new_v4(), None, Duration::minutes(5))
        .unwrap();
    let err = h
        .gate
        .handle(Some(&format!("Bearer {forged}")), CREATE)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated));
    assert_eq!(h.identity.calls(), 0);
}

#[tokio::test]
async fn non_staff_and_profileless_callers_are_forbidden() {
    let h = harness(|_| FakeIdentity::default()).await;

    let dealer = h.user_with_role(Role::Dealer).await;
    let err = h.gate.handle(Some(&dealer), CREATE).await.unwrap_err();
    assert_eq!(err.status_code(), 403);

    let stranger = h
        .jwt
        .issue(Uuid::new_v4(), Some("ghost@example.com"), Duration::minutes(5))
        .unwrap();
    let err = h
        .gate
        .handle(Some(&format!("Bearer {stranger}")), CREATE)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden));
    assert_eq!(h.identity.calls(), 0);
}

#[tokio::test]
async fn staff_can_create_list_and_delete_users() {
    let h = harness(|_| FakeIdentity::default()).await;
    let manager = h.user_with_role(Role::Manager).await;

    let created = h.gate.handle(Some(&manager), CREATE).await.unwrap();
    let AdminResponse::User { user } = created else {
        panic!("expected a user, got {created:?}");
    };
    assert_eq!(user.role, Role::Dealer);
    assert_eq!(user.email.as_deref(), Some("new.dealer@example.com"));
    assert_eq!(h.identity.created.lock().unwrap().as_slice(), &[user.id]);

    let listed = h
        .gate
        .handle(Some(&manager), br#"{"action":"list_users"}"#)
        .await
        .unwrap();
    let AdminResponse::Users { users } = listed else {
        panic!("expected users");
    };
    assert_eq!(users.len(), 2);
    assert!(users.iter().any(|u| u.id == user.id));

    let body = format!(r#"{{"action":"delete_user","user_id":"{}"}}"#, user.id);
    let deleted = h.gate.handle(Some(&manager), body.as_bytes()).await.unwrap();
    assert_eq!(deleted, AdminResponse::Deleted { success: true });
    assert_eq!(h.identity.deleted.lock().unwrap().as_slice(), &[user.id]);
    assert!(
        Repository::new(h.db.clone())
            .find::<Profile>(user.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn bad_requests_from_staff_are_400() {
    let h = harness(|_| FakeIdentity {
        reject_with: Some("A user with this email address has already been registered".into()),
        ..Default::default()
    })
    .await;
    let admin = h.user_with_role(Role::Admin).await;

    let err = h
        .gate
        .handle(Some(&admin), br#"{"action":"promote_everyone"}"#)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.body().error, "Unknown action");

    let err = h
        .gate
        .handle(
            Some(&admin),
            br#"{"action":"create_user","email":"x@example.com","password":"pw-long-enough","role":"wizard"}"#,
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let err = h.gate.handle(Some(&admin), CREATE).await.unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(err.body().error.contains("already been registered"));
}

#[tokio::test]
async fn identity_is_removed_when_profile_write_fails() {
    let h = harness(|db| FakeIdentity {
        break_profiles: Some(db),
        ..Default::default()
    })
    .await;
    let admin = h.user_with_role(Role::Admin).await;

    let err = h.gate.handle(Some(&admin), CREATE).await.unwrap_err();
    assert_eq!(err.status_code(), 500);

    let created = h.identity.created.lock().unwrap().clone();
    let deleted = h.identity.deleted.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created, deleted);
}
