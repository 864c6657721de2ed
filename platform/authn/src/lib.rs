//! Identity interface consumed by the deal desk.
//!
//! The system never manages credentials itself. It verifies bearer tokens minted by the
//! identity provider ([`TokenVerifier`]) and, for the admin surface only, calls the provider's
//! privileged user API ([`IdentityAdmin`]).

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("identity provider rejected the request: {0}")]
    Rejected(String),
    #[error("identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid identity provider url: {0}")]
    BadUrl(#[from] url::ParseError),
}

/// Verified caller identity. Role and tenant scope come from the profile store, not the token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<AuthUser, AuthnError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
}

/// HS256 verifier for tokens signed with the provider's shared JWT secret.
#[derive(Clone)]
pub struct JwtVerifier {
    secret: String,
}

impl JwtVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.secret.as_bytes())
    }

    /// Mints a token the verifier accepts. Used by the seed command and tests.
    pub fn issue(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        ttl: Duration,
    ) -> jsonwebtoken::errors::Result<String> {
        let now = Utc::now();
        let exp = now.checked_add_signed(ttl).unwrap_or(now).timestamp() as usize;
        let claims = AccessClaims {
            sub: user_id,
            email: email.map(str::to_string),
            exp,
            iat: now.timestamp() as usize,
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<AuthUser, AuthnError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Provider tokens carry an audience we do not pin.
        validation.validate_aud = false;
        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key(), &validation)
            .map_err(|err| AuthnError::InvalidToken(err.to_string()))?;
        Ok(AuthUser {
            id: data.claims.sub,
            email: data.claims.email,
        })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthnError> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthnError::MissingToken)
}

#[derive(Clone, Debug, Serialize)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct IdentityUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Privileged user administration on the identity provider.
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    async fn create_user(&self, input: &NewIdentity) -> Result<IdentityUser, AuthnError>;
    async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthnError>;
}

/// GoTrue-style admin REST client authenticated with the service-role key.
#[derive(Clone)]
pub struct RestIdentityAdmin {
    client: reqwest::Client,
    base: Url,
    service_key: String,
}

impl RestIdentityAdmin {
    pub fn new(base_url: &str, service_key: impl Into<String>) -> Result<Self, AuthnError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base,
            service_key: service_key.into(),
        })
    }

    fn users_url(&self, user_id: Option<Uuid>) -> Result<Url, AuthnError> {
        let path = match user_id {
            Some(id) => format!("auth/v1/admin/users/{id}"),
            None => "auth/v1/admin/users".to_string(),
        };
        Ok(self.base.join(&path)?)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

#[async_trait]
impl IdentityAdmin for RestIdentityAdmin {
    async fn create_user(&self, input: &NewIdentity) -> Result<IdentityUser, AuthnError> {
        let body = serde_json::json!({
            "email": input.email,
            "password": input.password,
            "email_confirm": true,
            "user_metadata": { "full_name": input.full_name },
        });
        let response = self
            .authorized(self.client.post(self.users_url(None)?))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let payload = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "identity provider refused create_user");
            return Err(AuthnError::Rejected(rejection_message(&payload, status.as_u16())));
        }
        Ok(response.json::<IdentityUser>().await?)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthnError> {
        let response = self
            .authorized(self.client.delete(self.users_url(Some(user_id))?))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let payload = response.text().await.unwrap_or_default();
            tracing::warn!(%status, %user_id, "identity provider refused delete_user");
            return Err(AuthnError::Rejected(rejection_message(&payload, status.as_u16())));
        }
        Ok(())
    }
}

/// Picks the human-readable message out of a provider error payload.
fn rejection_message(payload: &str, status: u16) -> String {
    serde_json::from_str::<serde_json::Value>(payload)
        .ok()
        .and_then(|value| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| format!("status {status}"))
}
