use std::net::SocketAddr;

use anyhow::{Context, Result, anyhow};

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub identity_url: Option<String>,
    pub identity_service_key: Option<String>,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = match non_empty(lookup("AUTH_JWT_SECRET")) {
            Some(secret) => secret,
            None => {
                tracing::warn!("AUTH_JWT_SECRET unset; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };
        if jwt_secret.len() < 16 {
            return Err(anyhow!("AUTH_JWT_SECRET must be at least 16 characters"));
        }

        let identity_url = non_empty(lookup("IDENTITY_URL"));
        let identity_service_key = non_empty(lookup("IDENTITY_SERVICE_KEY"));
        if identity_url.is_some() != identity_service_key.is_some() {
            return Err(anyhow!(
                "IDENTITY_URL and IDENTITY_SERVICE_KEY must be set together"
            ));
        }

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        Ok(Self {
            jwt_secret,
            identity_url,
            identity_service_key,
            cors_allowed_origins,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn parse_bind(raw: &str) -> Result<SocketAddr> {
    raw.parse()
        .with_context(|| format!("invalid bind address {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert!(config.identity_url.is_none());
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:5173"]);
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let config = load(&[("CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example")])
            .unwrap();
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn identity_settings_come_in_pairs() {
        assert!(load(&[("IDENTITY_URL", "https://id.example")]).is_err());
        let config = load(&[
            ("IDENTITY_URL", "https://id.example"),
            ("IDENTITY_SERVICE_KEY", "service-role"),
        ])
        .unwrap();
        assert_eq!(config.identity_url.as_deref(), Some("https://id.example"));
    }

    #[test]
    fn short_secret_is_rejected() {
        assert!(load(&[("AUTH_JWT_SECRET", "short")]).is_err());
    }
}
