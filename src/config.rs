use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::validation::ValidationPolicy;

const PLACEHOLDER_ADMIN_KEY: &str = "CHANGE_ME_ADMIN_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub admin_key: String,
    /// Upper bound on a single save/delete against the store.
    /// Set via SERVICEDESK_SAVE_TIMEOUT_MS. Default: 5000.
    pub save_timeout_ms: u64,
    /// Load the demo roles and services at startup.
    pub seed_demo: bool,
    /// Base URL the test harness resolves endpoints against.
    pub test_base_url: String,
    /// Reject duplicate parameter keys within one collection.
    pub unique_param_keys: bool,
    /// Reject private services that select no role.
    pub require_roles_when_private: bool,
    /// Extra origin allowed by CORS besides localhost.
    pub dashboard_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            admin_key: PLACEHOLDER_ADMIN_KEY.into(),
            save_timeout_ms: 5000,
            seed_demo: true,
            test_base_url: "http://localhost:8080".into(),
            unique_param_keys: false,
            require_roles_when_private: false,
            dashboard_origin: None,
        }
    }
}

impl Config {
    pub fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.save_timeout_ms)
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            unique_param_keys: self.unique_param_keys,
            require_roles_when_private: self.require_roles_when_private,
        }
    }

    pub fn test_base_url(&self) -> anyhow::Result<Url> {
        Ok(Url::parse(&self.test_base_url)?)
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    let defaults = Config::default();

    let admin_key =
        std::env::var("SERVICEDESK_ADMIN_KEY").unwrap_or_else(|_| PLACEHOLDER_ADMIN_KEY.into());

    if admin_key == PLACEHOLDER_ADMIN_KEY {
        let env_mode = std::env::var("SERVICEDESK_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "SERVICEDESK_ADMIN_KEY is still the insecure placeholder. \
                 Set a proper key before running in production."
            );
        }
        eprintln!("WARNING: SERVICEDESK_ADMIN_KEY is not set, using insecure placeholder.");
    }

    let test_base_url = std::env::var("SERVICEDESK_TEST_BASE_URL")
        .unwrap_or_else(|_| defaults.test_base_url.clone());
    if let Err(e) = Url::parse(&test_base_url) {
        anyhow::bail!("SERVICEDESK_TEST_BASE_URL is not a valid URL: {}", e);
    }

    Ok(Config {
        port: std::env::var("SERVICEDESK_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port),
        admin_key,
        save_timeout_ms: std::env::var("SERVICEDESK_SAVE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.save_timeout_ms),
        seed_demo: env_flag("SERVICEDESK_SEED_DEMO", defaults.seed_demo),
        test_base_url,
        unique_param_keys: env_flag("SERVICEDESK_UNIQUE_PARAM_KEYS", false),
        require_roles_when_private: env_flag("SERVICEDESK_REQUIRE_ROLES_WHEN_PRIVATE", false),
        dashboard_origin: std::env::var("DASHBOARD_ORIGIN")
            .ok()
            .filter(|s| !s.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.save_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.validation_policy(), ValidationPolicy::default());
        assert_eq!(
            cfg.test_base_url().unwrap().as_str(),
            "http://localhost:8080/"
        );
    }

    #[test]
    fn test_policy_follows_flags() {
        let cfg = Config {
            unique_param_keys: true,
            ..Config::default()
        };
        let policy = cfg.validation_policy();
        assert!(policy.unique_param_keys);
        assert!(!policy.require_roles_when_private);
    }
}
