use std::fmt;
use std::path::PathBuf;

use crate::modules::admin::provision::ProvisionRequest;
use crate::modules::auth::hasher::{HashConfig, HashScheme};
use crate::{DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD, DEFAULT_STORE_FILE};

pub const ENV_ADMIN_EMAIL: &str = "ADMIN_EMAIL";
pub const ENV_ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";
pub const ENV_HASH_SCHEME: &str = "ADMIN_HASH_SCHEME";
pub const ENV_HASH_COST: &str = "ADMIN_HASH_COST";
pub const ENV_STORE_PATH: &str = "FORMEASE_STORE";

/// Errors raised while reading provisioning configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value, reason } => {
                write!(f, "invalid {}={:?}: {}", key, value, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Everything a provisioning run needs, resolved once at process start.
///
/// Unset and empty variables both fall back to the defaults below.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionConfig {
    /// `ADMIN_EMAIL`, default `admin@formease.com`
    pub email: String,
    /// `ADMIN_PASSWORD`, default `admin123`
    pub password: String,
    /// Set when `password` came from the built-in fallback
    pub password_is_default: bool,
    /// `ADMIN_HASH_SCHEME` and `ADMIN_HASH_COST`
    pub hash: HashConfig,
    /// `FORMEASE_STORE`, default `formease-accounts.json`
    pub store_path: PathBuf,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
            password_is_default: true,
            hash: HashConfig::default(),
            store_path: PathBuf::from(DEFAULT_STORE_FILE),
        }
    }
}

impl ProvisionConfig {
    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(email) = get(ENV_ADMIN_EMAIL) {
            config.email = email.trim().to_string();
        }
        if let Some(password) = get(ENV_ADMIN_PASSWORD) {
            config.password = password;
            config.password_is_default = false;
        }
        if let Some(scheme) = get(ENV_HASH_SCHEME) {
            config.hash.scheme = parse_scheme(ENV_HASH_SCHEME, &scheme)?;
        }
        if let Some(cost) = get(ENV_HASH_COST) {
            config.hash.cost = Some(parse_cost(ENV_HASH_COST, &cost)?);
        }
        if let Some(path) = get(ENV_STORE_PATH) {
            config.store_path = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Replace the password, clearing the default marker
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self.password_is_default = false;
        self
    }

    pub fn request(&self) -> ProvisionRequest {
        ProvisionRequest::new(self.email.clone(), self.password.clone())
    }
}

pub(crate) fn parse_scheme(key: &'static str, value: &str) -> Result<HashScheme, ConfigError> {
    value.parse().map_err(|e| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: format!("{}", e),
    })
}

pub(crate) fn parse_cost(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: "expected a positive integer".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ProvisionConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.email, "admin@formease.com");
        assert_eq!(config.password, "admin123");
        assert!(config.password_is_default);
        assert_eq!(config.hash.scheme, HashScheme::Bcrypt);
        assert_eq!(config.hash.effective_cost(), 10);
        assert_eq!(config.store_path, PathBuf::from("formease-accounts.json"));
    }

    #[test]
    fn test_environment_overrides() {
        let config = ProvisionConfig::from_lookup(lookup(&[
            ("ADMIN_EMAIL", "jeff.kosi@formease.com"),
            ("ADMIN_PASSWORD", "FormEase2025!"),
            ("ADMIN_HASH_SCHEME", "pbkdf2"),
            ("ADMIN_HASH_COST", "50000"),
            ("FORMEASE_STORE", "/var/lib/formease/accounts.json"),
        ]))
        .unwrap();

        assert_eq!(config.email, "jeff.kosi@formease.com");
        assert_eq!(config.password, "FormEase2025!");
        assert!(!config.password_is_default);
        assert_eq!(config.hash.scheme, HashScheme::Pbkdf2);
        assert_eq!(config.hash.cost, Some(50_000));
        assert_eq!(
            config.store_path,
            PathBuf::from("/var/lib/formease/accounts.json")
        );

        let request = config.request();
        assert_eq!(request.email, "jeff.kosi@formease.com");
        assert_eq!(request.password, "FormEase2025!");
    }

    #[test]
    fn test_empty_values_fall_back() {
        let config = ProvisionConfig::from_lookup(lookup(&[
            ("ADMIN_EMAIL", ""),
            ("ADMIN_PASSWORD", "  "),
        ]))
        .unwrap();
        assert_eq!(config.email, "admin@formease.com");
        assert!(config.password_is_default);
    }

    #[test]
    fn test_invalid_values() {
        let err = ProvisionConfig::from_lookup(lookup(&[("ADMIN_HASH_COST", "ten")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "ADMIN_HASH_COST", .. }
        ));

        let err = ProvisionConfig::from_lookup(lookup(&[("ADMIN_HASH_SCHEME", "md5")])).unwrap_err();
        assert!(err.to_string().contains("ADMIN_HASH_SCHEME"));
    }

    #[test]
    fn test_with_password() {
        let config = ProvisionConfig::default().with_password("Explicit123");
        assert_eq!(config.password, "Explicit123");
        assert!(!config.password_is_default);
    }
}
