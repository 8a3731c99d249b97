//! Configuration loading.
//!
//! Configuration is loaded from TOML with the following resolution order:
//! 1. Explicit path (`--config <path>`)
//! 2. `~/.hermod/config.toml` (user)
//! 3. `/etc/hermod/config.toml` (system)
//! 4. Built-in defaults
//!
//! Environment variables (`HERMOD_CACHE_ENABLED`, `HERMOD_CACHE_TTL`,
//! `HERMOD_CACHE_MAX_SIZE`, `HERMOD_LOG_LEVEL`, `HERMOD_TIMEOUT_SECS`,
//! `HERMOD_PROVIDER_AUTH`, `AWS_REGION`) override whatever the file says.
//!
//! Credentials are loaded separately, with a permission check on
//! `~/.hermod/secrets.toml` (must be 0600 or 0400):
//! - `iam` auth (default): `[aws]` access key pair from the secrets file, then
//!   `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`, then
//!   the default AWS credential chain.
//! - `api_key` auth: `[bedrock] api_key` from the secrets file, then
//!   `AWS_BEARER_TOKEN_BEDROCK`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aws_credential_types::Credentials;

use crate::cache::CacheConfig;
use crate::providers::bedrock::DEFAULT_REGION;
use crate::providers::bedrock_sdk::static_credentials;
use crate::{HermodError, Result};

/// Environment variable holding the Bedrock API key.
pub const API_KEY_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

/// Environment variables holding an IAM access key pair.
pub const ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

/// Gateway configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub provider: ProviderSection,
    #[serde(default)]
    pub logging: LoggingSection,
    /// JSON catalog replacing the embedded one.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CacheSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Entry time-to-live in seconds (default: 3600).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Maximum live entries (default: 1000).
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheSection {
    /// `None` when caching is disabled.
    pub fn to_cache_config(&self) -> Option<CacheConfig> {
        self.enabled.then(|| {
            CacheConfig::new()
                .max_entries(self.max_entries)
                .ttl(Duration::from_secs(self.ttl_secs))
        })
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_max_entries() -> u64 {
    1000
}

/// How requests to Bedrock are authenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderAuth {
    /// SigV4 with IAM credentials through the AWS SDK.
    #[default]
    Iam,
    /// Bedrock API key sent as a bearer token.
    ApiKey,
}

impl ProviderAuth {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "iam" => Ok(Self::Iam),
            "api_key" | "api-key" => Ok(Self::ApiKey),
            _ => Err(HermodError::Configuration(format!(
                "HERMOD_PROVIDER_AUTH must be 'iam' or 'api_key', got '{value}'"
            ))),
        }
    }
}

/// Bedrock connection settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderSection {
    #[serde(default)]
    pub auth: ProviderAuth,
    #[serde(default = "default_region")]
    pub region: String,
    /// Overrides the regional runtime endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Provider call timeout in seconds (default: 60).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            auth: ProviderAuth::default(),
            region: default_region(),
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingSection {
    /// `tracing` filter directive (default: "info").
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load from the standard locations, then apply environment overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse one TOML file, without environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HermodError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HermodError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path; `None` means "use defaults".
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(HermodError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".hermod").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/hermod/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("HERMOD_CACHE_ENABLED") {
            self.cache.enabled = parse_bool("HERMOD_CACHE_ENABLED", &v)?;
        }
        if let Some(v) = lookup("HERMOD_CACHE_TTL") {
            self.cache.ttl_secs = parse_num("HERMOD_CACHE_TTL", &v)?;
        }
        if let Some(v) = lookup("HERMOD_CACHE_MAX_SIZE") {
            self.cache.max_entries = parse_num("HERMOD_CACHE_MAX_SIZE", &v)?;
        }
        if let Some(v) = lookup("HERMOD_TIMEOUT_SECS") {
            self.provider.timeout_secs = parse_num("HERMOD_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("HERMOD_PROVIDER_AUTH") {
            self.provider.auth = ProviderAuth::parse(&v)?;
        }
        if let Some(v) = lookup("HERMOD_LOG_LEVEL") {
            self.logging.level = v.to_lowercase();
        }
        if let Some(v) = lookup("AWS_REGION") {
            self.provider.region = v;
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(HermodError::Configuration(format!(
            "{key} must be a boolean, got '{value}'"
        ))),
    }
}

fn parse_num(key: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| {
        HermodError::Configuration(format!(
            "{key} must be a non-negative integer, got '{value}'"
        ))
    })
}

/// Secrets (API keys and IAM credentials).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub bedrock: Option<ApiKeySecret>,
    #[serde(default)]
    pub aws: Option<AwsCredentialsSecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

/// An IAM access key pair.
#[derive(Clone, Deserialize)]
pub struct AwsCredentialsSecret {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentialsSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentialsSecret")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

impl AwsCredentialsSecret {
    pub fn to_credentials(&self) -> Credentials {
        static_credentials(
            &self.access_key_id,
            &self.secret_access_key,
            self.session_token.clone(),
        )
    }
}

impl Secrets {
    /// Load `~/.hermod/secrets.toml` if present.
    ///
    /// Returns empty secrets if no file exists (the key may come from the
    /// environment).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".hermod").join("secrets.toml");
            if user_secrets.exists() {
                return Self::from_file(&user_secrets);
            }
        }
        Ok(Secrets::default())
    }

    /// Load a specific secrets file after checking its permissions.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            HermodError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HermodError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            HermodError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(HermodError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Bedrock API key, falling back to [`API_KEY_ENV`].
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with(|key| std::env::var(key).ok())
    }

    fn api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.bedrock
            .as_ref()
            .map(|s| s.api_key.clone())
            .or_else(|| lookup(API_KEY_ENV))
            .filter(|k| !k.is_empty())
    }

    /// IAM access key pair from the `[aws]` section, falling back to
    /// [`ACCESS_KEY_ID_ENV`] and [`SECRET_ACCESS_KEY_ENV`].
    ///
    /// `None` means "let the default AWS credential chain decide".
    pub fn aws_credentials(&self) -> Option<AwsCredentialsSecret> {
        self.aws_credentials_with(|key| std::env::var(key).ok())
    }

    fn aws_credentials_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<AwsCredentialsSecret> {
        if let Some(aws) = &self.aws {
            return Some(aws.clone());
        }
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Some(AwsCredentialsSecret {
            access_key_id: non_empty(ACCESS_KEY_ID_ENV)?,
            secret_access_key: non_empty(SECRET_ACCESS_KEY_ENV)?,
            session_token: non_empty(SESSION_TOKEN_ENV),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.cache.max_entries, 1000);
        assert_eq!(config.provider.region, "us-east-1");
        assert_eq!(config.provider.timeout_secs, 60);
        assert_eq!(config.logging.level, "info");
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn parse_minimal_config() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            ttl_secs = 60
        "#,
        )
        .unwrap();
        assert_eq!(config.cache.ttl_secs, 60);
        // Defaults preserved
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_entries, 1000);
    }

    #[test]
    fn parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            catalog_path = "/opt/hermod/models.json"

            [cache]
            enabled = false
            ttl_secs = 10
            max_entries = 5

            [provider]
            region = "eu-central-1"
            endpoint = "http://localhost:4566"
            timeout_secs = 5

            [logging]
            level = "debug"
        "#,
        )
        .unwrap();
        assert!(!config.cache.enabled);
        assert!(config.cache.to_cache_config().is_none());
        assert_eq!(config.provider.region, "eu-central-1");
        assert_eq!(
            config.provider.endpoint.as_deref(),
            Some("http://localhost:4566")
        );
        assert_eq!(config.provider.timeout(), Duration::from_secs(5));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.catalog_path,
            Some(PathBuf::from("/opt/hermod/models.json"))
        );
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("HERMOD_CACHE_ENABLED", "false"),
                ("HERMOD_CACHE_TTL", "120"),
                ("HERMOD_CACHE_MAX_SIZE", "50"),
                ("HERMOD_LOG_LEVEL", "DEBUG"),
                ("HERMOD_TIMEOUT_SECS", "15"),
                ("AWS_REGION", "us-west-2"),
            ]))
            .unwrap();
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 120);
        assert_eq!(config.cache.max_entries, 50);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.provider.timeout_secs, 15);
        assert_eq!(config.provider.region, "us-west-2");
    }

    #[test]
    fn bad_env_value_is_configuration_error() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[("HERMOD_CACHE_TTL", "soon")]))
            .unwrap_err();
        assert!(matches!(err, HermodError::Configuration(_)));
        assert!(err.to_string().contains("HERMOD_CACHE_TTL"));

        let err = config
            .apply_env(env(&[("HERMOD_CACHE_ENABLED", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("boolean"));
    }

    #[test]
    fn cache_section_converts_to_cache_config() {
        let section = CacheSection {
            enabled: true,
            ttl_secs: 30,
            max_entries: 7,
        };
        let cfg = section.to_cache_config().unwrap();
        assert_eq!(cfg.max_entries, 7);
        assert_eq!(cfg.ttl, Duration::from_secs(30));
    }

    #[test]
    fn config_not_found_returns_error() {
        let err = Config::load(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn api_key_prefers_secrets_file() {
        let secrets = Secrets {
            bedrock: Some(ApiKeySecret {
                api_key: "from-file".to_string(),
            }),
            aws: None,
        };
        let lookup = env(&[(API_KEY_ENV, "from-env")]);
        assert_eq!(secrets.api_key_with(lookup).as_deref(), Some("from-file"));
    }

    #[test]
    fn api_key_falls_back_to_env() {
        let secrets = Secrets::default();
        assert_eq!(
            secrets
                .api_key_with(env(&[(API_KEY_ENV, "from-env")]))
                .as_deref(),
            Some("from-env")
        );
        assert_eq!(secrets.api_key_with(env(&[])), None);
    }

    #[test]
    fn auth_defaults_to_iam() {
        assert_eq!(Config::default().provider.auth, ProviderAuth::Iam);
        let config: Config = toml::from_str("[provider]\nauth = \"api_key\"\n").unwrap();
        assert_eq!(config.provider.auth, ProviderAuth::ApiKey);
    }

    #[test]
    fn auth_env_override() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("HERMOD_PROVIDER_AUTH", "API_KEY")]))
            .unwrap();
        assert_eq!(config.provider.auth, ProviderAuth::ApiKey);

        let err = config
            .apply_env(env(&[("HERMOD_PROVIDER_AUTH", "password")]))
            .unwrap_err();
        assert!(err.to_string().contains("HERMOD_PROVIDER_AUTH"));
    }

    #[test]
    fn aws_credentials_prefer_secrets_file() {
        let secrets: Secrets = toml::from_str(
            r#"
            [aws]
            access_key_id = "AKIDFILE"
            secret_access_key = "file-secret"
        "#,
        )
        .unwrap();
        let creds = secrets
            .aws_credentials_with(env(&[
                (ACCESS_KEY_ID_ENV, "AKIDENV"),
                (SECRET_ACCESS_KEY_ENV, "env-secret"),
            ]))
            .unwrap();
        assert_eq!(creds.access_key_id, "AKIDFILE");
        assert!(creds.session_token.is_none());
    }

    #[test]
    fn aws_credentials_fall_back_to_env_pair() {
        let secrets = Secrets::default();
        let creds = secrets
            .aws_credentials_with(env(&[
                (ACCESS_KEY_ID_ENV, "AKIDENV"),
                (SECRET_ACCESS_KEY_ENV, "env-secret"),
                (SESSION_TOKEN_ENV, "tok"),
            ]))
            .unwrap();
        assert_eq!(creds.access_key_id, "AKIDENV");
        assert_eq!(creds.secret_access_key, "env-secret");
        assert_eq!(creds.session_token.as_deref(), Some("tok"));
        assert_eq!(creds.to_credentials().access_key_id(), "AKIDENV");

        // Half a pair leaves it to the default chain.
        assert!(
            secrets
                .aws_credentials_with(env(&[(ACCESS_KEY_ID_ENV, "AKIDENV")]))
                .is_none()
        );
    }

    #[test]
    fn aws_secret_is_redacted_in_debug() {
        let secrets: Secrets = toml::from_str(
            "[aws]\naccess_key_id = \"AKID\"\nsecret_access_key = \"hunter2\"\n",
        )
        .unwrap();
        let shown = format!("{secrets:?}");
        assert!(shown.contains("AKID"));
        assert!(!shown.contains("hunter2"));
    }
}
