use downscope_auth::ExchangeConfig;
use downscope_auth::exchange::{STS_ENDPOINT, TOKEN_INFO_ENDPOINT};
use downscope_types::{AccessBoundary, DownscopedOptions};
use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Environment variable prefix for overrides (`DOWNSCOPE_TIMEOUT_SECS=5`).
pub const ENV_PREFIX: &str = "DOWNSCOPE_";

fn default_sts_endpoint() -> String {
    STS_ENDPOINT.to_string()
}
fn default_token_info_endpoint() -> String {
    TOKEN_INFO_ENDPOINT.to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_level() -> String {
    "info".to_string()
}

/// Logging output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset (defaults to `info`).
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Token-exchange endpoint.
    #[serde(default = "default_sts_endpoint")]
    pub sts_endpoint: String,
    /// Tokeninfo endpoint used when the exchange omits `expires_in`.
    #[serde(default = "default_token_info_endpoint")]
    pub token_info_endpoint: String,
    /// HTTP timeout applied by the transport (defaults to 30 s).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Access boundary in wire shape (`accessBoundaryRules: [...]`).
    #[serde(default)]
    pub access_boundary: Option<AccessBoundary>,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sts_endpoint: default_sts_endpoint(),
            token_info_endpoint: default_token_info_endpoint(),
            timeout_secs: default_timeout_secs(),
            access_boundary: None,
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Parses configuration from a YAML string, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML is invalid or extraction fails.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::string(yaml))
            .extract()
    }

    /// Loads configuration from a file path, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be read or parsed.
    #[allow(clippy::result_large_err)]
    pub fn from_file(path: &Path) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .extract()
    }

    /// Defaults, then the optional YAML file, then `DOWNSCOPE_*` variables
    /// (`__` separates nested keys, e.g. `DOWNSCOPE_LOG__JSON=true`).
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if any layer fails to parse.
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    /// Endpoints for the exchange client.
    #[must_use]
    pub fn exchange_config(&self) -> ExchangeConfig {
        ExchangeConfig {
            sts_endpoint: self.sts_endpoint.clone(),
            token_info_endpoint: self.token_info_endpoint.clone(),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured boundary wrapped as exchange options, if any.
    #[must_use]
    pub fn downscoped_options(&self) -> Option<DownscopedOptions> {
        self.access_boundary.clone().map(DownscopedOptions::new)
    }
}
