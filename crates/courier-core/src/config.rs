use std::fmt;

use anyhow::Result;
use config::{Config, ConfigBuilder, builder::DefaultState};
use serde::Deserialize;

use crate::constants::{DEFAULT_DOWNLOAD_DIR, DEFAULT_PORT, ENV_PREFIX};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub download: DownloadConfig,
    #[serde(default)]
    pub headers: HeaderConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address as a string in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone, Deserialize)]
pub struct DownloadConfig {
    /// Shared secret for link signatures and server-side envelopes.
    /// Empty disables signature verification.
    #[serde(default)]
    pub sign_key: String,
    /// Root directory that `file://` references are confined to.
    pub dir: String,
}

impl DownloadConfig {
    /// ## Summary
    /// Returns true when no sign key is configured and plain query links are served unsigned.
    #[must_use]
    pub fn is_open_mode(&self) -> bool {
        self.sign_key.is_empty()
    }
}

impl fmt::Debug for DownloadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadConfig")
            .field(
                "sign_key",
                &if self.sign_key.is_empty() {
                    "<unset>"
                } else {
                    "<redacted>"
                },
            )
            .field("dir", &self.dir)
            .finish()
    }
}

/// Overrides for the header allow-lists. `None` keeps the built-in list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeaderConfig {
    pub request_allow: Option<Vec<String>>,
    pub response_allow: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("download.sign_key", "")?
            .set_default("download.dir", DEFAULT_DOWNLOAD_DIR)?
            .set_default("logging.level", "info")?)
    }

    /// Env source, e.g. `COURIER_DOWNLOAD__SIGN_KEY`.
    ///
    /// Values stay strings until deserialization so a numeric-looking sign key
    /// keeps its exact text. Typed fields such as the port still parse.
    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .ignore_empty(true)
            .try_parsing(false)
    }

    fn layered(environment: config::Environment) -> Result<Self> {
        Ok(Self::builder_with_defaults()?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .add_source(environment)
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `config.toml` values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Self::layered(Self::environment())
    }

    /// ## Summary
    /// Builds settings from an in-memory TOML document layered over the defaults.
    ///
    /// ## Errors
    /// Returns an error if the document is not valid TOML or does not deserialize.
    pub fn from_toml(document: &str) -> Result<Self> {
        Ok(Self::builder_with_defaults()?
            .add_source(config::File::from_str(document, config::FileFormat::Toml))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
