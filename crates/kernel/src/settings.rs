use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "SHELF_ENV";
const CONFIG_DIR_ENV: &str = "SHELF_CONFIG_DIR";
const ENV_PREFIX: &str = "SHELF";

/// Upper bound on URLs in one sitemap document imposed by the sitemap protocol.
pub const SITEMAP_PROTOCOL_MAX_URLS: usize = 50_000;

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub sitemap: SitemapSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from an explicit directory and environment name.
    pub fn load_from(config_dir: &std::path::Path, environment: &str) -> anyhow::Result<Self> {
        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = Environment::parse(environment)?;
        settings.validate()?;

        Ok(settings)
    }

    /// Reject configurations the services cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.catalog.source_url.trim().is_empty() {
            bail!("catalog.source_url must not be empty");
        }

        let chunk_size = self.sitemap.chunk_size;
        if chunk_size == 0 || chunk_size > SITEMAP_PROTOCOL_MAX_URLS {
            bail!(
                "sitemap.chunk_size must be between 1 and {}, got {}",
                SITEMAP_PROTOCOL_MAX_URLS,
                chunk_size
            );
        }

        if self.sitemap.last_modified == LastModifiedPolicy::Fixed {
            self.sitemap.fixed_timestamp()?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

/// Where the book list comes from and how long we wait for it.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "CatalogSettings::default_source_url")]
    pub source_url: String,
    #[serde(default = "CatalogSettings::default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "CatalogSettings::default_user_agent")]
    pub user_agent: String,
}

impl CatalogSettings {
    fn default_source_url() -> String {
        "https://mugi-personal.s3.ap-south-1.amazonaws.com/sitemap-books.json".to_string()
    }

    fn default_fetch_timeout_ms() -> u64 {
        10000
    }

    fn default_user_agent() -> String {
        format!("shelf/{}", env!("CARGO_PKG_VERSION"))
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            source_url: Self::default_source_url(),
            fetch_timeout_ms: Self::default_fetch_timeout_ms(),
            user_agent: Self::default_user_agent(),
        }
    }
}

/// How `<lastmod>` values are chosen for sitemap entries.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LastModifiedPolicy {
    /// Time of the request being served.
    #[default]
    Request,
    /// Time the sitemap module was constructed.
    Startup,
    /// The configured `fixed_last_modified` timestamp.
    Fixed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SitemapSettings {
    #[serde(default = "SitemapSettings::default_manifest_path")]
    pub manifest_path: PathBuf,
    #[serde(default = "SitemapSettings::default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "SitemapSettings::default_site_url")]
    pub site_url: String,
    #[serde(default)]
    pub last_modified: LastModifiedPolicy,
    #[serde(default)]
    pub fixed_last_modified: Option<String>,
}

impl SitemapSettings {
    fn default_manifest_path() -> PathBuf {
        PathBuf::from("data/urls.json")
    }

    fn default_chunk_size() -> usize {
        45_000
    }

    fn default_site_url() -> String {
        "https://books.themukesh.com".to_string()
    }

    /// Parse `fixed_last_modified` as an RFC 3339 timestamp.
    pub fn fixed_timestamp(&self) -> anyhow::Result<OffsetDateTime> {
        let raw = self
            .fixed_last_modified
            .as_deref()
            .ok_or_else(|| anyhow!("sitemap.fixed_last_modified is required for the fixed policy"))?;

        OffsetDateTime::parse(raw, &Rfc3339)
            .with_context(|| format!("sitemap.fixed_last_modified '{}' is not RFC 3339", raw))
    }
}

impl Default for SitemapSettings {
    fn default() -> Self {
        Self {
            manifest_path: Self::default_manifest_path(),
            chunk_size: Self::default_chunk_size(),
            site_url: Self::default_site_url(),
            last_modified: LastModifiedPolicy::default(),
            fixed_last_modified: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_log_filter")]
    pub log_filter: String,
}

impl TelemetrySettings {
    fn default_log_filter() -> String {
        "info,tower_http=info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_filter: Self::default_log_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
