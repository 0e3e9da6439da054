use crate::application::schema_service::{CONFIG_SCHEMA, SchemaService};
use crate::infrastructure::security::generate_secret;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument, warn};

pub const CONFIG_PATH_ENV: &str = "COURSE_BOOKING_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_MONGO_PORT: u16 = 27017;
const DATABASE_NAME: &str = "lecturedb";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    pub host: String,
    #[serde(default = "default_mongo_port")]
    pub port: u16,
    pub auth: MongoAuth,
}

fn default_mongo_port() -> u16 {
    DEFAULT_MONGO_PORT
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

impl MongoConfig {
    pub fn connection_uri(&self) -> String {
        self.uri_with_password(&self.auth.password)
    }

    /// Same as [`connection_uri`](Self::connection_uri) with the password masked, for logs.
    pub fn redacted_uri(&self) -> String {
        self.uri_with_password("****")
    }

    fn uri_with_password(&self, password: &str) -> String {
        format!(
            "mongodb://{}:{}@{}:{}/{}?authSource=admin",
            self.auth.username, password, self.host, self.port, DATABASE_NAME
        )
    }
}

/// The settings file as written on disk.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    port: u16,
    #[serde(default = "default_host")]
    host: String,
    #[serde(default)]
    mongodb: Option<MongoConfig>,
    #[serde(default)]
    jwt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Configuration {
    pub port: u16,
    pub host: String,
    pub mongodb: Option<MongoConfig>,
    /// HS256 signing secret for session tokens.
    pub jwt: String,
}

impl Configuration {
    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: default_host(),
            mongodb: None,
            jwt: random_secret(),
        }
    }
}

impl From<ConfigFile> for Configuration {
    fn from(file: ConfigFile) -> Self {
        Self {
            port: file.port,
            host: file.host,
            mongodb: file.mongodb,
            jwt: file.jwt.filter(|s| !s.is_empty()).unwrap_or_else(random_secret),
        }
    }
}

fn random_secret() -> String {
    warn!("No jwt secret configured, using a random secret for this process");
    generate_secret()
}

/// Path of the settings file, taken from `COURSE_BOOKING_CONFIG`.
pub fn config_path_from_env() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Loads the settings file on first use and hands out the cached result
/// afterwards.
pub struct ConfigService {
    path: PathBuf,
    schemas: Arc<SchemaService>,
    cached: OnceCell<Configuration>,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>, schemas: Arc<SchemaService>) -> Self {
        Self {
            path: path.into(),
            schemas,
            cached: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get_configuration(&self) -> &Configuration {
        self.cached.get_or_init(|| self.load()).await
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Configuration {
        match self.read_file().await {
            Ok(config) => {
                info!(port = config.port, host = %config.host, "Configuration loaded");
                if let Some(mongo) = &config.mongodb {
                    debug!(uri = %mongo.redacted_uri(), "Document store settings");
                }
                config
            }
            Err(e) => {
                error!(error = %e, "Could not load configuration, using defaults");
                Configuration::default()
            }
        }
    }

    async fn read_file(&self) -> Result<Configuration> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        let value: Value = serde_json::from_str(&raw).context("configuration is not valid JSON")?;
        self.schemas.validate(CONFIG_SCHEMA, &value)?;
        let file: ConfigFile = serde_json::from_value(value)?;
        Ok(file.into())
    }
}
