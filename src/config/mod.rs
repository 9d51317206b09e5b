use serde::{Deserialize, Serialize};
use std::env;

/// Environment-derived settings, built once at startup and handed to `AppState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub store: StoreConfig,
    pub attachments: AttachmentConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub table_name: String,
    pub index_name: String,
    /// Local DynamoDB (`http://localhost:8000`, region `localhost`)
    pub offline: bool,
    pub endpoint: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentConfig {
    pub bucket: String,
    pub url_expiration_secs: u64,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// PEM trust anchor; never logged
    #[serde(skip_serializing)]
    pub public_key_pem: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("Failed to read {path}: {source}")]
    KeyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub const OFFLINE_DYNAMODB_ENDPOINT: &str = "http://localhost:8000";
pub const OFFLINE_REGION: &str = "localhost";

/// S3 rejects presigned URLs valid for longer than a week
pub const MAX_SIGNED_URL_EXPIRATION: u64 = 7 * 24 * 60 * 60;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let defaults = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };

        let mut config = defaults.with_env_overrides()?;
        config.auth.public_key_pem = load_public_key()?;

        if config.store.table_name.is_empty() {
            return Err(ConfigError::Missing("TODOS_TABLE"));
        }
        if config.attachments.bucket.is_empty() {
            return Err(ConfigError::Missing("ATTACHMENTS_S3_BUCKET"));
        }

        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Store overrides
        if let Ok(v) = env::var("TODO_STORE") {
            self.store.backend = match v.to_ascii_lowercase().as_str() {
                "dynamodb" | "dynamo" => StoreBackend::DynamoDb,
                "memory" => StoreBackend::Memory,
                _ => return Err(ConfigError::Invalid { name: "TODO_STORE", value: v }),
            };
        }
        if let Ok(v) = env::var("TODOS_TABLE") {
            self.store.table_name = v;
        }
        if let Ok(v) = env::var("INDEX_NAME") {
            self.store.index_name = v;
        }
        if let Ok(v) = env::var("IS_OFFLINE") {
            self.store.offline = parse_flag(&v).unwrap_or(self.store.offline);
        }
        if let Ok(v) = env::var("DYNAMODB_ENDPOINT") {
            self.store.endpoint = non_empty(v);
        }
        if let Ok(v) = env::var("AWS_REGION") {
            self.store.region = non_empty(v);
        }

        // Attachment overrides
        if let Ok(v) = env::var("ATTACHMENTS_S3_BUCKET") {
            self.attachments.bucket = v;
        }
        if let Ok(v) = env::var("SIGNED_URL_EXPIRATION") {
            self.attachments.url_expiration_secs = parse_url_expiration(&v)?;
        }
        if let Ok(v) = env::var("S3_ENDPOINT") {
            self.attachments.endpoint = non_empty(v);
        }

        // Auth overrides
        if let Ok(v) = env::var("AUTH_ISSUER") {
            self.auth.issuer = non_empty(v);
        }
        if let Ok(v) = env::var("AUTH_AUDIENCE") {
            self.auth.audience = non_empty(v);
        }
        if let Ok(v) = env::var("AUTH_LEEWAY_SECS") {
            self.auth.leeway_secs = v.parse().unwrap_or(self.auth.leeway_secs);
        }

        // API overrides
        if let Ok(v) = env::var("HOST") {
            self.api.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.api.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(self)
    }

    /// DynamoDB endpoint after applying the offline toggle. An explicit endpoint wins.
    pub fn dynamodb_endpoint(&self) -> Option<String> {
        self.store.endpoint.clone().or_else(|| {
            self.store
                .offline
                .then(|| OFFLINE_DYNAMODB_ENDPOINT.to_string())
        })
    }

    pub fn region(&self) -> Option<String> {
        self.store
            .region
            .clone()
            .or_else(|| self.store.offline.then(|| OFFLINE_REGION.to_string()))
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            store: StoreConfig {
                backend: StoreBackend::DynamoDb,
                table_name: "Todos-dev".to_string(),
                index_name: "UserIdIndex".to_string(),
                offline: false,
                endpoint: None,
                region: None,
            },
            attachments: AttachmentConfig {
                bucket: "todo-attachments-dev".to_string(),
                url_expiration_secs: 300,
                endpoint: None,
            },
            auth: AuthConfig {
                public_key_pem: String::new(),
                issuer: None,
                audience: None,
                leeway_secs: 60,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_origins: vec!["*".to_string()],
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.store.table_name = String::new();
        config.attachments.bucket = String::new();
        config
    }

    fn production() -> Self {
        let mut config = Self::staging();
        config.environment = Environment::Production;
        config.auth.leeway_secs = 30;
        config
    }
}

fn load_public_key() -> Result<String, ConfigError> {
    if let Ok(pem) = env::var("AUTH_PUBLIC_KEY") {
        if !pem.trim().is_empty() {
            // Single-line env values carry literal "\n" sequences
            return Ok(pem.replace("\\n", "\n"));
        }
    }

    if let Ok(path) = env::var("AUTH_PUBLIC_KEY_FILE") {
        return std::fs::read_to_string(&path).map_err(|source| ConfigError::KeyFile { path, source });
    }

    Err(ConfigError::Missing("AUTH_PUBLIC_KEY or AUTH_PUBLIC_KEY_FILE"))
}

fn parse_url_expiration(value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if (1..=MAX_SIGNED_URL_EXPIRATION).contains(&secs) => Ok(secs),
        _ => Err(ConfigError::Invalid {
            name: "SIGNED_URL_EXPIRATION",
            value: value.to_string(),
        }),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
