use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_LEDGER_SCOPE: &str = "default";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub cors: Option<CorsConfig>,
    pub server: Option<ServerConfig>,
    pub database: Option<DatabaseConfig>,
    pub dedupe: Option<DedupeConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors: Some(CorsConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            }),
            server: Some(ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            }),
            database: None,
            dedupe: Some(DedupeConfig::default()),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DatabaseConfig {
    /// Overrides the platform data directory location
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DedupeConfig {
    /// Whose dismissals are read and written
    pub ledger_scope: String,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            ledger_scope: DEFAULT_LEDGER_SCOPE.to_string(),
        }
    }
}

const DEFAULT_CONFIG: &str = r#"
[cors]
allowed_origins = ["http://localhost:3030"]

[server]
host = "127.0.0.1"
port = 8080

[database]
# path = "/path/to/contacts.db"

[dedupe]
# Dismissed duplicate groups are stored per scope
ledger_scope = "default"
"#;

impl ApiConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        Self::load_from(get_config_path())
    }

    /// Loads `config_path`, writing the default file first if it does not exist.
    pub fn load_from(config_path: PathBuf) -> Result<(Self, PathBuf), ConfigError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .build()?;

        let config: ApiConfig = builder.try_deserialize()?;

        Ok((config, config_path))
    }

    pub fn ledger_scope(&self) -> &str {
        self.dedupe
            .as_ref()
            .map(|d| d.ledger_scope.as_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_LEDGER_SCOPE)
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.database.as_ref().and_then(|d| d.path.as_deref())
    }

    pub fn server_address(&self) -> (String, u16) {
        match &self.server {
            Some(server) => (server.host.clone(), server.port),
            None => ("127.0.0.1".to_string(), 8080),
        }
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("contact-dedupe").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}
