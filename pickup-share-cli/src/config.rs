use pickup_share_core::{Roster, RoomId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_ROOM_ID: &str = "family";

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Which document store backs the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON files in `data_dir`
    #[default]
    File,
    /// Process memory; nothing survives the command
    Memory,
    /// Cloud Firestore
    Firestore,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::File => write!(f, "file"),
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Firestore => write!(f, "firestore"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "memory" => Ok(StoreBackend::Memory),
            "firestore" => Ok(StoreBackend::Firestore),
            _ => Err(format!(
                "Invalid store '{}'. Valid options: file, memory, firestore",
                s
            )),
        }
    }
}

/// Firestore connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FirestoreConfig {
    /// Google Cloud project ID
    pub project_id: Option<String>,
    /// Web API key
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Collection holding the schedule documents (default: "schedules")
    pub collection: Option<String>,
    /// Endpoint override, e.g. "http://localhost:8080" for the emulator
    pub base_url: Option<String>,
    /// How often to re-read the open week, in milliseconds
    pub poll_interval_ms: Option<u64>,
}

/// Local file store settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    /// How often to re-read the open week, in milliseconds
    pub poll_interval_ms: Option<u64>,
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Room whose schedules are shared
    pub room_id: ConfigValue<RoomId>,
    /// Document store backend
    pub store: ConfigValue<StoreBackend>,
    /// Directory for the file store
    pub data_dir: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Display names of the participants
    pub participants: Roster,
    pub firestore: FirestoreConfig,
    pub file: FileConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    room_id: Option<String>,
    store: Option<StoreBackend>,
    data_dir: Option<PathBuf>,
    participants: Option<Roster>,
    firestore: Option<FirestoreConfig>,
    file: Option<FileConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut room_id = ConfigValue::new(parse_room_id(DEFAULT_ROOM_ID)?, ConfigSource::Default);
        let mut store = ConfigValue::new(StoreBackend::default(), ConfigSource::Default);
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut config_file = None;
        let mut participants = Roster::default();
        let mut firestore = FirestoreConfig::default();
        let mut file = FileConfig::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(id) = file_config.room_id {
                room_id = ConfigValue::new(parse_room_id(&id)?, ConfigSource::File);
            }
            if let Some(backend) = file_config.store {
                store = ConfigValue::new(backend, ConfigSource::File);
            }
            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(roster) = file_config.participants {
                participants = roster;
            }
            if let Some(firestore_config) = file_config.firestore {
                firestore = firestore_config;
            }
            if let Some(file_store_config) = file_config.file {
                file = file_store_config;
            }
        }

        // Apply environment variable overrides
        if let Ok(id) = std::env::var("PICKUP_ROOM_ID") {
            room_id = ConfigValue::new(parse_room_id(&id)?, ConfigSource::Environment);
        }
        if let Ok(backend) = std::env::var("PICKUP_STORE") {
            let backend = backend
                .parse::<StoreBackend>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "PICKUP_STORE",
                    message,
                })?;
            store = ConfigValue::new(backend, ConfigSource::Environment);
        }
        if let Ok(dir) = std::env::var("PICKUP_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        // Firestore env var overrides
        if let Ok(project) = std::env::var("PICKUP_FIRESTORE_PROJECT") {
            firestore.project_id = Some(project);
        }
        if let Ok(key) = std::env::var("PICKUP_FIRESTORE_API_KEY") {
            firestore.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("PICKUP_FIRESTORE_URL") {
            firestore.base_url = Some(url);
        }

        Ok(Self {
            room_id,
            store,
            data_dir,
            config_file,
            participants,
            firestore,
            file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/pickup/
    /// - macOS: ~/Library/Application Support/pickup/
    /// - Windows: %APPDATA%/pickup/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pickup")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/pickup/
    /// - macOS: ~/Library/Application Support/pickup/
    /// - Windows: %APPDATA%/pickup/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pickup")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn parse_room_id(id: &str) -> Result<RoomId, ConfigError> {
    RoomId::new(id).map_err(|e| ConfigError::InvalidValue {
        key: "room_id",
        message: e.to_string(),
    })
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue { key: &'static str, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue { key, message } => {
                write!(f, "Invalid value for {}: {}", key, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
