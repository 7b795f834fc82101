use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Repository the shared templates are fetched from unless configured otherwise.
pub const DEFAULT_REPO: &str = "https://github.com/shared-prompts/shared-prompts";

/// Name of the per-project override file, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".shared-prompts.toml";

/// Status of config file loading
#[derive(Debug, Clone)]
pub enum ConfigLoadStatus {
    /// Config loaded successfully from existing file
    Loaded,
    /// Created default config file (first run)
    Created,
    /// Error occurred during loading, using defaults.
    Error(String),
}

/// Remote template collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub repo: String,
    pub branch: String,
    /// Network timeout for the snapshot download, in seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            repo: DEFAULT_REPO.to_string(),
            branch: "main".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of the local installation.
    pub root: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: ".cursor".to_string(),
        }
    }
}

/// Sync behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Extensions (without the dot) of files counted as templates.
    pub extensions: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string(), "mdc".to_string()],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Expand `~` to home directory in a path string
    pub fn expand_tilde(path: &str) -> PathBuf {
        if let Some(stripped) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(stripped);
        }
        PathBuf::from(path)
    }

    /// Get the expanded installation root
    pub fn root_path(&self) -> PathBuf {
        Self::expand_tilde(&self.paths.root)
    }
}

/// Partial remote configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialRemoteConfig {
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Partial path configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialPathsConfig {
    pub root: Option<String>,
}

/// Partial sync configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialSyncConfig {
    pub extensions: Option<Vec<String>>,
}

/// Partial logging configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialLoggingConfig {
    pub level: Option<String>,
}

/// Project-specific configuration where every field is optional.
/// Parsed from `.shared-prompts.toml`. Fields that are `None` inherit from the global config.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialConfig {
    pub remote: PartialRemoteConfig,
    pub paths: PartialPathsConfig,
    pub sync: PartialSyncConfig,
    pub logging: PartialLoggingConfig,
}

/// Merge a global config with a project-level partial config.
/// Project values override global values where present.
pub fn merge_config(global: &Config, project: &PartialConfig) -> Config {
    Config {
        remote: RemoteConfig {
            repo: project
                .remote
                .repo
                .clone()
                .unwrap_or_else(|| global.remote.repo.clone()),
            branch: project
                .remote
                .branch
                .clone()
                .unwrap_or_else(|| global.remote.branch.clone()),
            timeout_secs: project
                .remote
                .timeout_secs
                .unwrap_or(global.remote.timeout_secs),
        },
        paths: PathsConfig {
            root: project
                .paths
                .root
                .clone()
                .unwrap_or_else(|| global.paths.root.clone()),
        },
        sync: SyncConfig {
            extensions: project
                .sync
                .extensions
                .clone()
                .unwrap_or_else(|| global.sync.extensions.clone()),
        },
        logging: LoggingConfig {
            level: project
                .logging
                .level
                .clone()
                .unwrap_or_else(|| global.logging.level.clone()),
        },
    }
}

/// Loaded configuration with metadata
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_path: PathBuf,
    pub project_config_path: Option<PathBuf>,
    pub status: ConfigLoadStatus,
    /// Problem with the project file, if one was found but unusable.
    pub project_error: Option<String>,
}

/// Get the platform-appropriate config directory
fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "shared-prompts", "shared-prompts")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the full path to the config file
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path in the current working directory.
pub fn get_project_config_path() -> Option<PathBuf> {
    let path = std::env::current_dir().ok()?.join(PROJECT_CONFIG_FILE);
    if path.exists() { Some(path) } else { None }
}

/// Load a project config from the given path.
fn load_project_config(path: &Path) -> Result<PartialConfig, String> {
    let contents = fs::read_to_string(path).map_err(|e| {
        warn!(path = ?path, error = %e, "project_config_read_failed");
        format!("Failed to read {}: {}", PROJECT_CONFIG_FILE, e)
    })?;

    toml::from_str::<PartialConfig>(&contents).map_err(|e| {
        warn!(path = ?path, error = %e, "project_config_parse_failed");
        format!("Invalid {}: {}", PROJECT_CONFIG_FILE, e)
    })
}

/// Load configuration from file, environment, and defaults
pub fn load_config() -> LoadedConfig {
    let project_config_path = get_project_config_path();

    match get_config_path() {
        Some(config_path) => load_config_from(&config_path, project_config_path.as_deref()),
        None => {
            warn!("Could not determine config directory, using defaults");
            let mut loaded = load_config_from(Path::new(""), project_config_path.as_deref());
            loaded.config_path = PathBuf::from("config.toml");
            loaded.status =
                ConfigLoadStatus::Error("Could not determine config directory".to_string());
            loaded
        }
    }
}

/// Load the global config at `config_path` (created with defaults if
/// missing), merge the optional project file over it, then apply the
/// environment. An empty `config_path` skips the global file.
pub fn load_config_from(config_path: &Path, project_config_path: Option<&Path>) -> LoadedConfig {
    debug!("Config path: {:?}", config_path);

    let (mut config, status) = if config_path.as_os_str().is_empty() {
        (Config::default(), ConfigLoadStatus::Loaded)
    } else {
        load_or_create_config(config_path)
    };

    let mut project_error = None;
    if let Some(project_path) = project_config_path {
        match load_project_config(project_path) {
            Ok(partial) => {
                config = merge_config(&config, &partial);
                info!(path = ?project_path, "project_config_loaded");
            }
            Err(e) => {
                warn!(path = ?project_path, error = %e, "project_config_error");
                // Keep using global config only
                project_error = Some(e);
            }
        }
    }

    let config = apply_env_overrides(config, |key| env::var(key).ok());

    LoadedConfig {
        config,
        config_path: config_path.to_path_buf(),
        project_config_path: project_config_path.map(Path::to_path_buf),
        status,
        project_error,
    }
}

/// Load config from file, or create default if not exists
fn load_or_create_config(config_path: &Path) -> (Config, ConfigLoadStatus) {
    match fs::read_to_string(config_path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(config) => {
                info!("Loaded config from {:?}", config_path);
                (config, ConfigLoadStatus::Loaded)
            }
            Err(e) => {
                warn!(
                    "Config file malformed at {:?}: {}. Using defaults.",
                    config_path, e
                );
                (
                    Config::default(),
                    ConfigLoadStatus::Error(format!("Malformed TOML: {}", e)),
                )
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => create_default_config(config_path),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            warn!(
                "Permission denied reading config at {:?}. Using defaults.",
                config_path
            );
            (
                Config::default(),
                ConfigLoadStatus::Error("Permission denied reading config".to_string()),
            )
        }
        Err(e) => {
            warn!(
                "Error reading config at {:?}: {}. Using defaults.",
                config_path, e
            );
            (
                Config::default(),
                ConfigLoadStatus::Error(format!("Read error: {}", e)),
            )
        }
    }
}

/// Create the default config file
fn create_default_config(config_path: &Path) -> (Config, ConfigLoadStatus) {
    let config = Config::default();

    // Ensure parent directory exists
    if let Some(parent) = config_path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!(
            "Could not create config directory {:?}: {}. Continuing without file.",
            parent, e
        );
        return (
            config,
            ConfigLoadStatus::Error(format!("Could not create config directory: {}", e)),
        );
    }

    let toml_content = match toml::to_string_pretty(&config) {
        Ok(s) => s,
        Err(e) => {
            warn!("Could not serialize default config: {}", e);
            return (
                config,
                ConfigLoadStatus::Error(format!("Serialization error: {}", e)),
            );
        }
    };

    match fs::write(config_path, &toml_content) {
        Ok(()) => {
            info!("Created default config at {:?}", config_path);
            (config, ConfigLoadStatus::Created)
        }
        Err(e) => {
            warn!(
                "Could not write default config to {:?}: {}. Continuing without file.",
                config_path, e
            );
            (
                config,
                ConfigLoadStatus::Error(format!("Write error: {}", e)),
            )
        }
    }
}

/// Apply environment variable overrides to config.
/// `lookup` resolves a variable name to its value.
fn apply_env_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(repo) = lookup("SHARED_PROMPTS_REPO") {
        debug!("Overriding remote.repo from SHARED_PROMPTS_REPO");
        config.remote.repo = repo;
    }

    if let Some(branch) = lookup("SHARED_PROMPTS_BRANCH") {
        debug!("Overriding remote.branch from SHARED_PROMPTS_BRANCH");
        config.remote.branch = branch;
    }

    if let Some(root) = lookup("SHARED_PROMPTS_ROOT") {
        debug!("Overriding paths.root from SHARED_PROMPTS_ROOT");
        config.paths.root = root;
    }

    if let Some(level) = lookup("SHARED_PROMPTS_LOG") {
        debug!("Overriding logging.level from SHARED_PROMPTS_LOG");
        config.logging.level = level;
    }

    config
}
