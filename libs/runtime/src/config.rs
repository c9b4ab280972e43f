use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};

use crate::paths::home_dir::resolve_home_dir;

/// Environment variables with this prefix override file and default values.
pub const ENV_PREFIX: &str = "APP__";

/// Main application configuration with strongly-typed global sections
/// and a flexible per-module configuration bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Process-wide settings.
    pub app: AppSection,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
    /// Directory containing per-module YAML files (optional).
    #[serde(default)]
    pub modules_dir: Option<String>,
    /// Per-module configuration bag: module_name → arbitrary JSON/YAML value.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppSection {
    pub home_dir: String, // will be normalized to absolute path
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    pub file: String,          // "logs/todo_sync.log"
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_size_mb: Option<u64>, // Max size of the file in MB
}

impl Default for AppSection {
    fn default() -> Self {
        // Empty => use platform default resolved by resolve_home_dir():
        // Windows: %APPDATA%/.todo_sync
        // Unix/macOS: $HOME/.todo_sync
        Self {
            home_dir: String::new(),
        }
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "warn".to_string(),
            file: "logs/todo_sync.log".to_string(),
            file_level: "debug".to_string(),
            max_size_mb: Some(20),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            logging: Some(default_logging_config()),
            modules_dir: None,
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file → environment variables.
    /// Also normalizes `app.home_dir` into an absolute path and creates the directory.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        // Optional sections stay None unless YAML/ENV provide them.
        let base = AppConfig {
            app: AppSection::default(),
            logging: None,
            modules_dir: None,
            modules: HashMap::new(),
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(config_path.as_ref()))
            // Example: APP__MODULES__TODO_SYNC__BACKEND=local maps to modules.todo_sync.backend
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::from_figment(figment)
    }

    /// Load from file if provided, otherwise defaults overlaid with environment variables.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => Self::load_env_only(ENV_PREFIX),
        }
    }

    fn load_env_only(prefix: &str) -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(prefix).split("__"));
        Self::from_figment(figment).context("Failed to load config (defaults)")
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let mut config: AppConfig = figment
            .extract()
            .with_context(|| "Failed to extract config from figment".to_string())?;

        normalize_home_dir_inplace(&mut config.app).context("Failed to resolve app.home_dir")?;

        if let Some(dir) = config.modules_dir.clone() {
            merge_module_files(&mut config.modules, dir)?;
        }

        Ok(config)
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            default_section.console_level = match args.verbose {
                0 => default_section.console_level.clone(), // keep
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            };
        }
    }

    /// Lenient: module section deserialized into `T`, or `T::default()` when absent or invalid.
    pub fn module_config<T: DeserializeOwned + Default>(&self, module_name: &str) -> T {
        self.modules
            .get(module_name)
            .and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Strict: deserialize the module's section into `T`, returning a pathful error on failure.
    /// A missing section deserializes from an empty object so field defaults still apply.
    pub fn module_config_required<T: DeserializeOwned>(&self, module_name: &str) -> Result<T> {
        let val = self
            .modules
            .get(module_name)
            .cloned()
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

        serde_json::from_value(val)
            .map_err(|e| anyhow::anyhow!("invalid {module_name} config: {}", e))
    }

    /// Base directory for relative paths (already absolute after loading).
    pub fn home_dir(&self) -> PathBuf {
        PathBuf::from(&self.app.home_dir)
    }
}

/// Command line arguments structure.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub print_config: bool,
    pub verbose: u8,
}

const fn default_subdir() -> &'static str {
    ".todo_sync"
}

/// Normalize `app.home_dir` using `resolve_home_dir` and store the absolute path back.
fn normalize_home_dir_inplace(app: &mut AppSection) -> Result<()> {
    // Treat empty string as "not provided" => None.
    let opt = if app.home_dir.trim().is_empty() {
        None
    } else {
        Some(app.home_dir.clone())
    };

    let resolved: PathBuf = resolve_home_dir(opt, default_subdir(), /*create*/ true)
        .context("home_dir normalization failed")?;

    app.home_dir = resolved.to_string_lossy().to_string();
    Ok(())
}

fn merge_module_files(
    bag: &mut HashMap<String, serde_json::Value>,
    dir: impl AsRef<Path>,
) -> Result<()> {
    use std::fs;
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if ext != "yml" && ext != "yaml" {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();
        let raw = fs::read_to_string(&path)?;
        let val: serde_yaml::Value = serde_yaml::from_str(&raw)?;
        let json = serde_json::to_value(val)?;
        bag.insert(name, json);
    }
    Ok(())
}
