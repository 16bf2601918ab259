//! Persisted settings – reads/writes `~/.formwatch/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use formwatch_kernel::{DeskThresholds, PostureThresholds, SquatThresholds};
use formwatch_middleware::DEFAULT_CAPACITY;
use formwatch_relay::DEFAULT_PORT;
use formwatch_types::FormError;
use serde::{Deserialize, Serialize};

/// Settings stored in `~/.formwatch/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// TCP port for the WebSocket relay.
    #[serde(default = "default_relay_port")]
    pub relay_port: u16,

    /// Per-topic capacity of the event bus. Must be non-zero.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    #[serde(default)]
    pub squat: SquatThresholds,

    #[serde(default)]
    pub desk: DeskThresholds,
}

fn default_relay_port() -> u16 {
    DEFAULT_PORT
}
fn default_bus_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_port: default_relay_port(),
            bus_capacity: default_bus_capacity(),
            squat: SquatThresholds::default(),
            desk: DeskThresholds::default(),
        }
    }
}

impl Config {
    /// Rule thresholds in the shape the dispatcher expects.
    pub fn thresholds(&self) -> PostureThresholds {
        PostureThresholds {
            squat: self.squat,
            desk: self.desk,
        }
    }
}

/// Return the path to `~/.formwatch/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".formwatch").join("config.toml")
}

/// Load the config from `path` and apply environment overrides.
pub fn load_from(path: &Path) -> Result<Option<Config>, FormError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        FormError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| FormError::Config(format!("failed to parse {}: {e}", path.display())))?;
    if cfg.bus_capacity == 0 {
        return Err(FormError::Config("bus_capacity must be greater than zero".to_string()));
    }
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `FORMWATCH_*` environment overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `FORMWATCH_RELAY_PORT` | `relay_port` |
/// | `FORMWATCH_BUS_CAPACITY` | `bus_capacity` |
///
/// Values that do not parse (or a zero capacity) are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides_from(cfg, |key| std::env::var(key).ok());
}

pub(crate) fn apply_overrides_from(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("FORMWATCH_RELAY_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.relay_port = port;
    }
    if let Some(v) = lookup("FORMWATCH_BUS_CAPACITY")
        && let Ok(capacity) = v.parse::<usize>()
        && capacity > 0
    {
        cfg.bus_capacity = capacity;
    }
}

/// Save the config to `path`, creating its directory if necessary.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), FormError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| FormError::Config(format!("failed to create config directory: {e}")))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(|e| {
                FormError::Config(format!("failed to set config directory permissions: {e}"))
            })?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| FormError::Config(format!("failed to serialize config: {e}")))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| FormError::Config(format!("failed to write {}: {e}", path.display())))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| FormError::Config(format!("failed to write {}: {e}", path.display())))?;
    Ok(())
}
