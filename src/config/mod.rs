use crate::domain::types::Unit;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_BLOCKED_KEYWORD: &str = "BLOCK";
const DEFAULT_BLOCKED_LOCATION: &str = "Paris";
const DEFAULT_CONFIG_PATH: &str = "config/weathervane.toml";
pub const CONFIG_PATH: &str = DEFAULT_CONFIG_PATH;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub blocked_keyword: String,
    pub blocked_locations: Vec<String>,
    /// Unit preference to seed fresh sessions with. `None` leaves the field
    /// unset and the lookup's Celsius default applies.
    pub initial_unit: Option<Unit>,
    /// Extra weather-table entries on top of the built-in ones.
    pub locations: Vec<LocationEntry>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LocationEntry {
    pub name: String,
    pub temperature_celsius: f64,
    pub condition: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown unit '{value}' in config; expected 'Celsius' or 'Fahrenheit'")]
    UnknownUnit { value: String },
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    blocked_keyword: Option<String>,
    blocked_locations: Option<Vec<String>>,
    initial_unit: Option<String>,
    #[serde(default)]
    locations: Vec<LocationEntry>,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return read_config(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        match read_config(default_path) {
            Ok(config) => Ok(config),
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!("Configuration file not found; using defaults");
                Ok(Self::default())
            }
            Err(other) => Err(other),
        }
    }

    pub fn default() -> Self {
        Self {
            blocked_keyword: DEFAULT_BLOCKED_KEYWORD.to_string(),
            blocked_locations: vec![DEFAULT_BLOCKED_LOCATION.to_string()],
            initial_unit: Some(Unit::Celsius),
            locations: Vec::new(),
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading configuration file");
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let initial_unit = match parsed.initial_unit {
        Some(value) => Some(
            Unit::from_str(&value).ok_or(ConfigError::UnknownUnit { value })?,
        ),
        None => Some(Unit::Celsius),
    };

    Ok(AppConfig {
        blocked_keyword: parsed
            .blocked_keyword
            .unwrap_or_else(|| DEFAULT_BLOCKED_KEYWORD.to_string()),
        blocked_locations: parsed
            .blocked_locations
            .unwrap_or_else(|| vec![DEFAULT_BLOCKED_LOCATION.to_string()]),
        initial_unit,
        locations: parsed.locations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    static WORKDIR_GUARD: Mutex<()> = Mutex::new(());

    #[test]
    fn returns_default_when_missing() {
        let _lock = WORKDIR_GUARD.lock().expect("lock guard");
        let original_dir = env::current_dir().expect("current dir");
        let temp = tempfile::tempdir().expect("tempdir");
        env::set_current_dir(temp.path()).expect("switch to temp dir");

        let config = AppConfig::load(None).expect("load succeeds");
        assert_eq!(config.blocked_keyword, DEFAULT_BLOCKED_KEYWORD);
        assert_eq!(config.blocked_locations, vec![DEFAULT_BLOCKED_LOCATION]);
        assert_eq!(config.initial_unit, Some(Unit::Celsius));
        assert!(config.locations.is_empty());

        env::set_current_dir(original_dir).expect("restore current dir");
    }

    #[test]
    fn reads_guardrail_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("weathervane.toml");
        fs::write(
            &path,
            r#"
blocked_keyword = "FORBID"
blocked_locations = ["Paris", "Gotham"]
initial_unit = "Fahrenheit"
"#,
        )
        .expect("write config");

        let config = AppConfig::load(Some(&path)).expect("load config");
        assert_eq!(config.blocked_keyword, "FORBID");
        assert_eq!(config.blocked_locations, vec!["Paris", "Gotham"]);
        assert_eq!(config.initial_unit, Some(Unit::Fahrenheit));
    }

    #[test]
    fn falls_back_to_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("weathervane.toml");
        fs::write(&path, "blocked_keyword = \"HALT\"").expect("write");

        let config = AppConfig::load(Some(&path)).expect("load");
        assert_eq!(config.blocked_keyword, "HALT");
        assert_eq!(config.blocked_locations, vec![DEFAULT_BLOCKED_LOCATION]);
        assert_eq!(config.initial_unit, Some(Unit::Celsius));
    }

    #[test]
    fn rejects_unknown_unit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("weathervane.toml");
        fs::write(&path, "initial_unit = \"Kelvin\"").expect("write");

        let err = AppConfig::load(Some(&path)).expect_err("load fails");
        assert!(matches!(err, ConfigError::UnknownUnit { value } if value == "Kelvin"));
    }

    #[test]
    fn reads_extra_location_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("weathervane.toml");
        fs::write(
            &path,
            r#"
[[locations]]
name = "Jakarta"
temperature_celsius = 31.0
condition = "humid"

[[locations]]
name = "Oslo"
temperature_celsius = 4.0
condition = "snowy"
"#,
        )
        .expect("write locations config");

        let config = AppConfig::load(Some(&path)).expect("load");
        assert_eq!(config.locations.len(), 2);
        assert_eq!(config.locations[0].name, "Jakarta");
        assert_eq!(config.locations[0].temperature_celsius, 31.0);
        assert_eq!(config.locations[1].condition, "snowy");
    }
}
