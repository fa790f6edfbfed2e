use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SETTINGS_ENV: &str = "FSD_SETTINGS";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("Failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Percent applied when an estimate does not carry its own rate.
    pub default_tax_rate: Decimal,
    pub currency_symbol: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_tax_rate: Decimal::ZERO,
            currency_symbol: "$".to_string(),
        }
    }
}

/// `$FSD_SETTINGS`, else `settings.toml` in the platform config dir, else
/// `./settings.toml`.
pub fn settings_path() -> PathBuf {
    if let Some(path) = std::env::var_os(SETTINGS_ENV) {
        return PathBuf::from(path);
    }
    if let Some(proj_dirs) = ProjectDirs::from("com", "fieldservice-desk", "fsd") {
        return proj_dirs.config_dir().join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

impl Settings {
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| SettingsError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let settings = Settings { default_tax_rate: dec!(8.875), currency_symbol: "€".into() };

        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "default_tax_rate = 6.5\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.default_tax_rate, dec!(6.5));
        assert_eq!(settings.currency_symbol, "$");
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "default_tax_rate = [").unwrap();

        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("settings.toml"));
    }
}
