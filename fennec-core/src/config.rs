//! Configuration file loading
//!
//! Fennec reads `.fennec/config.toml` relative to the working directory.
//! A missing file is replaced with a commented default template; a
//! malformed file degrades to the empty configuration with a warning.
//! Unknown tables are preserved verbatim so plugins can keep their own
//! sections.

use crate::notify::NotifierOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration directory name, relative to the working directory.
pub const CONFIG_DIR: &str = ".fennec";

/// Configuration file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Template written when no configuration file exists.
pub const DEFAULT_CONFIG_TEMPLATE: &str = "\
# Fennec configuration
# See the documentation for available options.

[plugins]
# Module identifiers of plugins to load at startup.
paths = []

[notifications]
enabled = false
sound = \"default\"
threshold_seconds = 60
debounce_seconds = 5.0
";

/// Parsed configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub plugins: PluginsSection,
    #[serde(default)]
    pub notifications: NotificationsSection,
    /// Plugin-specific tables keyed by plugin name, passed through untouched.
    #[serde(flatten)]
    pub extra: toml::Table,
}

/// `[plugins]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginsSection {
    #[serde(default)]
    pub paths: Vec<String>,
}

/// `[notifications]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_sound")]
    pub sound: String,
    #[serde(default = "default_threshold_seconds")]
    pub threshold_seconds: u64,
    #[serde(default = "default_debounce_seconds")]
    pub debounce_seconds: f64,
}

impl Default for NotificationsSection {
    fn default() -> Self {
        Self {
            enabled: false,
            sound: default_sound(),
            threshold_seconds: default_threshold_seconds(),
            debounce_seconds: default_debounce_seconds(),
        }
    }
}

impl NotificationsSection {
    /// Resolve into runtime notifier options. The threshold is clamped to
    /// at least 60 seconds; `sound = "none"` disables the sound.
    pub fn to_options(&self) -> NotifierOptions {
        let sound = match self.sound.trim() {
            "" | "none" => None,
            other => Some(other.to_string()),
        };
        NotifierOptions {
            enabled: self.enabled,
            sound,
            threshold: Duration::from_secs(self.threshold_seconds.max(60)),
            debounce: Duration::from_secs_f64(self.debounce_seconds.max(0.0)),
        }
    }
}

fn default_sound() -> String {
    "default".to_string()
}

fn default_threshold_seconds() -> u64 {
    60
}

fn default_debounce_seconds() -> f64 {
    5.0
}

/// Path of the configuration file under `root`.
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Load the configuration from `root`.
///
/// Missing file: the default template is written (creation failure is only
/// a warning) and the parsed defaults returned. Malformed file: a warning
/// is logged and the empty configuration returned.
pub fn load_config(root: &Path) -> FileConfig {
    let path = config_path(root);

    if !path.exists() {
        if let Some(parent) = path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                tracing::warn!("could not create config directory: {err}");
            }
        }
        if let Err(err) = fs::write(&path, DEFAULT_CONFIG_TEMPLATE) {
            tracing::warn!("could not create config at {}: {err}", path.display());
        }
        return parse_or_default(DEFAULT_CONFIG_TEMPLATE, &path);
    }

    match fs::read_to_string(&path) {
        Ok(content) => parse_or_default(&content, &path),
        Err(err) => {
            tracing::warn!("could not read config at {}: {err}", path.display());
            FileConfig::default()
        }
    }
}

fn parse_or_default(content: &str, path: &Path) -> FileConfig {
    match toml::from_str(content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("malformed TOML in {}: {err}", path.display());
            FileConfig::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_creates_template() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path());

        assert!(config_path(tmp.path()).exists());
        assert!(config.plugins.paths.is_empty());
        assert!(!config.notifications.enabled);

        let written = fs::read_to_string(config_path(tmp.path())).unwrap();
        assert!(written.starts_with("# Fennec configuration"));
    }

    #[test]
    fn test_malformed_file_degrades_to_empty() {
        let tmp = TempDir::new().unwrap();
        let path = config_path(tmp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "this is [not toml").unwrap();

        let config = load_config(tmp.path());
        assert!(config.plugins.paths.is_empty());
        assert!(config.extra.is_empty());
    }

    #[test]
    fn test_parses_sections_and_passthrough() {
        let tmp = TempDir::new().unwrap();
        let path = config_path(tmp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"
[plugins]
paths = ["demo.weather", "demo.search"]

[notifications]
enabled = true
threshold_seconds = 120

[weather]
units = "metric"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path());
        assert_eq!(config.plugins.paths, vec!["demo.weather", "demo.search"]);
        assert!(config.notifications.enabled);
        assert_eq!(config.notifications.threshold_seconds, 120);

        let weather = config.extra.get("weather").unwrap();
        assert_eq!(
            weather.get("units").and_then(|v| v.as_str()),
            Some("metric")
        );
    }

    #[test]
    fn test_threshold_clamped_to_minimum() {
        let section = NotificationsSection {
            enabled: true,
            sound: "none".to_string(),
            threshold_seconds: 5,
            debounce_seconds: 2.5,
        };

        let options = section.to_options();
        assert_eq!(options.threshold, Duration::from_secs(60));
        assert_eq!(options.sound, None);
        assert_eq!(options.debounce, Duration::from_secs_f64(2.5));
    }

    #[test]
    fn test_defaults() {
        let section = NotificationsSection::default();
        assert!(!section.enabled);
        assert_eq!(section.sound, "default");
        assert_eq!(section.threshold_seconds, 60);
        assert_eq!(section.debounce_seconds, 5.0);
    }
}
