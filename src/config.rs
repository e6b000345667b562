use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{MediaToolError, Result};

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "mediatool.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub hwaccel: HwAccelConfig,
    #[serde(default)]
    pub thumbnail: ThumbnailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Path to ffprobe binary
    pub probe_binary_path: String,
    /// Kill any external tool still running after this many seconds
    pub timeout_secs: Option<u64>,
}

impl MediaConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HwAccelConfig {
    /// Command used to list the device directory
    pub list_binary_path: String,
    /// Directory holding the DRM device nodes
    pub device_dir: String,
    /// Substring that identifies a render node in the listing
    pub render_node_pattern: String,
    /// Render node handed to `-init_hw_device vaapi=...`
    pub render_device: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Seek position used when the caller gives none (HH:MM:SS)
    pub default_timestamp: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            probe_binary_path: "ffprobe".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for HwAccelConfig {
    fn default() -> Self {
        Self {
            list_binary_path: "ls".to_string(),
            device_dir: "/dev/dri".to_string(),
            render_node_pattern: "renderD".to_string(),
            render_device: "/dev/dri/renderD128".to_string(),
        }
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            default_timestamp: "00:03:01".to_string(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings no external tool can run with
    pub fn validate(&self) -> Result<()> {
        let binaries = [
            ("media.binary_path", &self.media.binary_path),
            ("media.probe_binary_path", &self.media.probe_binary_path),
            ("hwaccel.list_binary_path", &self.hwaccel.list_binary_path),
        ];
        for (key, value) in binaries {
            if value.trim().is_empty() {
                return Err(MediaToolError::Config(format!("{} must not be empty", key)));
            }
        }

        if self.media.timeout_secs == Some(0) {
            return Err(MediaToolError::Config(
                "media.timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Load an explicit config file, else `mediatool.toml` from the current
    /// directory, else the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                    Self::from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_tooling() {
        let config = Config::default();
        assert_eq!(config.media.binary_path, "ffmpeg");
        assert_eq!(config.media.probe_binary_path, "ffprobe");
        assert_eq!(config.hwaccel.device_dir, "/dev/dri");
        assert_eq!(config.hwaccel.render_node_pattern, "renderD");
        assert_eq!(config.hwaccel.render_device, "/dev/dri/renderD128");
        assert_eq!(config.thumbnail.default_timestamp, "00:03:01");
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [media]
            binary_path = "/opt/ffmpeg/bin/ffmpeg"
            "#,
        )
        .unwrap();

        assert_eq!(config.media.binary_path, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.media.probe_binary_path, "ffprobe");
        assert_eq!(config.hwaccel, HwAccelConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mediatool.toml");

        let mut config = Config::default();
        config.thumbnail.default_timestamp = "00:00:10".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_file(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(MediaToolError::Io(_))));
    }

    #[test]
    fn test_malformed_file_is_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mediatool.toml");
        std::fs::write(&path, "[media\nbinary_path = ").unwrap();

        let result = Config::from_file(&path);
        assert!(matches!(result, Err(MediaToolError::Toml(_))));
    }

    #[test]
    fn test_timeout_setting() {
        let config: Config = toml::from_str("[media]\ntimeout_secs = 30\n").unwrap();
        assert_eq!(config.media.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(Config::default().media.timeout(), None);
    }

    #[test]
    fn test_invalid_settings_are_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mediatool.toml");

        std::fs::write(&path, "[media]\ntimeout_secs = 0\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(MediaToolError::Config(_))));

        std::fs::write(&path, "[media]\nbinary_path = \"\"\n").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("media.binary_path"));
    }
}
