use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub system: SystemConfig,
    pub camera: CameraConfig,
    pub detection: DetectionConfig,
    pub display: DisplayConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    pub log_level: String,
}

/// How frames are pulled from the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Hold one MJPEG connection open.
    Stream,
    /// Fetch a fresh still image every iteration.
    Polling,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraConfig {
    pub host: String,
    pub mode: SourceMode,
    pub stream_port: u16,
    pub http_port: u16,
    pub stream_path: String,
    pub capture_path: String,
    pub poll_path: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub rect_size: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub window_title: String,
    pub frame_delay_ms: u64,
    pub retry_delay_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            host: "192.168.175.96".to_string(),
            mode: SourceMode::Stream,
            stream_port: 81,
            http_port: 80,
            stream_path: "/stream".to_string(),
            capture_path: "/capture".to_string(),
            poll_path: "/cam-stream".to_string(),
            connect_timeout_ms: 5_000,
            read_timeout_ms: 10_000,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { rect_size: 50 }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_title: "Color Recognition".to_string(),
            frame_delay_ms: 100,
            retry_delay_ms: 1_000,
        }
    }
}

impl CameraConfig {
    fn url(&self, port: u16, path: &str) -> String {
        if port == 80 {
            format!("http://{}{}", self.host, path)
        } else {
            format!("http://{}:{}{}", self.host, port, path)
        }
    }

    pub fn stream_url(&self) -> String {
        self.url(self.stream_port, &self.stream_path)
    }

    pub fn capture_url(&self) -> String {
        self.url(self.http_port, &self.capture_path)
    }

    pub fn poll_url(&self) -> String {
        self.url(self.http_port, &self.poll_path)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl DisplayConfig {
    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Config {
    // Load config from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    // Load default config
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::from_file(DEFAULT_CONFIG_PATH)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.host.trim().is_empty() {
            return Err(ConfigError::Invalid("camera.host is empty"));
        }
        if self.detection.rect_size == 0 {
            return Err(ConfigError::Invalid("detection.rect_size must be at least 1"));
        }
        Ok(())
    }
}
