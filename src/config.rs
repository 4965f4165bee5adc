//! Configuration schema for visionboard.
//!
//! A config file tunes sampling, prompt size, the model transport and the
//! rendered outputs. Every field is optional; a missing file means defaults.

use directories::ProjectDirs;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::payload::ShrinkLimits;

/// Config file names searched for in the working directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["visionboard.yaml", ".visionboard.yaml"];

/// Errors raised while loading or validating a config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub payload: ShrinkLimits,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config from an explicit path, or discover one, or fall back
    /// to defaults. Returns the path that was used, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::parse_file(path)?, Some(path.to_path_buf())));
        }
        match discover() {
            Some(path) => Ok((Self::parse_file(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }
}

/// Sampling settings for the folder walk and snippet extraction.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Cap on the number of sampled files
    pub max_files: usize,
    /// Characters kept per extracted snippet
    pub per_file_chars: usize,
    /// Bytes read from each text file
    pub max_read_bytes: usize,
    /// Glob patterns for paths to skip (e.g., "**/private/**")
    pub excluded_paths: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_files: 80,
            per_file_chars: 200,
            max_read_bytes: 32_000,
            excluded_paths: Vec::new(),
        }
    }
}

impl ScanConfig {
    /// Compile `excluded_paths` into one matcher, built once per walk.
    pub fn exclusions(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            let glob = Glob::new(pattern).map_err(|e| {
                ConfigError::Invalid(format!("invalid excluded_paths pattern {:?}: {}", pattern, e))
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|e| ConfigError::Invalid(format!("excluded_paths: {}", e)))
    }
}

/// How the model is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Gemini generateContent over HTTPS
    #[default]
    Api,
    /// Gemini CLI subprocess, prompt on stdin
    Cli,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Api => write!(f, "api"),
            Transport::Cli => write!(f, "cli"),
        }
    }
}

impl std::str::FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api" => Ok(Transport::Api),
            "cli" => Ok(Transport::Cli),
            _ => Err(format!("unknown transport: {}", s)),
        }
    }
}

/// Model settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    pub transport: Transport,
    /// Model identifier, e.g. "gemini-1.5-flash"
    pub name: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
    /// Extra directories handed to the CLI transport
    pub include_directories: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Api,
            name: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: 2048,
            timeout_secs: 30,
            include_directories: Vec::new(),
        }
    }
}

/// Rendered artifacts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// HTML report path
    pub html: PathBuf,
    /// Print the ASCII board to the terminal
    pub ascii: bool,
    /// Collage PNG path; no collage when unset
    pub collage: Option<PathBuf>,
    /// Scene images requested for the collage (at most 4 are laid out)
    pub max_scenes: usize,
    /// Image model used for collage scenes
    pub image_model: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            html: PathBuf::from("vision-board.html"),
            ascii: true,
            collage: None,
            max_scenes: 4,
            image_model: "dall-e-3".to_string(),
        }
    }
}

/// Look for a config file in the working directory, then in the user
/// config directory.
pub fn discover() -> Option<PathBuf> {
    for name in DEFAULT_CONFIG_NAMES {
        let path = PathBuf::from(name);
        if path.exists() {
            return Some(path);
        }
    }
    ProjectDirs::from("", "", "visionboard")
        .map(|dirs| dirs.config_dir().join("config.yaml"))
        .filter(|path| path.exists())
}

/// Validate a config for correctness.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.scan.max_files == 0 {
        return Err(ConfigError::Invalid("scan.max_files must be positive".into()));
    }

    let limits = &config.payload;
    if limits.max_chars == 0 {
        return Err(ConfigError::Invalid("payload.max_chars must be positive".into()));
    }
    if limits.min_per_file > limits.start_per_file {
        return Err(ConfigError::Invalid(format!(
            "payload.min_per_file ({}) exceeds payload.start_per_file ({})",
            limits.min_per_file, limits.start_per_file
        )));
    }

    if config.model.name.trim().is_empty() {
        return Err(ConfigError::Invalid("model.name must not be empty".into()));
    }

    config.scan.exclusions()?;

    Ok(())
}
