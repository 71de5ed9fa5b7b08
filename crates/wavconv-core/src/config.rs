//! # Configuration System
//!
//! YAML configuration for wavconv runs:
//!
//! - Convolution settings (transform sizing policy, output normalization)
//! - Output encoding overrides (bit depth, sample format)
//! - Logging configuration
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `WAVCONV_CONFIG` environment variable
//! 2. `./wavconv.yaml` (current directory)
//! 3. `~/.config/wavconv/config.yaml` (user config)
//! 4. `/etc/wavconv/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! convolution:
//!   sizing: linear
//!   normalize: true
//!
//! output:
//!   bits_per_sample: 24
//!
//! logging:
//!   level: debug
//!   format: compact
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::convolve::SizingPolicy;
use crate::observe::LogConfig;
use crate::wav_source_sink::{SampleFormat, WavSpec};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "WAVCONV_CONFIG";

/// Error type for configuration operations.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found
    NotFound(String),
    /// Failed to read configuration file
    ReadError(String),
    /// Failed to parse configuration
    ParseError(String),
    /// Invalid configuration value
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(msg) => write!(f, "config not found: {}", msg),
            ConfigError::ReadError(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Convolution engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvolutionConfig {
    /// Transform size policy
    pub sizing: SizingPolicy,
    /// Scale the result by `1 / max(1, peak)` before writing
    pub normalize: bool,
}

impl Default for ConvolutionConfig {
    fn default() -> Self {
        Self {
            sizing: SizingPolicy::Linear,
            normalize: true,
        }
    }
}

/// Output file encoding. `None` keeps the input file's value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub bits_per_sample: Option<u16>,
    pub format: Option<SampleFormat>,
}

impl OutputConfig {
    /// Output format derived from the input file's format
    pub fn resolve(&self, input: &WavSpec) -> WavSpec {
        let mut spec = *input;
        if let Some(bits) = self.bits_per_sample {
            spec.bits_per_sample = bits;
            // A PCM depth other than 32 cannot stay float
            if bits != 32 && self.format.is_none() {
                spec.format = SampleFormat::Pcm;
            }
        }
        if let Some(format) = self.format {
            spec.format = format;
            // Float is only written as 32-bit
            if format == SampleFormat::Float && self.bits_per_sample.is_none() {
                spec.bits_per_sample = 32;
            }
        }
        spec
    }
}

/// Complete wavconv configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WavconvConfig {
    pub convolution: ConvolutionConfig,
    pub output: OutputConfig,
    pub logging: LogConfig,
}

impl WavconvConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(format!(
                    "{} points to {}",
                    CONFIG_ENV_VAR,
                    path.display()
                )));
            }
            return Self::load_from(&path);
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./wavconv.yaml")];

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "wavconv") {
            paths.push(config_dir.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/wavconv/config.yaml"));

        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(bits) = self.output.bits_per_sample {
            if !matches!(bits, 8 | 16 | 24 | 32) {
                return Err(ConfigError::ValidationError(format!(
                    "output.bits_per_sample must be 8, 16, 24 or 32 (got {})",
                    bits
                )));
            }
        }

        if self.output.format == Some(SampleFormat::Float)
            && matches!(self.output.bits_per_sample, Some(b) if b != 32)
        {
            return Err(ConfigError::ValidationError(
                "float output requires bits_per_sample: 32".to_string(),
            ));
        }

        if let Some(ref filter) = self.logging.filter {
            if filter.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "logging.filter must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{LogFormat, LogLevel};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = WavconvConfig::default();
        assert_eq!(config.convolution.sizing, SizingPolicy::Linear);
        assert!(config.convolution.normalize);
        assert!(config.output.bits_per_sample.is_none());
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
convolution:
  sizing: reference
  normalize: false

output:
  bits_per_sample: 24
  format: pcm

logging:
  level: debug
  format: json
"#;

        let config = WavconvConfig::parse(yaml).unwrap();
        assert_eq!(config.convolution.sizing, SizingPolicy::Reference);
        assert!(!config.convolution.normalize);
        assert_eq!(config.output.bits_per_sample, Some(24));
        assert_eq!(config.output.format, Some(SampleFormat::Pcm));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let config = WavconvConfig::parse("convolution:\n  sizing: reference\n").unwrap();
        assert_eq!(config.convolution.sizing, SizingPolicy::Reference);
        assert!(config.convolution.normalize);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_parse_error() {
        let err = WavconvConfig::parse("convolution:\n  sizing: circular\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = WavconvConfig::default();
        config.output.bits_per_sample = Some(12);
        assert!(config.validate().is_err());

        config.output.bits_per_sample = Some(16);
        config.output.format = Some(SampleFormat::Float);
        assert!(config.validate().is_err());

        config.output.bits_per_sample = Some(32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_resolve() {
        let input = WavSpec::mono16(44100);
        assert_eq!(OutputConfig::default().resolve(&input), input);

        let out = OutputConfig {
            bits_per_sample: Some(24),
            format: None,
        }
        .resolve(&input);
        assert_eq!(out.bits_per_sample, 24);
        assert_eq!(out.sample_rate, 44100);

        let float_in = WavSpec {
            bits_per_sample: 32,
            format: SampleFormat::Float,
            ..input
        };
        let out = OutputConfig {
            bits_per_sample: Some(16),
            format: None,
        }
        .resolve(&float_in);
        assert_eq!(out.format, SampleFormat::Pcm);
    }

    #[test]
    fn test_float_override_without_depth_writes_32_bits() {
        let config = WavconvConfig::parse("output:\n  format: float\n").unwrap();
        assert!(config.validate().is_ok());

        let out = config.output.resolve(&WavSpec::mono16(44100));
        assert_eq!(out.format, SampleFormat::Float);
        assert_eq!(out.bits_per_sample, 32);
        assert!(out.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wavconv.yaml");

        let mut config = WavconvConfig::default();
        config.convolution.sizing = SizingPolicy::Reference;
        config.output.bits_per_sample = Some(8);
        config.save(&path).unwrap();

        let loaded = WavconvConfig::load_from(&path).unwrap();
        assert_eq!(loaded.convolution.sizing, SizingPolicy::Reference);
        assert_eq!(loaded.output.bits_per_sample, Some(8));
    }

    #[test]
    fn test_load_missing_file() {
        let err = WavconvConfig::load_from(Path::new("/nonexistent/wavconv.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }

    #[test]
    fn test_example_yaml() {
        let yaml = WavconvConfig::example_yaml();
        assert!(yaml.contains("sizing: linear"));
        let parsed = WavconvConfig::parse(&yaml).unwrap();
        assert!(parsed.convolution.normalize);
    }

    #[test]
    fn test_config_search_paths() {
        let paths = WavconvConfig::config_search_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("./wavconv.yaml")));
        assert_eq!(paths.last(), Some(&PathBuf::from("/etc/wavconv/config.yaml")));
    }
}
