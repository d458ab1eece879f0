//! Service configuration
//!
//! Settings resolve in precedence order: command-line argument, then
//! environment variable (both via clap), then the optional TOML config
//! file, then compiled defaults.

use std::path::Path;

use serde::Deserialize;
use veriwave_common::PlaybackTuning;

use crate::error::{Error, Result};

/// Default HTTP port for the player service
pub const DEFAULT_PORT: u16 = 5760;

/// Values loadable from the optional TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub tuning: PlaybackTuning,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: FileConfig = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.tuning.validate()?;
        Ok(config)
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub tuning: PlaybackTuning,
}

impl ServiceConfig {
    /// Merge the optional config file with CLI/env overrides.
    ///
    /// `cli_port` wins when given; `conservative` switches the score
    /// threshold to the stricter preset after file values are applied.
    pub fn resolve(
        config_path: Option<&Path>,
        cli_port: Option<u16>,
        conservative: bool,
    ) -> Result<Self> {
        let file = match config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let mut tuning = file.tuning;
        if conservative {
            tuning.score_threshold = PlaybackTuning::conservative().score_threshold;
        }
        tuning.validate()?;

        Ok(Self {
            port: cli_port.or(file.port).unwrap_or(DEFAULT_PORT),
            tuning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = ServiceConfig::resolve(None, None, false).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.tuning, PlaybackTuning::default());
    }

    #[test]
    fn test_cli_port_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 6000").unwrap();

        let config = ServiceConfig::resolve(Some(file.path()), Some(7000), false).unwrap();
        assert_eq!(config.port, 7000);

        let config = ServiceConfig::resolve(Some(file.path()), None, false).unwrap();
        assert_eq!(config.port, 6000);
    }

    #[test]
    fn test_file_tuning_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tuning]\nscore_threshold = 0.3\nboundary_tolerance_secs = 0.2").unwrap();

        let config = ServiceConfig::resolve(Some(file.path()), None, false).unwrap();
        assert_eq!(config.tuning.score_threshold, 0.3);
        assert_eq!(config.tuning.boundary_tolerance_secs, 0.2);
        // Unspecified fields keep their defaults
        assert_eq!(config.tuning.progress_interval_ms, 16);
    }

    #[test]
    fn test_conservative_flag_overrides_threshold() {
        let config = ServiceConfig::resolve(None, None, true).unwrap();
        assert_eq!(config.tuning.score_threshold, 0.4);
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tuning]\nscore_threshold = 2.0").unwrap();

        assert!(ServiceConfig::resolve(Some(file.path()), None, false).is_err());
    }
}
