//! Pipeline configuration management.
//!
//! This module provides unified configuration for ingestion, scaling and
//! windowing, with serialization support for experiment reproducibility.
//!
//! # Features
//!
//! - **Unified Configuration**: Single struct combining all pipeline stages
//! - **Serialization**: Save/load configurations to TOML or JSON
//! - **Validation**: Ensure configurations are valid before use
//!
//! # Example
//!
//! ```ignore
//! use trajectory_extractor::config::{DatasetFormat, PipelineConfig};
//! use trajectory_extractor::sequence_builder::WindowConfig;
//!
//! let config = PipelineConfig::new(DatasetFormat::Seyfried)
//!     .with_window(WindowConfig::new(8, 12))
//!     .with_velocity(true);
//!
//! config.save_toml("experiment_config.toml")?;
//! let loaded = PipelineConfig::load_toml("experiment_config.toml")?;
//! let pipeline = Pipeline::from_config(loaded)?;
//! ```

use crate::error::{Result, TrajectoryError};
use crate::ingest::{BiwiReader, SeyfriedReader, TrajectoryReader, VelocityMode};
use crate::sequence_builder::WindowConfig;
use crate::validation::ValidationConfig;
use std::fs;
use std::path::Path;

/// Unified pipeline configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PipelineConfig {
    /// Append velocity columns to each agent's series before windowing
    #[serde(default)]
    pub include_velocity: bool,

    /// Dataset dialect and reading options
    pub dataset: DatasetConfig,

    /// Coordinate normalization
    #[serde(default)]
    pub scale: ScaleConfig,

    /// Supervised windowing
    #[serde(default)]
    pub window: WindowConfig,

    /// Trajectory validation
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Experiment metadata (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExperimentMetadata>,
}

/// Supported recording dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DatasetFormat {
    /// BIWI observation matrices (8 columns, metres, 2.5 fps)
    Biwi,

    /// Seyfried experiments (header + 5 columns, centimetres)
    Seyfried,
}

impl DatasetFormat {
    /// Down-sampling step used when none is configured.
    pub fn default_down_sample(&self) -> usize {
        match self {
            DatasetFormat::Biwi => 1,
            DatasetFormat::Seyfried => 4,
        }
    }
}

/// Dataset reading configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DatasetConfig {
    /// Recording dialect
    pub format: DatasetFormat,

    /// Keep frames whose number is a multiple of this (dialect default if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_sample: Option<usize>,

    /// Velocity reconstruction (only used by dialects without recorded velocity)
    #[serde(default)]
    pub velocity_mode: VelocityMode,
}

impl DatasetConfig {
    /// Create a dataset configuration with dialect defaults.
    pub fn new(format: DatasetFormat) -> Self {
        Self {
            format,
            down_sample: None,
            velocity_mode: VelocityMode::default(),
        }
    }

    /// Effective down-sampling step.
    pub fn down_sample(&self) -> usize {
        self.down_sample
            .unwrap_or_else(|| self.format.default_down_sample())
    }

    /// Build the reader for this dialect.
    pub fn reader(&self) -> Box<dyn TrajectoryReader> {
        match self.format {
            DatasetFormat::Biwi => Box::new(BiwiReader::new(self.down_sample())),
            DatasetFormat::Seyfried => Box::new(
                SeyfriedReader::new(self.down_sample()).with_velocity_mode(self.velocity_mode),
            ),
        }
    }

    /// Validate dataset configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.down_sample == Some(0) {
            return Err("down_sample must be > 0".to_string());
        }
        Ok(())
    }
}

/// Coordinate normalization configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScaleConfig {
    /// Use the same factor on both axes
    pub keep_ratio: bool,

    /// Scale velocities with the position factors (no translation)
    pub normalize_velocity: bool,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            keep_ratio: true,
            normalize_velocity: true,
        }
    }
}

/// Experiment metadata for tracking and reproducibility.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExperimentMetadata {
    /// Experiment name
    pub name: String,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Version or git commit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Custom tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl PipelineConfig {
    /// Create a configuration for a dialect with default scaling and windowing.
    pub fn new(format: DatasetFormat) -> Self {
        Self {
            include_velocity: false,
            dataset: DatasetConfig::new(format),
            scale: ScaleConfig::default(),
            window: WindowConfig::default(),
            validation: ValidationConfig::default(),
            metadata: None,
        }
    }

    /// Set experiment metadata.
    pub fn with_metadata(mut self, metadata: ExperimentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Set dataset configuration.
    pub fn with_dataset(mut self, config: DatasetConfig) -> Self {
        self.dataset = config;
        self
    }

    /// Set scale configuration.
    pub fn with_scale(mut self, config: ScaleConfig) -> Self {
        self.scale = config;
        self
    }

    /// Set window configuration.
    pub fn with_window(mut self, config: WindowConfig) -> Self {
        self.window = config;
        self
    }

    /// Set validation configuration.
    pub fn with_validation(mut self, config: ValidationConfig) -> Self {
        self.validation = config;
        self
    }

    /// Include velocity columns in the windowed series.
    pub fn with_velocity(mut self, include: bool) -> Self {
        self.include_velocity = include;
        self
    }

    /// Number of variables per timestep in the windowed series.
    pub fn n_vars(&self) -> usize {
        if self.include_velocity {
            4
        } else {
            2
        }
    }

    /// Validate the configuration.
    ///
    /// Returns Ok(()) if valid, Err(msg) otherwise.
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.dataset.validate()?;
        self.window.validate()?;

        if let Some(gap) = self.validation.max_timestamp_gap {
            if gap.is_nan() || gap <= 0.0 {
                return Err(format!("max_timestamp_gap must be > 0, got {gap}"));
            }
        }

        Ok(())
    }

    /// Save configuration to TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Load configuration from TOML file.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let config = PipelineConfig::load_toml("configs/seyfried.toml")?;
    /// ```
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&contents)?;
        config.validate().map_err(TrajectoryError::Config)?;
        Ok(config)
    }

    /// Save configuration to JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        fs::write(path, json_string)?;
        Ok(())
    }

    /// Load configuration from JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&contents)?;
        config.validate().map_err(TrajectoryError::Config)?;
        Ok(config)
    }
}
