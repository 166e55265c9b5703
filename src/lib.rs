//! Trajectory Extractor
//!
//! Pedestrian trajectory preparation for sequence prediction models.
//!
//! # Overview
//!
//! This library turns lab recordings of pedestrian motion into supervised
//! training samples:
//!
//! - **Ingestion**: BIWI and Seyfried recording dialects, `*` file patterns
//! - **Scaling**: one ratio-preserving transform into the unit square,
//!   computed from the full extent of every agent and file
//! - **Windowing**: (history, forecast) samples with independent
//!   differencing of each window
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Trajectory Extractor                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ingest/           - Dataset readers and file discovery         │
//! │  validation        - Shape, finiteness and frame-order checks   │
//! │  preprocessing/    - Scale estimation and down-sampling         │
//! │  sequence_builder/ - Supervised windowing                       │
//! │  pipeline          - End-to-end orchestration                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use trajectory_extractor::prelude::*;
//!
//! let config = PipelineConfig::new(DatasetFormat::Seyfried)
//!     .with_window(WindowConfig::new(8, 12));
//! let output = Pipeline::from_config(config)?.process("data/seyfried/*.sey")?;
//!
//! let samples = output.to_table()?;
//! let metres = output.scale.denormalize(&predictions, true)?;
//! ```

pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod prelude;
pub mod preprocessing;
pub mod sequence_builder;
pub mod validation;

// Re-exports - Errors
pub use error::{Result, SpatialAxis, TrajectoryError};

// Re-exports - Config
pub use config::{DatasetConfig, DatasetFormat, ExperimentMetadata, PipelineConfig, ScaleConfig};

// Re-exports - Ingestion
pub use ingest::{
    expand_pattern, AgentTrajectory, BiwiReader, SeyfriedReader, TrajectoryReader, TrajectorySet,
    VelocityMode,
};

// Re-exports - Preprocessing
pub use preprocessing::{BoundingExtent, DownSampler, Scale, ScaleEstimator, ScaleFactors};

// Re-exports - Sequence Building
pub use sequence_builder::{SupervisedTable, SupervisedWindower, WindowConfig};

// Re-exports - Validation
pub use validation::{
    validate_timestamps, TrajectoryValidator, ValidationCheck, ValidationConfig, ValidationLevel,
    ValidationResult,
};

// Re-exports - Pipeline
pub use pipeline::{Pipeline, PipelineOutput, PipelineStats};
