//! Prelude module for convenient imports.
//!
//! ```ignore
//! use trajectory_extractor::prelude::*;
//!
//! let config = PipelineConfig::new(DatasetFormat::Biwi);
//! let output = Pipeline::from_config(config)?.process("obsmat.txt")?;
//! ```
//!
//! # What's Included
//!
//! ## Core Pipeline
//! - [`Pipeline`], [`PipelineConfig`], [`PipelineOutput`], [`DatasetFormat`]
//!
//! ## Scaling
//! - [`ScaleEstimator`] - Extent accumulation
//! - [`Scale`] - Finalized normalize/denormalize transform
//!
//! ## Windowing
//! - [`SupervisedWindower`], [`WindowConfig`], [`SupervisedTable`]
//!
//! ## Ingestion
//! - [`TrajectoryReader`], [`BiwiReader`], [`SeyfriedReader`]
//! - [`AgentTrajectory`], [`TrajectorySet`]

pub use crate::config::{DatasetConfig, DatasetFormat, PipelineConfig, ScaleConfig};
pub use crate::error::{Result, TrajectoryError};
pub use crate::ingest::{
    AgentTrajectory, BiwiReader, SeyfriedReader, TrajectoryReader, TrajectorySet, VelocityMode,
};
pub use crate::pipeline::{Pipeline, PipelineOutput};
pub use crate::preprocessing::{Scale, ScaleEstimator};
pub use crate::sequence_builder::{SupervisedTable, SupervisedWindower, WindowConfig};
pub use crate::validation::TrajectoryValidator;
