//! Trajectory preprocessing applied before windowing.
//!
//! - **Scale**: Dataset-wide coordinate normalization into the unit square
//!   - Extent accumulated over every agent and file first
//!   - Optional aspect-ratio preservation
//!   - Exact inverse for mapping predictions back to metres
//!
//! - **Sampling**: Frame-rate reduction on a fixed timestamp grid
//!
//! # Example
//!
//! ```ignore
//! use trajectory_extractor::preprocessing::ScaleEstimator;
//!
//! let mut estimator = ScaleEstimator::new();
//! for agent in &set.agents {
//!     estimator.accumulate(&agent.positions)?;
//! }
//! let scale = estimator.finalize(true)?;
//!
//! let positions = scale.normalize(&agent.positions, true)?;
//! let velocities = scale.normalize(&agent.velocities, false)?;
//! ```

pub mod sampling;
pub mod scale;

pub use sampling::DownSampler;
pub use scale::{BoundingExtent, Scale, ScaleEstimator, ScaleFactors};
