//! Error types for trajectory ingestion, scaling and windowing.
//!
//! Every fallible operation in the crate returns [`Result<T>`], an alias over
//! [`TrajectoryError`]. Nothing in the core retries or swallows an error:
//! failures go straight back to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Spatial axis of a 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SpatialAxis {
    /// Horizontal axis (column 0 of a coordinate lane)
    X,
    /// Vertical axis (column 1 of a coordinate lane)
    Y,
}

impl std::fmt::Display for SpatialAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpatialAxis::X => write!(f, "x"),
            SpatialAxis::Y => write!(f, "y"),
        }
    }
}

/// Errors produced by this crate.
#[derive(Debug, Error)]
pub enum TrajectoryError {
    /// `finalize` was called before any point was accumulated.
    #[error("cannot finalize scale: no points were accumulated (extent is still infinite)")]
    EmptyExtent,

    /// All observed points share the same coordinate on one axis.
    #[error("degenerate extent on {axis} axis: every point has {axis} = {value}, scale factor would be infinite")]
    DegenerateExtent {
        /// Axis with zero width
        axis: SpatialAxis,
        /// The single observed coordinate on that axis
        value: f64,
    },

    /// An infinite coordinate was accumulated.
    #[error("non-finite extent on {axis} axis: [{min}, {max}]")]
    NonFiniteExtent {
        /// Axis with an infinite bound
        axis: SpatialAxis,
        /// Lower bound on that axis
        min: f64,
        /// Upper bound on that axis
        max: f64,
    },

    /// Coordinate arrays must have rank 1, 2 or 3.
    #[error("unsupported coordinate array rank {ndim} (expected 1, 2 or 3)")]
    UnsupportedDimensionality {
        /// Rank of the rejected array
        ndim: usize,
    },

    /// Input array has an unusable shape.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A windower input row has a different width than the first row.
    #[error("row {row} has {actual} values, expected {expected}")]
    RowWidthMismatch {
        /// Index of the offending row
        row: usize,
        /// Width of row 0
        expected: usize,
        /// Width of the offending row
        actual: usize,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Trajectory data failed validation.
    #[error("validation failed for agent {agent}: {message}")]
    Validation {
        /// Agent identifier
        agent: String,
        /// First error-level finding
        message: String,
    },

    /// A dataset file could not be parsed.
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        /// File being read
        path: PathBuf,
        /// 1-based line number (0 when not line-specific)
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization failure.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrajectoryError {
    /// Build a [`TrajectoryError::Parse`] error.
    pub fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TrajectoryError>;
