//! Trajectory Validation Module
//!
//! Checks raw trajectories before they reach the scale estimator and the
//! windower, so that bad rows are reported instead of silently turning into
//! NaN samples or a corrupted extent.
//!
//! # Validation Categories
//!
//! 1. **Shape Consistency**: positions, velocities and timestamps row-aligned
//! 2. **Value Ranges**: NaN/Inf detection in positions and velocities
//! 3. **Timestamp Ordering**: strictly increasing frames, gap detection
//!
//! # Usage
//!
//! ```ignore
//! use trajectory_extractor::validation::TrajectoryValidator;
//!
//! let validator = TrajectoryValidator::default();
//! let result = validator.validate(&agent);
//!
//! if result.has_errors() {
//!     for error in result.errors() {
//!         eprintln!("{error}");
//!     }
//! }
//! ```

use crate::ingest::AgentTrajectory;
use std::fmt;

/// Individual check run by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCheck {
    /// Timestamps, positions and velocities have matching row counts
    Shape,
    /// Every position is finite
    PositionsFinite,
    /// Every velocity is finite
    VelocitiesFinite,
    /// The agent has at least one timestamp
    TimestampsPresent,
    /// Every timestamp is finite
    TimestampsFinite,
    /// Timestamps never go backwards
    TimestampOrdering,
    /// No frame gap wider than the configured maximum
    TimestampGaps,
}

impl fmt::Display for ValidationCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationCheck::Shape => "shape",
            ValidationCheck::PositionsFinite => "positions_finite",
            ValidationCheck::VelocitiesFinite => "velocities_finite",
            ValidationCheck::TimestampsPresent => "timestamps",
            ValidationCheck::TimestampsFinite => "timestamps_finite",
            ValidationCheck::TimestampOrdering => "timestamp_ordering",
            ValidationCheck::TimestampGaps => "timestamp_gaps",
        };
        f.write_str(name)
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    /// Check passed
    Valid,
    /// Usable data with a suspicious property
    Warning(String),
    /// Data the pipeline must not consume
    Error(String),
}

impl ValidationLevel {
    fn message(&self) -> Option<&str> {
        match self {
            ValidationLevel::Valid => None,
            ValidationLevel::Warning(msg) | ValidationLevel::Error(msg) => Some(msg),
        }
    }
}

/// Findings of every check run on one agent.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    findings: Vec<(ValidationCheck, ValidationLevel)>,
}

impl ValidationResult {
    /// Create a new empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a check.
    pub fn add(&mut self, check: ValidationCheck, level: ValidationLevel) {
        self.findings.push((check, level));
    }

    /// Append every finding of another result.
    pub fn extend(&mut self, other: ValidationResult) {
        self.findings.extend(other.findings);
    }

    /// True if any check failed with an error.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// True if any check raised a warning.
    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Warnings as `check: message`.
    pub fn warnings(&self) -> impl Iterator<Item = String> + '_ {
        self.messages(|level| matches!(level, ValidationLevel::Warning(_)))
    }

    /// Errors as `check: message`.
    pub fn errors(&self) -> impl Iterator<Item = String> + '_ {
        self.messages(|level| matches!(level, ValidationLevel::Error(_)))
    }

    /// Outcome of `check`, if it was run.
    pub fn level(&self, check: ValidationCheck) -> Option<&ValidationLevel> {
        self.findings
            .iter()
            .find(|(c, _)| *c == check)
            .map(|(_, level)| level)
    }

    fn messages(
        &self,
        keep: fn(&ValidationLevel) -> bool,
    ) -> impl Iterator<Item = String> + '_ {
        self.findings
            .iter()
            .filter(move |(_, level)| keep(level))
            .filter_map(|(check, level)| level.message().map(|msg| format!("{check}: {msg}")))
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self
            .findings
            .iter()
            .filter(|(_, level)| *level != ValidationLevel::Valid)
            .count();
        writeln!(f, "{failed} of {} checks flagged", self.findings.len())?;

        for (check, level) in &self.findings {
            match level {
                ValidationLevel::Valid => {}
                ValidationLevel::Warning(msg) => writeln!(f, "  warning {check}: {msg}")?,
                ValidationLevel::Error(msg) => writeln!(f, "  error {check}: {msg}")?,
            }
        }
        Ok(())
    }
}

/// Configuration for trajectory validation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValidationConfig {
    /// Check for NaN/Inf positions and velocities
    pub check_non_finite: bool,

    /// Warn when consecutive frames are further apart than this (in frames)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_timestamp_gap: Option<f64>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_non_finite: true,
            max_timestamp_gap: None,
        }
    }
}

/// Validator for per-agent trajectories.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryValidator {
    config: ValidationConfig,
}

impl TrajectoryValidator {
    /// Create a validator with custom configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Run every check on one agent.
    pub fn validate(&self, agent: &AgentTrajectory) -> ValidationResult {
        let mut result = ValidationResult::new();

        let n = agent.timestamps.len();
        let shapes_ok = agent.positions.nrows() == n
            && agent.velocities.nrows() == n
            && agent.positions.ncols() == 2
            && agent.velocities.ncols() == 2;
        if shapes_ok {
            result.add(ValidationCheck::Shape, ValidationLevel::Valid);
        } else {
            result.add(
                ValidationCheck::Shape,
                ValidationLevel::Error(format!(
                    "{} timestamps, positions {:?}, velocities {:?}",
                    n,
                    agent.positions.shape(),
                    agent.velocities.shape()
                )),
            );
        }

        if self.config.check_non_finite {
            result.add(ValidationCheck::PositionsFinite, check_finite(agent.positions.iter()));
            result.add(ValidationCheck::VelocitiesFinite, check_finite(agent.velocities.iter()));
        }

        result.extend(validate_timestamps(&agent.timestamps));

        if let Some(max_gap) = self.config.max_timestamp_gap {
            let widest = agent
                .timestamps
                .windows(2)
                .map(|w| w[1] - w[0])
                .fold(0.0_f64, f64::max);
            if widest > max_gap {
                result.add(
                    ValidationCheck::TimestampGaps,
                    ValidationLevel::Warning(format!(
                        "Max frame gap {widest} exceeds {max_gap}"
                    )),
                );
            } else {
                result.add(ValidationCheck::TimestampGaps, ValidationLevel::Valid);
            }
        }

        result
    }
}

fn check_finite<'a>(values: impl Iterator<Item = &'a f64>) -> ValidationLevel {
    let bad = values.filter(|v| !v.is_finite()).count();
    if bad == 0 {
        ValidationLevel::Valid
    } else {
        ValidationLevel::Error(format!("{bad} non-finite values"))
    }
}

/// Validate frame timestamps of one agent.
///
/// Timestamps must be finite and strictly increasing. A repeated frame is a
/// warning, a frame going backwards is an error.
pub fn validate_timestamps(timestamps: &[f64]) -> ValidationResult {
    let mut result = ValidationResult::new();

    if timestamps.is_empty() {
        result.add(
            ValidationCheck::TimestampsPresent,
            ValidationLevel::Warning("No timestamps to validate".to_string()),
        );
        return result;
    }

    if let Some(i) = timestamps.iter().position(|t| !t.is_finite()) {
        result.add(
            ValidationCheck::TimestampsFinite,
            ValidationLevel::Error(format!("Non-finite timestamp at index {i}")),
        );
        return result;
    }

    let mut ordering = ValidationLevel::Valid;
    for i in 1..timestamps.len() {
        let (prev, cur) = (timestamps[i - 1], timestamps[i]);
        if cur < prev {
            ordering = ValidationLevel::Error(format!(
                "Non-monotonic timestamp at index {i}: {cur} < {prev}"
            ));
            break;
        }
        if cur == prev && ordering == ValidationLevel::Valid {
            ordering = ValidationLevel::Warning(format!("Repeated timestamp {cur} at index {i}"));
        }
    }
    result.add(ValidationCheck::TimestampOrdering, ordering);

    result
}
