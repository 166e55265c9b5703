//! Supervised sample generation from trajectory series.
//!
//! A trajectory series is a `[T × n_vars]` table, one row per timestep. The
//! windower slides an anchor over it and, for every anchor, emits one flat
//! sample made of a history window followed by a forecast window:
//!
//! ```text
//!                      anchor (t)
//!                          │
//!   ... ┌────┬────┬────┐   ▼  ┌────┬────┐ ...
//!       │t-2 │t-1 │ t  │      │t+1 │t+2 │
//!       └────┴────┴────┘      └────┴────┘
//!          history (n_in=3)    forecast (n_out=2)
//! ```
//!
//! # Column Layout
//!
//! `n_in` history steps (oldest first) each contributing `n_vars` columns,
//! then `n_out` forecast steps (nearest first) each contributing `n_vars`
//! columns. Total: `(n_in + n_out) × n_vars`.
//!
//! # Differencing
//!
//! History and forecast are differenced independently, and against different
//! references:
//!
//! | Window | Absolute | Differenced |
//! |--------|----------|-------------|
//! | history step with lag `l` | `x[t-l]` | `x[t-l] - x[t-l-1]` (step delta) |
//! | forecast step `k` | `x[t+k]` | `x[t+k] - x[t]` (displacement from anchor) |
//!
//! # Boundaries
//!
//! Near the ends of the series some cells have no source row. The set of
//! anchors whose every cell is defined is computed up front
//! ([`WindowConfig::complete_anchors`]). With `drop_incomplete` only those
//! anchors are emitted, and rows holding NaN input values are dropped as well.
//! Without it every anchor is emitted and undefined cells are `f64::NAN`.

use crate::error::{Result, TrajectoryError};
use ndarray::{concatenate, s, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix2};
use rayon::prelude::*;
use std::ops::Range;

/// Configuration for supervised windowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WindowConfig {
    /// History window length (observed steps, anchor included)
    pub n_in: usize,

    /// Forecast window length (steps after the anchor)
    pub n_out: usize,

    /// Emit history as step-to-step deltas instead of absolute values
    pub diff_in: bool,

    /// Emit forecast as displacement from the anchor instead of absolute values
    pub diff_out: bool,

    /// Drop rows that contain any undefined value
    pub drop_incomplete: bool,
}

impl WindowConfig {
    /// Create a configuration with the default differencing policy
    /// (absolute history, displacement forecast, incomplete rows dropped).
    ///
    /// # Example
    ///
    /// ```
    /// use trajectory_extractor::sequence_builder::WindowConfig;
    ///
    /// let config = WindowConfig::new(8, 12);
    /// assert_eq!(config.n_columns(2), 40);
    /// assert!(config.diff_out);
    /// ```
    pub fn new(n_in: usize, n_out: usize) -> Self {
        Self {
            n_in,
            n_out,
            diff_in: false,
            diff_out: true,
            drop_incomplete: true,
        }
    }

    /// Set history differencing.
    pub fn with_diff_in(mut self, diff_in: bool) -> Self {
        self.diff_in = diff_in;
        self
    }

    /// Set forecast differencing.
    pub fn with_diff_out(mut self, diff_out: bool) -> Self {
        self.diff_out = diff_out;
        self
    }

    /// Set the incomplete-row policy.
    pub fn with_drop_incomplete(mut self, drop_incomplete: bool) -> Self {
        self.drop_incomplete = drop_incomplete;
        self
    }

    /// Number of output columns for `n_vars` variables per timestep.
    #[inline]
    pub fn n_columns(&self, n_vars: usize) -> usize {
        (self.n_in + self.n_out) * n_vars
    }

    /// Human-readable column names.
    ///
    /// History columns are `var_in{j}(t-{lag})`, forecast columns are
    /// `var_out{j}(t+{k})`, with `j` 1-indexed.
    ///
    /// ```
    /// use trajectory_extractor::sequence_builder::WindowConfig;
    ///
    /// let names = WindowConfig::new(2, 1).column_names(1);
    /// assert_eq!(names, vec!["var_in1(t-1)", "var_in1(t-0)", "var_out1(t+1)"]);
    /// ```
    pub fn column_names(&self, n_vars: usize) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_columns(n_vars));
        for step in (1..=self.n_in).rev() {
            let lag = step - 1;
            names.extend((1..=n_vars).map(|j| format!("var_in{j}(t-{lag})")));
        }
        for k in 1..=self.n_out {
            names.extend((1..=n_vars).map(|j| format!("var_out{j}(t+{k})")));
        }
        names
    }

    /// Anchors of a length-`len` series whose cells all have a source row.
    ///
    /// The first anchor needs `n_in - 1` rows of history, plus one more when
    /// history is differenced. The last anchor needs `n_out` rows ahead.
    ///
    /// ```
    /// use trajectory_extractor::sequence_builder::WindowConfig;
    ///
    /// assert_eq!(WindowConfig::new(2, 1).complete_anchors(5), 1..4);
    /// assert_eq!(WindowConfig::new(2, 1).with_diff_in(true).complete_anchors(5), 2..4);
    /// assert!(WindowConfig::new(4, 4).complete_anchors(5).is_empty());
    /// ```
    pub fn complete_anchors(&self, len: usize) -> Range<usize> {
        let first = match (self.n_in, self.diff_in) {
            (0, _) => 0,
            (n, false) => n - 1,
            (n, true) => n,
        };
        let end = len.saturating_sub(self.n_out);
        first..end.max(first)
    }

    /// Validate configuration.
    ///
    /// Returns Ok(()) if valid, Err(msg) otherwise.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.n_in + self.n_out == 0 {
            return Err("n_in + n_out must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Supervised samples produced from one or more series.
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisedTable {
    /// Samples, one row per emitted anchor
    values: Array2<f64>,

    /// Column names (see [`WindowConfig::column_names`])
    columns: Vec<String>,

    /// Anchor index (row of the source series) of each sample
    anchors: Vec<usize>,

    /// Number of history columns at the start of each row
    history_width: usize,
}

impl SupervisedTable {
    /// Empty table with the column layout of `config` for `n_vars` variables.
    pub fn empty(config: &WindowConfig, n_vars: usize) -> Self {
        Self {
            values: Array2::zeros((0, config.n_columns(n_vars))),
            columns: config.column_names(n_vars),
            anchors: Vec::new(),
            history_width: config.n_in * n_vars,
        }
    }

    /// Sample values `[n_rows × n_cols]`.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Consume the table and return the raw values.
    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Anchor index of every row.
    pub fn anchors(&self) -> &[usize] {
        &self.anchors
    }

    /// Number of samples.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of columns.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    /// True when no sample was produced.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    /// Full sample `i`.
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    /// History part of sample `i`.
    pub fn history(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.slice(s![i, ..self.history_width])
    }

    /// Forecast part of sample `i`.
    pub fn forecast(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.slice(s![i, self.history_width..])
    }

    /// True if any cell is NaN (only possible without `drop_incomplete`).
    pub fn has_undefined(&self) -> bool {
        self.values.iter().any(|v| v.is_nan())
    }

    /// Stack the rows of several tables with identical column layout.
    ///
    /// Anchors keep their per-series meaning.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::ShapeMismatch`] if `tables` is empty or the column
    /// layouts differ.
    pub fn concat(tables: &[SupervisedTable]) -> Result<SupervisedTable> {
        let first = tables.first().ok_or_else(|| {
            TrajectoryError::ShapeMismatch("cannot concatenate zero tables".to_string())
        })?;

        if let Some(other) = tables.iter().find(|t| t.columns != first.columns) {
            return Err(TrajectoryError::ShapeMismatch(format!(
                "column layout differs: {} vs {} columns",
                first.n_cols(),
                other.n_cols()
            )));
        }

        let views: Vec<ArrayView2<'_, f64>> = tables.iter().map(|t| t.values.view()).collect();
        let values = concatenate(Axis(0), &views)
            .map_err(|e| TrajectoryError::ShapeMismatch(e.to_string()))?;

        Ok(SupervisedTable {
            values,
            columns: first.columns.clone(),
            anchors: tables.iter().flat_map(|t| t.anchors.iter().copied()).collect(),
            history_width: first.history_width,
        })
    }
}

/// Sliding-window transformer from series to supervised samples.
///
/// Stateless apart from its configuration; one instance can be shared
/// across threads.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use trajectory_extractor::sequence_builder::{SupervisedWindower, WindowConfig};
///
/// let windower = SupervisedWindower::new(WindowConfig::new(2, 1));
/// let table = windower.transform(&array![[1.0], [2.0], [3.0], [4.0], [5.0]]).unwrap();
///
/// assert_eq!(table.n_rows(), 3);
/// assert_eq!(table.row(0).to_vec(), vec![1.0, 2.0, 1.0]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SupervisedWindower {
    config: WindowConfig,
}

impl SupervisedWindower {
    /// Create a windower.
    pub fn new(config: WindowConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Window a `[T × n_vars]` series.
    ///
    /// A series shorter than the window yields an empty table when
    /// `drop_incomplete` is set.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::ShapeMismatch`] if the series has zero columns.
    pub fn transform<S>(&self, series: &ArrayBase<S, Ix2>) -> Result<SupervisedTable>
    where
        S: Data<Elem = f64>,
    {
        let n_vars = series.ncols();
        if n_vars == 0 {
            return Err(TrajectoryError::ShapeMismatch(
                "series must have at least one variable per timestep".to_string(),
            ));
        }

        let len = series.nrows();
        let n_cols = self.config.n_columns(n_vars);

        let anchors: Range<usize> = if self.config.drop_incomplete {
            self.config.complete_anchors(len)
        } else {
            0..len
        };

        let mut data = Vec::with_capacity(anchors.len() * n_cols);
        let mut kept = Vec::with_capacity(anchors.len());
        let mut row = vec![0.0; n_cols];

        for anchor in anchors {
            self.fill_row(series, anchor, &mut row);

            if self.config.drop_incomplete && row.iter().any(|v| v.is_nan()) {
                // Complete anchor, but the input itself holds NaN
                continue;
            }
            data.extend_from_slice(&row);
            kept.push(anchor);
        }

        let values = Array2::from_shape_vec((kept.len(), n_cols), data)
            .map_err(|e| TrajectoryError::ShapeMismatch(e.to_string()))?;

        Ok(SupervisedTable {
            values,
            columns: self.config.column_names(n_vars),
            anchors: kept,
            history_width: self.config.n_in * n_vars,
        })
    }

    /// Window a series given as rows of equal width.
    ///
    /// An empty row list yields an empty single-variable table.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::RowWidthMismatch`] for ragged input, plus the errors
    /// of [`SupervisedWindower::transform`].
    pub fn transform_rows(&self, rows: &[Vec<f64>]) -> Result<SupervisedTable> {
        let width = rows.first().map_or(0, Vec::len);
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(TrajectoryError::RowWidthMismatch {
                row,
                expected: width,
                actual: r.len(),
            });
        }
        if rows.is_empty() {
            // No row to infer a width from; treat as univariate
            return Ok(SupervisedTable::empty(&self.config, 1));
        }

        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let series = Array2::from_shape_vec((rows.len(), width), flat)
            .map_err(|e| TrajectoryError::ShapeMismatch(e.to_string()))?;
        self.transform(&series)
    }

    /// Window many independent series in parallel.
    ///
    /// Output order matches input order.
    pub fn transform_batch<S>(&self, series: &[ArrayBase<S, Ix2>]) -> Result<Vec<SupervisedTable>>
    where
        S: Data<Elem = f64> + Sync,
    {
        series.par_iter().map(|s| self.transform(s)).collect()
    }

    /// Write the sample for `anchor` into `row`; undefined cells become NaN.
    fn fill_row<S>(&self, series: &ArrayBase<S, Ix2>, anchor: usize, row: &mut [f64])
    where
        S: Data<Elem = f64>,
    {
        let n_vars = series.ncols();
        let mut chunks = row.chunks_exact_mut(n_vars);

        // History, oldest first
        for step in (1..=self.config.n_in).rev() {
            let lag = step as isize - 1;
            let Some(cells) = chunks.next() else { return };

            let current = source_row(series, anchor, -lag);
            if self.config.diff_in {
                let previous = source_row(series, anchor, -lag - 1);
                write_difference(cells, current, previous);
            } else {
                write_absolute(cells, current);
            }
        }

        // Forecast, nearest first
        for k in 1..=self.config.n_out {
            let Some(cells) = chunks.next() else { return };

            let future = source_row(series, anchor, k as isize);
            if self.config.diff_out {
                let now = source_row(series, anchor, 0);
                write_difference(cells, future, now);
            } else {
                write_absolute(cells, future);
            }
        }
    }
}

/// Row `anchor + offset`, or None outside the series.
#[inline]
fn source_row<S>(series: &ArrayBase<S, Ix2>, anchor: usize, offset: isize) -> Option<ArrayView1<'_, f64>>
where
    S: Data<Elem = f64>,
{
    let index = anchor.checked_add_signed(offset)?;
    (index < series.nrows()).then(|| series.row(index))
}

#[inline]
fn write_absolute(cells: &mut [f64], source: Option<ArrayView1<'_, f64>>) {
    match source {
        Some(src) => cells.iter_mut().zip(src.iter()).for_each(|(c, &v)| *c = v),
        None => cells.fill(f64::NAN),
    }
}

#[inline]
fn write_difference(
    cells: &mut [f64],
    minuend: Option<ArrayView1<'_, f64>>,
    subtrahend: Option<ArrayView1<'_, f64>>,
) {
    match (minuend, subtrahend) {
        (Some(a), Some(b)) => cells
            .iter_mut()
            .zip(a.iter().zip(b.iter()))
            .for_each(|(c, (&x, &y))| *c = x - y),
        _ => cells.fill(f64::NAN),
    }
}
