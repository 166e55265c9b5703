//! Ratio-preserving coordinate scaling for trajectory data.
//!
//! Positions recorded in different labs live in different coordinate frames
//! (metres, centimetres, arbitrary origins). Before windowing, every position
//! is mapped into the unit square using a single transform computed from the
//! full observed extent of the dataset.
//!
//! # Lifecycle
//!
//! Scaling is split into two types so the accumulate-then-use order is
//! enforced by the compiler:
//!
//! ```text
//! ScaleEstimator ──accumulate()*──► ScaleEstimator ──finalize()──► Scale
//!   (mutable, running extent)                              (immutable, read-only)
//! ```
//!
//! Only [`Scale`] exposes `normalize` / `denormalize`. `finalize` consumes the
//! estimator, so it runs exactly once and no point can be added afterwards.
//!
//! # Transform
//!
//! ```text
//! sx = 1 / (max_x - min_x)        sy = 1 / (max_y - min_y)
//! keep_ratio:  sx = sy = min(sx, sy)
//!
//! normalize:    out = (in - min * shift) * s
//! denormalize:  out =  in / s + min * shift
//! ```
//!
//! `shift = false` scales without translating, which is what vector
//! quantities such as velocity need.
//!
//! # Shapes
//!
//! The spatial axis is always the last axis of the array; x is at index 0 and
//! y at index 1 of each lane along it. Any trailing columns are left untouched.
//!
//! | Rank | Layout | Meaning |
//! |------|--------|---------|
//! | 1 | `[2+]` | single point |
//! | 2 | `[T, 2+]` | one sequence |
//! | 3 | `[B, T, 2+]` | batch of sequences |
//!
//! # Example
//!
//! ```
//! use ndarray::array;
//! use trajectory_extractor::preprocessing::ScaleEstimator;
//!
//! let mut estimator = ScaleEstimator::new();
//! estimator
//!     .accumulate(&array![[0.0, 0.0], [10.0, 0.0], [0.0, 5.0], [10.0, 5.0]])
//!     .unwrap();
//! let scale = estimator.finalize(true).unwrap();
//!
//! let p = scale.normalize(&array![10.0, 5.0], true).unwrap();
//! assert!((p[0] - 1.0).abs() < 1e-12);
//! assert!((p[1] - 0.5).abs() < 1e-12);
//! ```

use crate::error::{Result, SpatialAxis, TrajectoryError};
use ndarray::{Array, ArrayBase, ArrayViewMut, Axis, Data, DataMut, Dimension, Ix2};

/// Axis-aligned bounding rectangle of observed positions.
///
/// Starts out empty as `(+inf, -inf, +inf, -inf)` so that the first included
/// point becomes both min and max.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingExtent {
    /// Smallest observed x
    pub min_x: f64,
    /// Largest observed x
    pub max_x: f64,
    /// Smallest observed y
    pub min_y: f64,
    /// Largest observed y
    pub max_y: f64,
}

impl BoundingExtent {
    /// Create an empty extent.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// True until at least one (non-NaN) point has been included.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Expand the extent to cover `(x, y)`.
    ///
    /// NaN coordinates leave the extent unchanged (`f64::min`/`max` ignore NaN).
    #[inline]
    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// Expand the extent to cover another extent.
    ///
    /// Merging is commutative and associative, and merging an empty extent is
    /// a no-op.
    pub fn merge(&mut self, other: &BoundingExtent) {
        self.min_x = self.min_x.min(other.min_x);
        self.max_x = self.max_x.max(other.max_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Width of the extent (`max_x - min_x`).
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the extent (`max_y - min_y`).
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check whether a point lies inside the extent (borders included).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

impl Default for BoundingExtent {
    fn default() -> Self {
        Self::empty()
    }
}

/// Per-axis multiplicative scale factors.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScaleFactors {
    /// Factor applied to x
    pub sx: f64,
    /// Factor applied to y
    pub sy: f64,
}

impl ScaleFactors {
    /// Derive factors from a non-empty extent.
    ///
    /// # Errors
    ///
    /// - [`TrajectoryError::EmptyExtent`] if no point was ever included
    /// - [`TrajectoryError::NonFiniteExtent`] if an infinite coordinate was included
    /// - [`TrajectoryError::DegenerateExtent`] if either axis has zero width
    pub fn from_extent(extent: &BoundingExtent, keep_ratio: bool) -> Result<Self> {
        if extent.is_empty() {
            return Err(TrajectoryError::EmptyExtent);
        }
        if !extent.width().is_finite() {
            return Err(TrajectoryError::NonFiniteExtent {
                axis: SpatialAxis::X,
                min: extent.min_x,
                max: extent.max_x,
            });
        }
        if !extent.height().is_finite() {
            return Err(TrajectoryError::NonFiniteExtent {
                axis: SpatialAxis::Y,
                min: extent.min_y,
                max: extent.max_y,
            });
        }
        if extent.width() == 0.0 {
            return Err(TrajectoryError::DegenerateExtent {
                axis: SpatialAxis::X,
                value: extent.min_x,
            });
        }
        if extent.height() == 0.0 {
            return Err(TrajectoryError::DegenerateExtent {
                axis: SpatialAxis::Y,
                value: extent.min_y,
            });
        }

        let sx = 1.0 / extent.width();
        let sy = 1.0 / extent.height();

        if keep_ratio {
            // The tighter factor keeps the wider axis inside [0, 1].
            let s = sx.min(sy);
            Ok(Self { sx: s, sy: s })
        } else {
            Ok(Self { sx, sy })
        }
    }
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self { sx: 1.0, sy: 1.0 }
    }
}

/// Accumulation phase of the scale computation.
///
/// Collects the bounding extent of every position sequence it is given.
/// Call [`ScaleEstimator::finalize`] once all agents have been seen.
///
/// # Parallel Use
///
/// Estimators can be built per agent on separate threads and combined with
/// [`ScaleEstimator::merge`]; the result is independent of merge order.
#[derive(Debug, Clone, Default)]
pub struct ScaleEstimator {
    extent: BoundingExtent,
    point_count: usize,
}

impl ScaleEstimator {
    /// Create an estimator with an empty extent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand the extent to cover every row of a `[T, 2+]` position array.
    ///
    /// Columns 0 and 1 are x and y; extra columns are ignored. An array with
    /// zero rows is accepted and changes nothing.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::ShapeMismatch`] if the array has fewer than 2 columns.
    pub fn accumulate<S>(&mut self, positions: &ArrayBase<S, Ix2>) -> Result<()>
    where
        S: Data<Elem = f64>,
    {
        if positions.ncols() < 2 {
            return Err(TrajectoryError::ShapeMismatch(format!(
                "positions need at least 2 columns (x, y), got {}",
                positions.ncols()
            )));
        }

        for row in positions.rows() {
            self.extent.include(row[0], row[1]);
        }
        self.point_count += positions.nrows();
        Ok(())
    }

    /// Expand the extent to cover a collection of `(x, y)` pairs.
    pub fn accumulate_points<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        for (x, y) in points {
            self.accumulate_point(x, y);
        }
    }

    /// Expand the extent to cover a single point.
    #[inline]
    pub fn accumulate_point(&mut self, x: f64, y: f64) {
        self.extent.include(x, y);
        self.point_count += 1;
    }

    /// Fold another estimator's extent into this one.
    pub fn merge(&mut self, other: &ScaleEstimator) {
        self.extent.merge(&other.extent);
        self.point_count += other.point_count;
    }

    /// Current running extent.
    pub fn extent(&self) -> &BoundingExtent {
        &self.extent
    }

    /// Number of points accumulated so far.
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Compute the scale factors and freeze the transform.
    ///
    /// With `keep_ratio` both axes use the smaller of the two raw factors, so
    /// the wider axis fills `[0, 1]` and the other lands in a sub-interval.
    /// Without it each axis is stretched to fill `[0, 1]` independently.
    ///
    /// # Errors
    ///
    /// - [`TrajectoryError::EmptyExtent`] if nothing was accumulated
    /// - [`TrajectoryError::NonFiniteExtent`] if an infinite coordinate was accumulated
    /// - [`TrajectoryError::DegenerateExtent`] if an axis has zero width
    pub fn finalize(self, keep_ratio: bool) -> Result<Scale> {
        let factors = ScaleFactors::from_extent(&self.extent, keep_ratio)?;

        tracing::debug!(
            points = self.point_count,
            min_x = self.extent.min_x,
            max_x = self.extent.max_x,
            min_y = self.extent.min_y,
            max_y = self.extent.max_y,
            sx = factors.sx,
            sy = factors.sy,
            keep_ratio,
            "scale finalized"
        );

        Ok(Scale {
            extent: self.extent,
            factors,
            keep_ratio,
        })
    }
}

/// Finalized, read-only normalization transform.
///
/// Obtained from [`ScaleEstimator::finalize`]. Cheap to clone and safe to
/// share across threads.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scale {
    extent: BoundingExtent,
    factors: ScaleFactors,
    keep_ratio: bool,
}

impl Scale {
    /// Extent the transform was computed from.
    pub fn extent(&self) -> &BoundingExtent {
        &self.extent
    }

    /// Scale factors.
    pub fn factors(&self) -> ScaleFactors {
        self.factors
    }

    /// Whether the aspect ratio was preserved.
    pub fn keep_ratio(&self) -> bool {
        self.keep_ratio
    }

    /// Map one point into normalized space.
    #[inline]
    pub fn normalize_point(&self, x: f64, y: f64, shift: bool) -> (f64, f64) {
        let (ox, oy) = self.offsets(shift);
        ((x - ox) * self.factors.sx, (y - oy) * self.factors.sy)
    }

    /// Map one point back to the original frame.
    #[inline]
    pub fn denormalize_point(&self, x: f64, y: f64, shift: bool) -> (f64, f64) {
        let (ox, oy) = self.offsets(shift);
        (x / self.factors.sx + ox, y / self.factors.sy + oy)
    }

    /// Normalize into a fresh array; `data` is left untouched.
    ///
    /// # Errors
    ///
    /// - [`TrajectoryError::UnsupportedDimensionality`] for rank other than 1, 2, 3
    /// - [`TrajectoryError::ShapeMismatch`] if the last axis is shorter than 2
    pub fn normalize<S, D>(&self, data: &ArrayBase<S, D>, shift: bool) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        check_coordinate_shape(data.shape())?;
        let mut out = data.to_owned();
        self.normalize_in_place(&mut out, shift)?;
        Ok(out)
    }

    /// Normalize `data` in place and return a mutable view of it.
    ///
    /// # Errors
    ///
    /// Same as [`Scale::normalize`]; on error `data` is not modified.
    pub fn normalize_in_place<'a, S, D>(
        &self,
        data: &'a mut ArrayBase<S, D>,
        shift: bool,
    ) -> Result<ArrayViewMut<'a, f64, D>>
    where
        S: DataMut<Elem = f64>,
        D: Dimension,
    {
        self.map_lanes(data, |x, y| self.normalize_point(x, y, shift))
    }

    /// Invert [`Scale::normalize`] into a fresh array.
    ///
    /// With `shift = true` on both calls the round trip is the identity up to
    /// floating-point error.
    pub fn denormalize<S, D>(&self, data: &ArrayBase<S, D>, shift: bool) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        check_coordinate_shape(data.shape())?;
        let mut out = data.to_owned();
        self.denormalize_in_place(&mut out, shift)?;
        Ok(out)
    }

    /// Invert [`Scale::normalize`] in place and return a mutable view.
    pub fn denormalize_in_place<'a, S, D>(
        &self,
        data: &'a mut ArrayBase<S, D>,
        shift: bool,
    ) -> Result<ArrayViewMut<'a, f64, D>>
    where
        S: DataMut<Elem = f64>,
        D: Dimension,
    {
        self.map_lanes(data, |x, y| self.denormalize_point(x, y, shift))
    }

    #[inline]
    fn offsets(&self, shift: bool) -> (f64, f64) {
        if shift {
            (self.extent.min_x, self.extent.min_y)
        } else {
            (0.0, 0.0)
        }
    }

    /// Apply `f` to the (x, y) head of every lane along the last axis.
    fn map_lanes<'a, S, D, F>(
        &self,
        data: &'a mut ArrayBase<S, D>,
        f: F,
    ) -> Result<ArrayViewMut<'a, f64, D>>
    where
        S: DataMut<Elem = f64>,
        D: Dimension,
        F: Fn(f64, f64) -> (f64, f64),
    {
        check_coordinate_shape(data.shape())?;

        let spatial = Axis(data.ndim() - 1);
        for mut lane in data.lanes_mut(spatial) {
            let (x, y) = f(lane[0], lane[1]);
            lane[0] = x;
            lane[1] = y;
        }

        Ok(data.view_mut())
    }
}

fn check_coordinate_shape(shape: &[usize]) -> Result<()> {
    let ndim = shape.len();
    if !(1..=3).contains(&ndim) {
        return Err(TrajectoryError::UnsupportedDimensionality { ndim });
    }

    let width = shape[ndim - 1];
    if width < 2 {
        return Err(TrajectoryError::ShapeMismatch(format!(
            "last axis holds coordinates and needs at least 2 entries (x, y), got {width}"
        )));
    }
    Ok(())
}
