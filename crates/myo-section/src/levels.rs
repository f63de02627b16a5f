//! Cut levels along the origin→insertion line.

use myo_math::Point3;

use crate::axis::AxisPair;

/// One sampling point on the muscle's long axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutLevel {
    /// Position in the generated sequence (0-based).
    pub index: usize,
    /// Distance from the origin as a fraction of the axis length.
    pub fraction: f64,
    /// The point the cutting plane passes through.
    pub point: Point3,
}

impl CutLevel {
    fn at(axis: &AxisPair, index: usize, fraction: f64) -> Self {
        Self {
            index,
            fraction,
            point: axis.origin - axis.vector() * fraction,
        }
    }
}

/// Evenly spaced interior levels.
///
/// Level `i` (for `i` in `1..=slice_count`) sits at `increment * (i + 1)` of
/// the way from origin to insertion. With 17 slices and a 5 % increment the
/// levels run from 10 % to 90 %; the endpoints themselves are never cut.
pub fn generate_cut_levels(axis: &AxisPair, slice_count: usize, increment: f64) -> Vec<CutLevel> {
    (1..=slice_count)
        .enumerate()
        .map(|(index, i)| CutLevel::at(axis, index, increment * (i + 1) as f64))
        .collect()
}

/// Mid-belly levels: the midpoint, then the midpoint moved `increment` of the
/// axis length towards the insertion and towards the origin.
pub fn generate_midbelly_levels(axis: &AxisPair, increment: f64) -> Vec<CutLevel> {
    [0.5, 0.5 + increment, 0.5 - increment]
        .into_iter()
        .enumerate()
        .map(|(index, fraction)| CutLevel::at(axis, index, fraction))
        .collect()
}
