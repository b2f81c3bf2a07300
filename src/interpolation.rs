//! Interpolation of emission lines in metallicity and ionization parameter.

use crate::{constants::fem, grid::BinAxis};
use ndarray::prelude::*;
use ndarray::Zip;

/// Position of a coordinate within a grid axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterpolationWeights {
    /// Index of the lower point of the bracketing interval.
    pub bin_index: usize,
    /// Fractional distance from the lower to the upper point, in [0, 1].
    pub fractional_distance: fem,
}

impl InterpolationWeights {
    pub fn new(bin_index: usize, fractional_distance: fem) -> Self {
        Self {
            bin_index,
            fractional_distance,
        }
    }

    /// Locates the interval of the axis containing the given coordinate.
    ///
    /// Coordinates at or below the first point are pinned to the start of the
    /// first interval, and coordinates at or above the last point to the end of
    /// the last interval, so no extrapolation takes place.
    ///
    /// # Returns
    ///
    /// The weights, or `None` if the coordinate is NaN.
    pub fn locate(axis: &BinAxis, coord: fem) -> Option<Self> {
        if coord.is_nan() {
            return None;
        }
        let points = axis.points();
        let n_points = points.len();

        Some(if coord <= points[0] {
            Self::new(0, 0.0)
        } else if coord >= points[n_points - 1] {
            Self::new(n_points - 2, 1.0)
        } else {
            // points[bin_index] <= coord < points[bin_index + 1]
            let bin_index = points.partition_point(|&point| point <= coord) - 1;
            let lower = points[bin_index];
            let upper = points[bin_index + 1];
            Self::new(bin_index, (coord - lower) / (upper - lower))
        })
    }
}

/// Defines the properties of an interpolator over the metallicity and U axes
/// of an emission-line grid.
pub trait Interpolator2: Clone + Sync + Send {
    /// Computes the interpolated emission lines of the grid at the position
    /// described by the given metallicity and U weights.
    ///
    /// # Parameters
    ///
    /// - `grid`: Emission lines indexed by (metallicity index, U index, line index).
    /// - `z_weights`: Location along the metallicity axis.
    /// - `u_weights`: Location along the U axis.
    ///
    /// # Returns
    ///
    /// The interpolated value of every line.
    fn interp_lines(
        &self,
        grid: ArrayView3<fem>,
        z_weights: &InterpolationWeights,
        u_weights: &InterpolationWeights,
    ) -> Array1<fem>;
}

/// Interpolator combining the four grid cells surrounding the interpolation
/// point linearly in both directions.
#[derive(Clone, Copy, Debug, Default)]
pub struct BilinearInterpolator;

impl Interpolator2 for BilinearInterpolator {
    fn interp_lines(
        &self,
        grid: ArrayView3<fem>,
        z_weights: &InterpolationWeights,
        u_weights: &InterpolationWeights,
    ) -> Array1<fem> {
        let i = z_weights.bin_index;
        let j = u_weights.bin_index;
        let dz = z_weights.fractional_distance;
        let du = u_weights.fractional_distance;

        let w00 = (1.0 - dz) * (1.0 - du);
        let w10 = dz * (1.0 - du);
        let w01 = (1.0 - dz) * du;
        let w11 = dz * du;

        let mut lines = Array1::zeros(grid.shape()[2]);
        Zip::from(&mut lines)
            .and(grid.slice(s![i, j, ..]))
            .and(grid.slice(s![i + 1, j, ..]))
            .and(grid.slice(s![i, j + 1, ..]))
            .and(grid.slice(s![i + 1, j + 1, ..]))
            .for_each(|line, &g00, &g10, &g01, &g11| {
                *line = w00 * g00 + w10 * g10 + w01 * g01 + w11 * g11;
            });
        lines
    }
}

/// Interpolates the emission lines of a grid bilinearly at the given log10
/// ionization parameter and log10 metallicity.
///
/// # Returns
///
/// The interpolated lines, or `None` if either coordinate is NaN.
pub fn interpolate(
    log_u: fem,
    log_z: fem,
    grid: ArrayView3<fem>,
    u_axis: &BinAxis,
    z_axis: &BinAxis,
) -> Option<Array1<fem>> {
    let u_weights = InterpolationWeights::locate(u_axis, log_u)?;
    let z_weights = InterpolationWeights::locate(z_axis, log_z)?;
    Some(BilinearInterpolator.interp_lines(grid, &z_weights, &u_weights))
}
