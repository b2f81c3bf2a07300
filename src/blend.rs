//! Blending of emission lines interpolated in adjacent density bands.

use crate::{
    constants::fem,
    error::{NebularError, Result},
};
use ndarray::prelude::*;
use ndarray::Zip;

/// Contribution of two adjacent density bands to a blended result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandWeights {
    pub lower_band: usize,
    pub upper_band: usize,
    /// Weight of the upper band; the lower band gets the complement.
    pub weight: fem,
}

/// Linear blender over the log10 densities of the tabulated bands.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityBlender {
    log_edges: Vec<fem>,
}

impl DensityBlender {
    /// Creates a blender for bands with the given strictly increasing log10 densities.
    pub fn new(log_edges: Vec<fem>) -> Result<Self> {
        if log_edges.is_empty()
            || !log_edges.iter().all(|edge| edge.is_finite())
            || !log_edges.windows(2).all(|pair| pair[0] < pair[1])
        {
            return Err(NebularError::inconsistent_input(format!(
                "Density band edges {:?} are not finite and strictly increasing",
                log_edges
            )));
        }
        Ok(Self { log_edges })
    }

    pub fn log_edges(&self) -> &[fem] {
        &self.log_edges
    }

    /// Determines which bands contribute at the given log10 density.
    ///
    /// Densities at or below the first edge use the first band only and densities
    /// above the last edge the last band only. In between, the interval
    /// (edge[i], edge[i + 1]] blends band i and i + 1, so an edge belongs to the
    /// interval below it.
    ///
    /// # Returns
    ///
    /// The band weights, or `None` if the density is NaN.
    pub fn weights(&self, log_ne: fem) -> Option<BandWeights> {
        let n_bands = self.log_edges.len();
        let last = n_bands - 1;

        if log_ne <= self.log_edges[0] {
            Some(BandWeights {
                lower_band: 0,
                upper_band: 0,
                weight: 0.0,
            })
        } else if log_ne > self.log_edges[last] {
            Some(BandWeights {
                lower_band: last,
                upper_band: last,
                weight: 0.0,
            })
        } else if log_ne.is_nan() {
            None
        } else {
            // edges[upper_band - 1] < log_ne <= edges[upper_band]
            let upper_band = self.log_edges.partition_point(|&edge| edge < log_ne);
            let lower_band = upper_band - 1;
            let lower = self.log_edges[lower_band];
            let upper = self.log_edges[upper_band];
            Some(BandWeights {
                lower_band,
                upper_band,
                weight: (log_ne - lower) / (upper - lower),
            })
        }
    }

    /// Blends the emission lines interpolated in each band at the given log10 density.
    ///
    /// # Parameters
    ///
    /// - `log_ne`: Log10 of the electron density [cm^-3].
    /// - `band_lines`: Lines interpolated in each band, in band order.
    ///
    /// # Returns
    ///
    /// The blended lines, or `None` if the density is NaN.
    ///
    /// # Panics
    ///
    /// If the number of line vectors differs from the number of bands.
    pub fn blend(&self, log_ne: fem, band_lines: &[ArrayView1<fem>]) -> Option<Array1<fem>> {
        assert_eq!(
            band_lines.len(),
            self.log_edges.len(),
            "Number of line vectors does not match number of density bands"
        );
        let weights = self.weights(log_ne)?;

        if weights.lower_band == weights.upper_band {
            return Some(band_lines[weights.lower_band].to_owned());
        }
        let weight = weights.weight;
        let mut lines = Array1::zeros(band_lines[weights.lower_band].len());
        Zip::from(&mut lines)
            .and(&band_lines[weights.lower_band])
            .and(&band_lines[weights.upper_band])
            .for_each(|line, &lower, &upper| {
                *line = (1.0 - weight) * lower + weight * upper;
            });
        Some(lines)
    }
}
