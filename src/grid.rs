//! Loading of emission-line grids from photoionization model tables.

use crate::{
    constants::fem,
    error::{NebularError, Result},
    io::utils as io_utils,
    model::{DensityBand, MetallicityResolution, ModelSpec},
};
use log::{debug, info, warn};
use ndarray::prelude::*;
use std::path::Path;

/// Strictly increasing coordinates of the tabulated points along a grid axis.
#[derive(Clone, Debug, PartialEq)]
pub struct BinAxis {
    points: Vec<fem>,
}

impl BinAxis {
    /// Creates a new axis from at least two finite, strictly increasing points.
    pub fn new(points: Vec<fem>) -> Result<Self> {
        if points.len() < 2 {
            return Err(NebularError::inconsistent_input(format!(
                "Grid axis needs at least 2 points, got {}",
                points.len()
            )));
        }
        if !points.iter().all(|point| point.is_finite())
            || !points.windows(2).all(|pair| pair[0] < pair[1])
        {
            return Err(NebularError::inconsistent_input(format!(
                "Grid axis points {:?} are not finite and strictly increasing",
                points
            )));
        }
        Ok(Self { points })
    }

    /// Creates an axis holding the log10 of the given positive values.
    pub fn from_log10_of(values: &[fem]) -> Result<Self> {
        Self::new(values.iter().map(|value| fem::log10(*value)).collect())
    }

    pub fn points(&self) -> &[fem] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// How grid rows whose ionization parameter matches no U bin are handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UBinMismatchPolicy {
    /// Abort loading with [`NebularError::UnmatchedUBin`].
    Fail,
    /// Skip the row and continue.
    Skip,
}

/// Emission lines tabulated at one density, indexed by
/// (metallicity index, U index, line index).
#[derive(Clone, Debug, PartialEq)]
pub struct EmissionGrid {
    band: DensityBand,
    values: Array3<fem>,
}

impl EmissionGrid {
    pub fn new(band: DensityBand, values: Array3<fem>) -> Self {
        Self { band, values }
    }

    pub fn band(&self) -> &DensityBand {
        &self.band
    }

    pub fn resolution(&self) -> MetallicityResolution {
        self.band.resolution
    }

    pub fn values(&self) -> ArrayView3<fem> {
        self.values.view()
    }

    pub fn n_lines(&self) -> usize {
        self.values.shape()[2]
    }
}

/// The emission-line grids of a model, one per density band in increasing
/// density, together with their axes.
#[derive(Clone, Debug)]
pub struct GridSet {
    grids: Vec<EmissionGrid>,
    u_axis: BinAxis,
    z_axis_reduced: BinAxis,
    z_axis_full: BinAxis,
}

impl GridSet {
    /// Creates a grid set, checking that every grid conforms to its axes.
    pub fn new(
        grids: Vec<EmissionGrid>,
        u_axis: BinAxis,
        z_axis_reduced: BinAxis,
        z_axis_full: BinAxis,
    ) -> Result<Self> {
        if grids.is_empty() {
            return Err(NebularError::inconsistent_input("No emission-line grids"));
        }
        if !grids
            .windows(2)
            .all(|pair| pair[0].band().n_h < pair[1].band().n_h)
        {
            return Err(NebularError::inconsistent_input(
                "Density bands are not strictly increasing",
            ));
        }
        let n_lines = grids[0].n_lines();
        let grid_set = Self {
            grids,
            u_axis,
            z_axis_reduced,
            z_axis_full,
        };
        for grid in &grid_set.grids {
            let expected_shape = [
                grid_set.z_axis(grid.resolution()).len(),
                grid_set.u_axis.len(),
                n_lines,
            ];
            if grid.values.shape() != expected_shape {
                return Err(NebularError::inconsistent_input(format!(
                    "Grid for nH = {} has shape {:?}, expected {:?}",
                    grid.band().n_h,
                    grid.values.shape(),
                    expected_shape
                )));
            }
        }
        Ok(grid_set)
    }

    pub fn grids(&self) -> &[EmissionGrid] {
        &self.grids
    }

    pub fn u_axis(&self) -> &BinAxis {
        &self.u_axis
    }

    /// Returns the metallicity axis of the given resolution.
    pub fn z_axis(&self, resolution: MetallicityResolution) -> &BinAxis {
        match resolution {
            MetallicityResolution::Reduced => &self.z_axis_reduced,
            MetallicityResolution::Full => &self.z_axis_full,
        }
    }

    pub fn n_lines(&self) -> usize {
        self.grids[0].n_lines()
    }

    /// Returns log10 of the density of each band.
    pub fn log_density_edges(&self) -> Vec<fem> {
        self.grids
            .iter()
            .map(|grid| grid.band().log_density())
            .collect()
    }
}

/// Reads the per-metallicity tables of a model and assembles its emission-line grids.
///
/// Every table has to exist before any of them is parsed, so a missing table
/// aborts loading without producing partial grids.
pub fn load_grids(spec: &ModelSpec, u_bin_mismatch: UBinMismatchPolicy) -> Result<GridSet> {
    spec.validate()?;

    let u_axis = BinAxis::new(spec.u_bins.clone())?;
    let z_axis_full = BinAxis::from_log10_of(&spec.metallicities)?;
    let z_axis_reduced = BinAxis::from_log10_of(&spec.reduced_metallicities())?;

    let grid_paths = spec.grid_file_paths();
    if let Some(missing_path) = grid_paths.iter().find(|path| !path.is_file()) {
        return Err(NebularError::MissingGridFile {
            model: spec.name.clone(),
            path: missing_path.clone(),
        });
    }

    let mut grid_values: Vec<_> = spec
        .density_bands
        .iter()
        .map(|band| {
            let n_z = match band.resolution {
                MetallicityResolution::Reduced => z_axis_reduced.len(),
                MetallicityResolution::Full => z_axis_full.len(),
            };
            Array3::zeros((n_z, u_axis.len(), spec.n_lines))
        })
        .collect();
    let mut filled: Vec<_> = grid_values
        .iter()
        .map(|values| Array2::from_elem((values.shape()[0], values.shape()[1]), false))
        .collect();

    for (metallicity_idx, path) in grid_paths.iter().enumerate() {
        info!("Reading grid table {}", path.display());
        read_grid_table(
            spec,
            path,
            metallicity_idx,
            u_bin_mismatch,
            &mut grid_values,
            &mut filled,
        )?;
    }

    for (band, filled) in spec.density_bands.iter().zip(&filled) {
        let n_empty = filled.iter().filter(|&&is_filled| !is_filled).count();
        if n_empty > 0 {
            warn!(
                "{} of {} cells of the nH = {} grid of model {} received no table row",
                n_empty,
                filled.len(),
                band.n_h,
                spec.name
            );
        }
    }

    let grids = spec
        .density_bands
        .iter()
        .zip(grid_values)
        .map(|(&band, values)| EmissionGrid::new(band, values))
        .collect();

    GridSet::new(grids, u_axis, z_axis_reduced, z_axis_full)
}

fn read_grid_table(
    spec: &ModelSpec,
    path: &Path,
    metallicity_idx: usize,
    u_bin_mismatch: UBinMismatchPolicy,
    grid_values: &mut [Array3<fem>],
    filled: &mut [Array2<bool>],
) -> Result<()> {
    let text = io_utils::read_text_file(path)?;

    for (line_number, line) in io_utils::data_lines(&text, '#') {
        let fields: Vec<_> = line.split_whitespace().collect();
        let row = spec
            .row_parser
            .parse_row(&fields)
            .map_err(|message| NebularError::MalformedRow {
                path: path.to_path_buf(),
                line: line_number,
                message,
            })?;

        if row.lines.len() < spec.n_lines {
            return Err(NebularError::MalformedRow {
                path: path.to_path_buf(),
                line: line_number,
                message: format!(
                    "Expected {} emission lines, found {}",
                    spec.n_lines,
                    row.lines.len()
                ),
            });
        }

        if !spec.selection.accepts(&row) {
            continue;
        }

        #[allow(clippy::float_cmp)]
        let u_idx = match spec.u_bins.iter().position(|&u| u == row.log_u) {
            Some(u_idx) => u_idx,
            None => match u_bin_mismatch {
                UBinMismatchPolicy::Fail => {
                    return Err(NebularError::UnmatchedUBin {
                        path: path.to_path_buf(),
                        line: line_number,
                        log_u: row.log_u,
                    })
                }
                UBinMismatchPolicy::Skip => {
                    debug!(
                        "Skipping line {} of {}: log U = {} matches no U bin",
                        line_number,
                        path.display(),
                        row.log_u
                    );
                    continue;
                }
            },
        };

        #[allow(clippy::float_cmp)]
        let band_idx = match spec
            .density_bands
            .iter()
            .position(|band| band.n_h == row.n_h)
        {
            Some(band_idx) => band_idx,
            None => continue,
        };

        let z_idx = match spec.density_bands[band_idx].resolution {
            MetallicityResolution::Full => metallicity_idx,
            MetallicityResolution::Reduced => match spec.reduced_slot(metallicity_idx) {
                Some(slot) => slot,
                None => continue,
            },
        };

        grid_values[band_idx]
            .slice_mut(s![z_idx, u_idx, ..])
            .assign(&ArrayView1::from(&row.lines[..spec.n_lines]));
        filled[band_idx][[z_idx, u_idx]] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::gutkin16;

    #[test]
    fn axes_must_be_strictly_increasing() {
        assert!(BinAxis::new(vec![-4.0, -3.5, -3.0]).is_ok());
        assert!(BinAxis::new(vec![-4.0, -4.0, -3.0]).is_err());
        assert!(BinAxis::new(vec![-3.0, -4.0]).is_err());
        assert!(BinAxis::new(vec![-3.0]).is_err());
        assert!(BinAxis::new(vec![-3.0, f64::NAN]).is_err());
    }

    #[test]
    fn grid_set_checks_shapes() {
        let u_axis = BinAxis::new(vec![-4.0, -3.0]).unwrap();
        let z_axis = BinAxis::new(vec![-3.0, -2.0]).unwrap();
        let band = DensityBand::new(100.0, MetallicityResolution::Full);

        let good = EmissionGrid::new(band, Array3::zeros((2, 2, 3)));
        assert!(GridSet::new(vec![good], u_axis.clone(), z_axis.clone(), z_axis.clone()).is_ok());

        let bad = EmissionGrid::new(band, Array3::zeros((3, 2, 3)));
        assert!(GridSet::new(vec![bad], u_axis, z_axis.clone(), z_axis).is_err());
    }

    #[test]
    fn missing_table_aborts_loading() {
        let data_dir = tempfile::tempdir().unwrap();
        let spec = gutkin16::model_spec(data_dir.path());
        match load_grids(&spec, UBinMismatchPolicy::Fail) {
            Err(NebularError::MissingGridFile { model, path }) => {
                assert_eq!(model, gutkin16::NAME);
                assert_eq!(path, spec.grid_file_path(0));
            }
            other => panic!("Unexpected result {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn inconsistent_model_is_rejected_before_reading() {
        let data_dir = tempfile::tempdir().unwrap();
        let mut spec = gutkin16::model_spec(data_dir.path());
        spec.reduced_metallicity_indices = vec![0, 4, 9, 20];
        assert!(matches!(
            load_grids(&spec, UBinMismatchPolicy::Fail),
            Err(NebularError::InconsistentInput { .. })
        ));
    }
}
