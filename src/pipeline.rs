//! Computation of the nebular emission lines of disk and bulge components.

use crate::{
    blend::DensityBlender,
    clamp::clamp_galaxy_properties,
    constants::fem,
    error::Result,
    galaxy::{Component, ComponentProperties, GalaxyProperties},
    grid::{self, GridSet, UBinMismatchPolicy},
    interpolation::{BilinearInterpolator, InterpolationWeights, Interpolator2},
    limits::{LimitsRegistry, PropertyLimits},
    model::{MetallicityResolution, ModelRegistry, Property},
};
use log::{info, warn};
use ndarray::prelude::*;
use rayon::prelude::*;
use std::{collections::HashMap, fmt};

#[cfg(feature = "for-testing")]
use approx::{AbsDiffEq, RelativeEq};

/// Configuration parameters for computing emission lines.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// How grid rows with an ionization parameter matching no U bin are handled.
    pub u_bin_mismatch: UBinMismatchPolicy,
    /// Whether to process galaxies in parallel.
    pub parallel: bool,
}

impl PipelineConfig {
    pub const DEFAULT_U_BIN_MISMATCH: UBinMismatchPolicy = UBinMismatchPolicy::Fail;
    pub const DEFAULT_PARALLEL: bool = true;
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            u_bin_mismatch: Self::DEFAULT_U_BIN_MISMATCH,
            parallel: Self::DEFAULT_PARALLEL,
        }
    }
}

/// Kind of problem preventing emission lines from being computed for a galaxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnomalyKind {
    /// The density lies outside every density band.
    OutOfRangeDensity,
    /// A value could not be placed on a grid axis.
    UnbinnableValue,
}

/// A galaxy component whose emission lines were set to zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub component: Component,
    pub galaxy_idx: usize,
    pub property: Property,
    /// The offending log10 value.
    pub value: fem,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AnomalyKind::OutOfRangeDensity => write!(
                f,
                "log(ne) of {} of galaxy {} out of limits: {}",
                self.component, self.galaxy_idx, self.value
            ),
            AnomalyKind::UnbinnableValue => write!(
                f,
                "log({}) of {} of galaxy {} cannot be interpolated: {}",
                self.property, self.component, self.galaxy_idx, self.value
            ),
        }
    }
}

/// Emission lines of the disk and bulge of each galaxy, as
/// arrays of shape [number of lines, number of galaxies].
#[derive(Clone, Debug, PartialEq)]
pub struct EmissionLines {
    model: String,
    disk: Array2<fem>,
    bulge: Array2<fem>,
    anomalies: Vec<Anomaly>,
}

impl EmissionLines {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn lines(&self, component: Component) -> &Array2<fem> {
        match component {
            Component::Disk => &self.disk,
            Component::Bulge => &self.bulge,
        }
    }

    pub fn n_lines(&self) -> usize {
        self.disk.nrows()
    }

    pub fn n_galaxies(&self) -> usize {
        self.disk.ncols()
    }

    /// Galaxy components whose lines were zero-filled.
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }
}

#[cfg(feature = "for-testing")]
impl EmissionLines {
    fn paired_values<'a>(
        &'a self,
        other: &'a Self,
    ) -> Option<impl Iterator<Item = (&'a fem, &'a fem)>> {
        if self.model == other.model
            && self.disk.shape() == other.disk.shape()
            && self.bulge.shape() == other.bulge.shape()
        {
            Some(
                self.disk
                    .iter()
                    .chain(self.bulge.iter())
                    .zip(other.disk.iter().chain(other.bulge.iter())),
            )
        } else {
            None
        }
    }
}

#[cfg(feature = "for-testing")]
impl AbsDiffEq for EmissionLines {
    type Epsilon = <fem as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        fem::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.paired_values(other).map_or(false, |mut pairs| {
            pairs.all(|(a, b)| a.abs_diff_eq(b, epsilon))
        })
    }
}

#[cfg(feature = "for-testing")]
impl RelativeEq for EmissionLines {
    fn default_max_relative() -> Self::Epsilon {
        fem::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.paired_values(other).map_or(false, |mut pairs| {
            pairs.all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
        })
    }
}

/// Holds the model registry and everything loaded from it during a run.
///
/// Limits and grids are read on first use and reused for the lifetime of the
/// context.
#[derive(Debug)]
pub struct NebularContext<I: Interpolator2 = BilinearInterpolator> {
    models: ModelRegistry,
    limits: LimitsRegistry,
    grids: HashMap<String, GridSet>,
    interpolator: I,
    config: PipelineConfig,
}

impl NebularContext<BilinearInterpolator> {
    /// Creates a context using bilinear interpolation.
    pub fn new(models: ModelRegistry, config: PipelineConfig) -> Self {
        Self::with_interpolator(models, config, BilinearInterpolator)
    }
}

impl<I: Interpolator2> NebularContext<I> {
    /// Creates a context using the given interpolator.
    pub fn with_interpolator(
        models: ModelRegistry,
        config: PipelineConfig,
        interpolator: I,
    ) -> Self {
        Self {
            models,
            limits: LimitsRegistry::new(),
            grids: HashMap::new(),
            interpolator,
            config,
        }
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the tabulated limits of the property with the given name
    /// (`U`, `Z` or `ne`) for the given model.
    pub fn get_limits(&mut self, property_name: &str, model: &str) -> Result<(fem, fem)> {
        self.limits.get_limits(&self.models, property_name, model)
    }

    /// Returns the limits of every property for the given model.
    pub fn property_limits(&mut self, model: &str) -> Result<Vec<PropertyLimits>> {
        let spec = self.models.get(model)?;
        Property::ALL
            .iter()
            .map(|&property| self.limits.limits(spec, property))
            .collect()
    }

    /// Returns the grids of the given model, loading them on first use.
    pub fn grids(&mut self, model: &str) -> Result<&GridSet> {
        if !self.grids.contains_key(model) {
            let spec = self.models.get(model)?;
            let grid_set = grid::load_grids(spec, self.config.u_bin_mismatch)?;
            info!(
                "Loaded {} emission-line grids for model {}",
                grid_set.grids().len(),
                model
            );
            self.grids.insert(model.to_string(), grid_set);
        }
        Ok(&self.grids[model])
    }

    /// Clamps the properties of every galaxy to the limits of the given model.
    pub fn clamp_properties(
        &mut self,
        model: &str,
        properties: &mut GalaxyProperties,
    ) -> Result<()> {
        let limits = self.property_limits(model)?;
        clamp_galaxy_properties(properties, &limits);
        Ok(())
    }

    /// Computes the emission lines of the disk and bulge of every galaxy.
    ///
    /// The properties are first clamped in place to the limits of the model. The
    /// lines of a component are then interpolated in metallicity and ionization
    /// parameter within every density band and blended across bands according
    /// to the electron density. Components with properties that cannot be
    /// interpolated get zero lines and are reported as anomalies.
    pub fn compute_emission_lines(
        &mut self,
        model: &str,
        properties: &mut GalaxyProperties,
    ) -> Result<EmissionLines> {
        self.clamp_properties(model, properties)?;
        self.grids(model)?;

        let grids = &self.grids[model];
        let blender = DensityBlender::new(grids.log_density_edges())?;

        let compute = |component| {
            compute_component_lines(
                &self.interpolator,
                grids,
                &blender,
                component,
                properties.component(component),
                self.config.parallel,
            )
        };
        let (disk, mut anomalies) = compute(Component::Disk);
        let (bulge, bulge_anomalies) = compute(Component::Bulge);
        anomalies.extend(bulge_anomalies);

        if !anomalies.is_empty() {
            warn!(
                "Emission lines set to zero for {} galaxy components",
                anomalies.len()
            );
        }

        Ok(EmissionLines {
            model: model.to_string(),
            disk,
            bulge,
            anomalies,
        })
    }
}

fn compute_component_lines<I: Interpolator2>(
    interpolator: &I,
    grids: &GridSet,
    blender: &DensityBlender,
    component: Component,
    properties: &ComponentProperties,
    parallel: bool,
) -> (Array2<fem>, Vec<Anomaly>) {
    let n_galaxies = properties.n_galaxies();
    let compute = |galaxy_idx: usize| {
        compute_galaxy_lines(
            interpolator,
            grids,
            blender,
            properties.log_u()[galaxy_idx],
            properties.log_z()[galaxy_idx],
            properties.log_ne()[galaxy_idx],
        )
    };
    let results: Vec<_> = if parallel {
        (0..n_galaxies).into_par_iter().map(compute).collect()
    } else {
        (0..n_galaxies).map(compute).collect()
    };

    let mut lines = Array2::zeros((grids.n_lines(), n_galaxies));
    let mut anomalies = Vec::new();
    for (galaxy_idx, result) in results.into_iter().enumerate() {
        match result {
            Ok(galaxy_lines) => lines.column_mut(galaxy_idx).assign(&galaxy_lines),
            Err((kind, property, value)) => {
                let anomaly = Anomaly {
                    kind,
                    component,
                    galaxy_idx,
                    property,
                    value,
                };
                warn!("{}", anomaly);
                anomalies.push(anomaly);
            }
        }
    }
    (lines, anomalies)
}

fn compute_galaxy_lines<I: Interpolator2>(
    interpolator: &I,
    grids: &GridSet,
    blender: &DensityBlender,
    log_u: fem,
    log_z: fem,
    log_ne: fem,
) -> std::result::Result<Array1<fem>, (AnomalyKind, Property, fem)> {
    let unbinnable = |property, value| (AnomalyKind::UnbinnableValue, property, value);

    let u_weights = InterpolationWeights::locate(grids.u_axis(), log_u)
        .ok_or_else(|| unbinnable(Property::IonizationParameter, log_u))?;
    let z_weights_reduced =
        InterpolationWeights::locate(grids.z_axis(MetallicityResolution::Reduced), log_z)
            .ok_or_else(|| unbinnable(Property::Metallicity, log_z))?;
    let z_weights_full =
        InterpolationWeights::locate(grids.z_axis(MetallicityResolution::Full), log_z)
            .ok_or_else(|| unbinnable(Property::Metallicity, log_z))?;

    let band_lines: Vec<_> = grids
        .grids()
        .iter()
        .map(|grid| {
            let z_weights = match grid.resolution() {
                MetallicityResolution::Reduced => &z_weights_reduced,
                MetallicityResolution::Full => &z_weights_full,
            };
            interpolator.interp_lines(grid.values(), z_weights, &u_weights)
        })
        .collect();
    let band_views: Vec<_> = band_lines.iter().map(|lines| lines.view()).collect();

    blender.blend(log_ne, &band_views).ok_or((
        AnomalyKind::OutOfRangeDensity,
        Property::ElectronDensity,
        log_ne,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grid::{BinAxis, EmissionGrid},
        model::DensityBand,
    };
    use approx::assert_abs_diff_eq;

    fn uniform_grid_set(band_values: &[fem]) -> GridSet {
        let u_axis = BinAxis::new(vec![-4.0, -3.0]).unwrap();
        let z_axis_reduced = BinAxis::new(vec![-3.0, -2.0]).unwrap();
        let z_axis_full = BinAxis::new(vec![-3.0, -2.5, -2.0]).unwrap();
        let grids = band_values
            .iter()
            .enumerate()
            .map(|(idx, &value)| {
                let resolution = if idx == 0 || idx == band_values.len() - 1 {
                    MetallicityResolution::Reduced
                } else {
                    MetallicityResolution::Full
                };
                let n_z = if resolution == MetallicityResolution::Reduced {
                    2
                } else {
                    3
                };
                EmissionGrid::new(
                    DensityBand::new(fem::powi(10.0, idx as i32 + 1), resolution),
                    Array3::from_elem((n_z, 2, 3), value),
                )
            })
            .collect();
        GridSet::new(grids, u_axis, z_axis_reduced, z_axis_full).unwrap()
    }

    #[test]
    fn galaxy_lines_blend_uniform_bands() {
        let grids = uniform_grid_set(&[1.0, 2.0, 3.0, 4.0]);
        let blender = DensityBlender::new(grids.log_density_edges()).unwrap();
        let lines =
            compute_galaxy_lines(&BilinearInterpolator, &grids, &blender, -3.5, -2.2, 2.5).unwrap();
        for &line in lines.iter() {
            assert_abs_diff_eq!(line, 2.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn nan_properties_become_anomalies() {
        let grids = uniform_grid_set(&[1.0, 2.0, 3.0, 4.0]);
        let blender = DensityBlender::new(grids.log_density_edges()).unwrap();
        let err = compute_galaxy_lines(
            &BilinearInterpolator,
            &grids,
            &blender,
            -3.5,
            -2.2,
            fem::NAN,
        )
        .unwrap_err();
        assert_eq!(err.0, AnomalyKind::OutOfRangeDensity);

        let err = compute_galaxy_lines(
            &BilinearInterpolator,
            &grids,
            &blender,
            fem::NAN,
            -2.2,
            2.0,
        )
        .unwrap_err();
        assert_eq!(err.0, AnomalyKind::UnbinnableValue);
        assert_eq!(err.1, Property::IonizationParameter);
    }

    #[test]
    fn component_lines_are_zero_filled_for_anomalies() {
        let grids = uniform_grid_set(&[1.0, 2.0, 3.0, 4.0]);
        let blender = DensityBlender::new(grids.log_density_edges()).unwrap();
        let properties = ComponentProperties::new(
            array![-3.5, -3.5, -3.5],
            array![0.0, fem::NAN, 5.0],
            array![-2.2, -2.2, -2.2],
        )
        .unwrap();
        for parallel in [false, true] {
            let (lines, anomalies) = compute_component_lines(
                &BilinearInterpolator,
                &grids,
                &blender,
                Component::Bulge,
                &properties,
                parallel,
            );
            assert_eq!(lines.shape(), &[3, 3]);
            assert_eq!(lines.column(0), array![1.0, 1.0, 1.0]);
            assert_eq!(lines.column(1), array![0.0, 0.0, 0.0]);
            assert_eq!(lines.column(2), array![4.0, 4.0, 4.0]);
            assert_eq!(anomalies.len(), 1);
            assert_eq!(anomalies[0].galaxy_idx, 1);
            assert_eq!(anomalies[0].component, Component::Bulge);
        }
    }

    #[cfg(feature = "for-testing")]
    #[test]
    fn emission_lines_compare_approximately() {
        let lines = EmissionLines {
            model: "gutkin16".to_string(),
            disk: array![[1.0, 2.0]],
            bulge: array![[3.0, 4.0]],
            anomalies: Vec::new(),
        };
        let mut perturbed = lines.clone();
        perturbed.disk[[0, 1]] += 1e-12;
        assert_ne!(lines, perturbed);
        approx::assert_relative_eq!(lines, perturbed, max_relative = 1e-9);
        approx::assert_abs_diff_eq!(lines, perturbed, epsilon = 1e-9);

        perturbed.bulge[[0, 0]] += 1.0;
        assert!(!approx::relative_eq!(lines, perturbed, max_relative = 1e-9));
    }

    #[test]
    fn anomalies_describe_offending_value() {
        let anomaly = Anomaly {
            kind: AnomalyKind::OutOfRangeDensity,
            component: Component::Disk,
            galaxy_idx: 7,
            property: Property::ElectronDensity,
            value: fem::NAN,
        };
        assert_eq!(
            anomaly.to_string(),
            "log(ne) of disk of galaxy 7 out of limits: NaN"
        );
    }
}
