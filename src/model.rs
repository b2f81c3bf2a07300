//! Registry of photoionization models.
//!
//! A model is fully described by a [`ModelSpec`]: where its limits and grid tables
//! live, the constants defining its grid axes, which table rows to use and how
//! to parse them. The interpolation and density blending stages only consume
//! the grids built from a spec, so adding a model means adding a spec and a row
//! parser.

pub mod gutkin16;

use crate::{
    constants::fem,
    error::{NebularError, Result},
};
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

/// Physical properties constrained by the validity limits of a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    IonizationParameter,
    Metallicity,
    ElectronDensity,
}

impl Property {
    pub const ALL: [Property; 3] = [
        Property::IonizationParameter,
        Property::Metallicity,
        Property::ElectronDensity,
    ];

    /// Returns the canonical short name of the property.
    pub fn name(&self) -> &'static str {
        match self {
            Property::IonizationParameter => "U",
            Property::Metallicity => "Z",
            Property::ElectronDensity => "ne",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Property {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|property| property.name() == s)
            .ok_or_else(|| format!("Unrecognised property `{}`", s))
    }
}

/// Scale on which the limits of a property are tabulated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitScale {
    Linear,
    Log10,
}

/// Row label and scale of a property in the limits file of a model.
#[derive(Clone, Debug)]
pub struct LimitLabel {
    pub label: String,
    pub scale: LimitScale,
}

impl LimitLabel {
    pub fn new<S: Into<String>>(label: S, scale: LimitScale) -> Self {
        Self {
            label: label.into(),
            scale,
        }
    }
}

/// Limits file labels for each property.
#[derive(Clone, Debug)]
pub struct PropertyLabels {
    pub ionization_parameter: LimitLabel,
    pub metallicity: LimitLabel,
    pub electron_density: LimitLabel,
}

impl PropertyLabels {
    pub fn get(&self, property: Property) -> &LimitLabel {
        match property {
            Property::IonizationParameter => &self.ionization_parameter,
            Property::Metallicity => &self.metallicity,
            Property::ElectronDensity => &self.electron_density,
        }
    }
}

/// Resolution of the metallicity axis of an emission-line grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetallicityResolution {
    Reduced,
    Full,
}

/// An electron density at which emission lines are tabulated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensityBand {
    /// Hydrogen number density of the band [cm^-3].
    pub n_h: fem,
    /// Which metallicity axis the grid for this band uses.
    pub resolution: MetallicityResolution,
}

impl DensityBand {
    pub fn new(n_h: fem, resolution: MetallicityResolution) -> Self {
        Self { n_h, resolution }
    }

    /// Returns log10 of the band density, the edge used when blending.
    pub fn log_density(&self) -> fem {
        fem::log10(self.n_h)
    }
}

/// One parsed row of a per-metallicity grid table.
#[derive(Clone, Debug, PartialEq)]
pub struct GridRow {
    pub log_u: fem,
    pub xid: fem,
    pub n_h: fem,
    pub co: fem,
    pub imf_cut: fem,
    pub lines: Vec<fem>,
}

/// Values a grid row must carry to contribute to the grids.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowSelection {
    /// Dust-to-metal mass ratio.
    pub xid: fem,
    /// Carbon-to-oxygen abundance ratio relative to solar.
    pub co: fem,
    /// Upper mass cutoff of the stellar initial mass function [Msun].
    pub imf_cut: fem,
}

impl RowSelection {
    #[allow(clippy::float_cmp)]
    pub fn accepts(&self, row: &GridRow) -> bool {
        row.xid == self.xid && row.co == self.co && row.imf_cut == self.imf_cut
    }
}

/// Parses the whitespace separated fields of a grid table row.
pub trait GridRowParser: fmt::Debug + Send + Sync {
    /// Parses the given fields into a row, or describes why they could not be parsed.
    fn parse_row(&self, fields: &[&str]) -> std::result::Result<GridRow, String>;
}

/// Everything needed to load the grids of a photoionization model.
#[derive(Clone, Debug)]
pub struct ModelSpec {
    /// Name the model is registered under.
    pub name: String,
    /// Path of the file with the validity limits of the model.
    pub limits_path: PathBuf,
    /// Directory containing the per-metallicity grid tables.
    pub grid_dir: PathBuf,
    /// File name prefix of the grid tables, followed by the metallicity label.
    pub grid_file_prefix: String,
    /// Extension of the grid tables.
    pub grid_file_extension: String,
    /// Labels used in the grid file names, one per tabulated metallicity.
    pub metallicity_labels: Vec<String>,
    /// Tabulated metallicity mass fractions, strictly increasing.
    pub metallicities: Vec<fem>,
    /// Indices into `metallicities` of the points on the reduced axis.
    pub reduced_metallicity_indices: Vec<usize>,
    /// Tabulated log10 ionization parameters, strictly increasing.
    pub u_bins: Vec<fem>,
    /// Number of emission lines per grid row.
    pub n_lines: usize,
    /// Tabulated densities in increasing order.
    pub density_bands: Vec<DensityBand>,
    /// Rows not matching this selection are ignored.
    pub selection: RowSelection,
    /// Labels of the properties in the limits file.
    pub limit_labels: PropertyLabels,
    /// Parser for the rows of the grid tables.
    pub row_parser: Arc<dyn GridRowParser>,
}

impl ModelSpec {
    /// Returns the number of tabulated metallicities.
    pub fn n_metallicities(&self) -> usize {
        self.metallicities.len()
    }

    /// Returns the path of the grid table for the metallicity with the given index.
    ///
    /// Labels shorter than three characters are padded with trailing zeros.
    pub fn grid_file_path(&self, metallicity_idx: usize) -> PathBuf {
        let label = &self.metallicity_labels[metallicity_idx];
        self.grid_dir.join(format!(
            "{}{:0<3}.{}",
            self.grid_file_prefix, label, self.grid_file_extension
        ))
    }

    /// Returns the paths of all grid tables, in metallicity order.
    pub fn grid_file_paths(&self) -> Vec<PathBuf> {
        (0..self.n_metallicities())
            .map(|idx| self.grid_file_path(idx))
            .collect()
    }

    /// Returns the slot on the reduced metallicity axis of the metallicity with the
    /// given index, if it is part of the reduced axis.
    pub fn reduced_slot(&self, metallicity_idx: usize) -> Option<usize> {
        self.reduced_metallicity_indices
            .iter()
            .position(|&idx| idx == metallicity_idx)
    }

    /// Returns the tabulated metallicities of the reduced axis.
    ///
    /// # Panics
    ///
    /// If a reduced index is out of range, which `validate` reports as an error.
    pub fn reduced_metallicities(&self) -> Vec<fem> {
        self.reduced_metallicity_indices
            .iter()
            .map(|&idx| self.metallicities[idx])
            .collect()
    }

    /// Checks that the tabulation parameters are mutually consistent.
    ///
    /// Axis values themselves are validated when the axes are constructed.
    pub fn validate(&self) -> Result<()> {
        let inconsistent = |message: String| {
            Err(NebularError::inconsistent_input(format!(
                "Model `{}`: {}",
                self.name, message
            )))
        };
        if self.metallicity_labels.len() != self.metallicities.len() {
            return inconsistent(format!(
                "{} metallicity labels given for {} metallicities",
                self.metallicity_labels.len(),
                self.metallicities.len()
            ));
        }
        if let Some(&idx) = self
            .reduced_metallicity_indices
            .iter()
            .find(|&&idx| idx >= self.n_metallicities())
        {
            return inconsistent(format!(
                "Reduced metallicity index {} out of range for {} metallicities",
                idx,
                self.n_metallicities()
            ));
        }
        if !self
            .reduced_metallicity_indices
            .windows(2)
            .all(|pair| pair[0] < pair[1])
        {
            return inconsistent(format!(
                "Reduced metallicity indices {:?} are not strictly increasing",
                self.reduced_metallicity_indices
            ));
        }
        if self.density_bands.is_empty() {
            return inconsistent("No density bands given".to_string());
        }
        if self.n_lines == 0 {
            return inconsistent("Number of emission lines is zero".to_string());
        }
        Ok(())
    }
}

/// Maps model names to model specifications.
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelSpec>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in models, with tables located
    /// under the given data directory.
    pub fn with_builtin_models<P: AsRef<Path>>(data_dir: P) -> Self {
        let mut registry = Self::new();
        registry.register(gutkin16::model_spec(data_dir));
        registry
    }

    /// Adds a model, replacing any model registered under the same name.
    pub fn register(&mut self, spec: ModelSpec) {
        self.models.insert(spec.name.clone(), spec);
    }

    /// Looks up the model with the given name.
    pub fn get(&self, model: &str) -> Result<&ModelSpec> {
        self.models
            .get(model)
            .ok_or_else(|| NebularError::UnknownModel {
                model: model.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Returns the names of the registered models.
    pub fn names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_names_parse() {
        for property in Property::ALL {
            assert_eq!(property.name().parse::<Property>().unwrap(), property);
        }
        assert!("nH".parse::<Property>().is_err());
    }

    #[test]
    fn grid_file_labels_are_padded() {
        let mut spec = gutkin16::model_spec("data");
        spec.metallicity_labels[0] = "02".to_string();
        assert_eq!(
            spec.grid_file_path(0),
            PathBuf::from("data/gutkin_tables/nebular_emission_Z020.txt")
        );
        assert_eq!(
            spec.grid_file_path(3),
            PathBuf::from("data/gutkin_tables/nebular_emission_Z001.txt")
        );
    }

    #[test]
    fn builtin_specs_are_consistent() {
        gutkin16::model_spec("data").validate().unwrap();
    }

    #[test]
    fn inconsistent_specs_are_rejected() {
        let mut spec = gutkin16::model_spec("data");
        spec.metallicity_labels.pop();
        assert!(matches!(
            spec.validate(),
            Err(NebularError::InconsistentInput { .. })
        ));

        let mut spec = gutkin16::model_spec("data");
        spec.reduced_metallicity_indices.push(14);
        assert!(matches!(
            spec.validate(),
            Err(NebularError::InconsistentInput { .. })
        ));

        let mut spec = gutkin16::model_spec("data");
        spec.reduced_metallicity_indices = vec![4, 0];
        assert!(spec.validate().is_err());

        let mut spec = gutkin16::model_spec("data");
        spec.density_bands.clear();
        assert!(spec.validate().is_err());

        let mut spec = gutkin16::model_spec("data");
        spec.n_lines = 0;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn reduced_slots_follow_index_list() {
        let spec = gutkin16::model_spec("data");
        assert_eq!(spec.reduced_slot(0), Some(0));
        assert_eq!(spec.reduced_slot(4), Some(1));
        assert_eq!(spec.reduced_slot(9), Some(2));
        assert_eq!(spec.reduced_slot(12), Some(3));
        assert_eq!(spec.reduced_slot(5), None);
        assert_eq!(spec.reduced_metallicities(), vec![0.0001, 0.002, 0.014, 0.030]);
    }

    #[test]
    fn unknown_model_is_reported() {
        let registry = ModelRegistry::with_builtin_models("data");
        assert!(registry.get("gutkin16").is_ok());
        match registry.get("feltre16") {
            Err(NebularError::UnknownModel { model, available }) => {
                assert_eq!(model, "feltre16");
                assert_eq!(available, "gutkin16");
            }
            other => panic!("Unexpected result {:?}", other.map(|spec| &spec.name)),
        }
    }
}
