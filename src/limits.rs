//! Validity limits of the physical properties of a photoionization model.

use crate::{
    constants::fem,
    error::{NebularError, Result},
    io::utils as io_utils,
    model::{LimitScale, ModelRegistry, ModelSpec, Property},
};
use log::info;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Range of valid values of a property.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropertyLimits {
    pub property: Property,
    pub lower: fem,
    pub upper: fem,
    pub scale: LimitScale,
}

impl PropertyLimits {
    /// Creates new limits, making sure the lower limit does not exceed the upper one.
    pub fn new(property: Property, lower: fem, upper: fem, scale: LimitScale) -> Result<Self> {
        if lower <= upper {
            Ok(Self {
                property,
                lower,
                upper,
                scale,
            })
        } else {
            Err(NebularError::InvalidLimits {
                property: property.name().to_string(),
                lower,
                upper,
            })
        }
    }

    /// Returns the lower and upper limit as tabulated.
    pub fn bounds(&self) -> (fem, fem) {
        (self.lower, self.upper)
    }

    /// Returns the lower and upper limit in log10 space.
    pub fn on_log_scale(&self) -> (fem, fem) {
        match self.scale {
            LimitScale::Log10 => (self.lower, self.upper),
            LimitScale::Linear => (fem::log10(self.lower), fem::log10(self.upper)),
        }
    }
}

/// Rows of a limits file, each holding a label with a lower and upper limit.
#[derive(Clone, Debug)]
pub struct LimitsTable {
    path: PathBuf,
    rows: Vec<(String, fem, fem)>,
}

impl LimitsTable {
    /// Reads the limits file of the given model.
    pub fn from_model(spec: &ModelSpec) -> Result<Self> {
        let path = &spec.limits_path;
        if !path.is_file() {
            return Err(NebularError::MissingLimitsFile {
                model: spec.name.clone(),
                path: path.clone(),
            });
        }
        let text = io_utils::read_text_file(path)?;
        Self::parse(&text, path)
    }

    /// Parses the content of a limits file.
    ///
    /// Empty lines and lines starting with `#` are skipped. Every other line has to
    /// start with a label followed by the lower and upper limit.
    pub fn parse<P: AsRef<Path>>(text: &str, path: P) -> Result<Self> {
        let path = path.as_ref();
        let malformed = |line: usize, message: String| NebularError::MalformedLimits {
            path: path.to_path_buf(),
            line,
            message,
        };

        let mut rows = Vec::new();
        for (line_number, line) in io_utils::data_lines(text, '#') {
            let fields: Vec<_> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(malformed(
                    line_number,
                    format!("Expected 3 columns, found {}", fields.len()),
                ));
            }
            let mut limits = [0.0; 2];
            for (limit, field) in limits.iter_mut().zip(&fields[1..3]) {
                *limit = field.parse().map_err(|err| {
                    malformed(line_number, format!("Failed parsing `{}`: {}", field, err))
                })?;
            }
            rows.push((fields[0].to_string(), limits[0], limits[1]));
        }
        Ok(Self {
            path: path.to_path_buf(),
            rows,
        })
    }

    /// Returns the path of the parsed file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Finds the limits of the first row with the given label.
    pub fn find(&self, label: &str) -> Option<(fem, fem)> {
        self.rows
            .iter()
            .find(|(row_label, _, _)| row_label == label)
            .map(|&(_, lower, upper)| (lower, upper))
    }
}

/// Lazily loaded limits tables, cached per model.
#[derive(Clone, Debug, Default)]
pub struct LimitsRegistry {
    tables: HashMap<String, LimitsTable>,
}

impl LimitsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the limits table of the given model, reading it on first use.
    pub fn table(&mut self, spec: &ModelSpec) -> Result<&LimitsTable> {
        if !self.tables.contains_key(&spec.name) {
            let table = LimitsTable::from_model(spec)?;
            info!(
                "Read limits of model {} from {}",
                spec.name,
                table.path().display()
            );
            self.tables.insert(spec.name.clone(), table);
        }
        Ok(&self.tables[&spec.name])
    }

    /// Returns the validity limits of a property for the given model.
    pub fn limits(&mut self, spec: &ModelSpec, property: Property) -> Result<PropertyLimits> {
        let label = spec.limit_labels.get(property);
        let (lower, upper) =
            self.table(spec)?
                .find(&label.label)
                .ok_or_else(|| NebularError::UnknownProperty {
                    property: property.name().to_string(),
                    model: spec.name.clone(),
                })?;
        PropertyLimits::new(property, lower, upper, label.scale)
    }

    /// Returns the tabulated lower and upper limit of the property with the given
    /// name (`U`, `Z` or `ne`) for the model with the given name.
    pub fn get_limits(
        &mut self,
        models: &ModelRegistry,
        property_name: &str,
        model: &str,
    ) -> Result<(fem, fem)> {
        let spec = models.get(model)?;
        let property: Property =
            property_name
                .parse()
                .map_err(|_| NebularError::UnknownProperty {
                    property: property_name.to_string(),
                    model: model.to_string(),
                })?;
        Ok(self.limits(spec, property)?.bounds())
    }
}
