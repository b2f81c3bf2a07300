//! Nebular emission model of Gutkin, Charlot & Bruzual (2016).
//!
//! Tables list, for each metallicity, rows of
//! `logU xid nH co imf_cut L_1 ... L_18`, with line luminosities in units of
//! 3.826e33 erg/s per unit star formation rate [Msun/yr] after 1e8 yr.

use super::{
    DensityBand, GridRow, GridRowParser, LimitLabel, LimitScale, MetallicityResolution,
    ModelSpec, PropertyLabels, RowSelection,
};
use crate::constants::fem;
use std::{path::Path, sync::Arc};

/// Name the model is registered under.
pub const NAME: &str = "gutkin16";

/// Directory under the data directory holding the limits file and the grid tables.
pub const TABLE_DIR: &str = "gutkin_tables";

/// Labels of the tabulated metallicities, as used in the table file names.
pub const METALLICITY_LABELS: [&str; 14] = [
    "0001", "0002", "0005", "001", "002", "004", "006", "008", "010", "014", "017", "020", "030",
    "040",
];

/// Indices of the metallicities tabulated at the lowest and highest density.
pub const REDUCED_METALLICITY_INDICES: [usize; 4] = [0, 4, 9, 12];

/// Tabulated log10 ionization parameters.
pub const U_BINS: [fem; 7] = [-4.0, -3.5, -3.0, -2.5, -2.0, -1.5, -1.0];

/// Number of emission lines per row.
pub const N_LINES: usize = 18;

/// Number of leading parameter columns preceding the line luminosities.
const N_PARAMETER_COLUMNS: usize = 5;

/// Tabulated hydrogen densities [cm^-3].
pub const DENSITIES: [fem; 4] = [10.0, 100.0, 1000.0, 10000.0];

/// Dust-to-metal mass ratio of the rows used.
pub const SELECTED_XID: fem = 0.3;
/// C/O ratio (relative to solar) of the rows used.
pub const SELECTED_CO: fem = 1.0;
/// IMF upper mass cutoff [Msun] of the rows used.
pub const SELECTED_IMF_CUT: fem = 100.0;

/// Metallicity mass fraction corresponding to a table label, e.g. `014` -> 0.014.
fn metallicity_from_label(label: &str) -> fem {
    format!("0.{}", label)
        .parse()
        .expect("Metallicity label is not numeric")
}

/// Creates the specification of the model with tables under the given data directory.
pub fn model_spec<P: AsRef<Path>>(data_dir: P) -> ModelSpec {
    let table_dir = data_dir.as_ref().join(TABLE_DIR);
    ModelSpec {
        name: NAME.to_string(),
        limits_path: table_dir.join("limits_gutkin.txt"),
        grid_dir: table_dir,
        grid_file_prefix: "nebular_emission_Z".to_string(),
        grid_file_extension: "txt".to_string(),
        metallicity_labels: METALLICITY_LABELS.iter().map(|s| s.to_string()).collect(),
        metallicities: METALLICITY_LABELS
            .iter()
            .map(|label| metallicity_from_label(label))
            .collect(),
        reduced_metallicity_indices: REDUCED_METALLICITY_INDICES.to_vec(),
        u_bins: U_BINS.to_vec(),
        n_lines: N_LINES,
        density_bands: DENSITIES
            .iter()
            .enumerate()
            .map(|(idx, &n_h)| {
                // Only the outermost densities are tabulated at a subset of the metallicities
                let resolution = if idx == 0 || idx == DENSITIES.len() - 1 {
                    MetallicityResolution::Reduced
                } else {
                    MetallicityResolution::Full
                };
                DensityBand::new(n_h, resolution)
            })
            .collect(),
        selection: RowSelection {
            xid: SELECTED_XID,
            co: SELECTED_CO,
            imf_cut: SELECTED_IMF_CUT,
        },
        limit_labels: PropertyLabels {
            ionization_parameter: LimitLabel::new("U", LimitScale::Log10),
            metallicity: LimitLabel::new("Z", LimitScale::Linear),
            electron_density: LimitLabel::new("nH", LimitScale::Log10),
        },
        row_parser: Arc::new(GutkinRowParser),
    }
}

/// Parser for rows of the Gutkin et al. (2016) tables.
#[derive(Clone, Copy, Debug)]
pub struct GutkinRowParser;

impl GridRowParser for GutkinRowParser {
    fn parse_row(&self, fields: &[&str]) -> Result<GridRow, String> {
        let required = N_PARAMETER_COLUMNS + N_LINES;
        if fields.len() < required {
            return Err(format!(
                "Expected at least {} columns, found {}",
                required,
                fields.len()
            ));
        }
        let values = fields[..required]
            .iter()
            .map(|field| {
                field
                    .parse::<fem>()
                    .map_err(|err| format!("Failed parsing `{}`: {}", field, err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GridRow {
            log_u: values[0],
            xid: values[1],
            n_h: values[2],
            co: values[3],
            imf_cut: values[4],
            lines: values[N_PARAMETER_COLUMNS..].to_vec(),
        })
    }
}
