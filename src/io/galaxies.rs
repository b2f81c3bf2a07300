//! Reading of galaxy property tables.
//!
//! A table holds one galaxy per row with the whitespace separated columns
//!
//! `logU_disk logU_bulge logne_disk logne_bulge loh12_disk loh12_bulge`
//!
//! where `logU` is log10 of the ionization parameter, `logne` log10 of the
//! electron density [cm^-3] and `loh12` the oxygen abundance 12 + log10(O/H).
//! Lines starting with `#` are ignored.

use super::utils as io_utils;
use crate::{
    constants::fem,
    error::{NebularError, Result},
    galaxy::{ComponentProperties, GalaxyProperties},
};
use ndarray::prelude::*;
use std::path::Path;

/// Names of the columns of a galaxy property table.
pub const COLUMNS: [&str; 6] = [
    "logU_disk",
    "logU_bulge",
    "logne_disk",
    "logne_bulge",
    "loh12_disk",
    "loh12_bulge",
];

/// Reads the galaxy properties in the given table file.
pub fn read_galaxy_properties<P: AsRef<Path>>(file_path: P) -> Result<GalaxyProperties> {
    let file_path = file_path.as_ref();
    let text = io_utils::read_text_file(file_path)?;
    parse_galaxy_properties(&text, file_path)
}

/// Parses the content of a galaxy property table.
pub fn parse_galaxy_properties<P: AsRef<Path>>(
    text: &str,
    file_path: P,
) -> Result<GalaxyProperties> {
    let file_path = file_path.as_ref();
    let mut columns: [Vec<fem>; 6] = Default::default();

    for (line_number, line) in io_utils::data_lines(text, '#') {
        let fields: Vec<_> = line.split_whitespace().collect();
        if fields.len() != COLUMNS.len() {
            return Err(NebularError::inconsistent_input(format!(
                "Line {} of {} has {} columns, expected {}",
                line_number,
                file_path.display(),
                fields.len(),
                COLUMNS.len()
            )));
        }
        for ((column, field), name) in columns.iter_mut().zip(fields).zip(COLUMNS) {
            let value = field.parse().map_err(|err| {
                NebularError::inconsistent_input(format!(
                    "Failed parsing {} `{}` at line {} of {}: {}",
                    name,
                    field,
                    line_number,
                    file_path.display(),
                    err
                ))
            })?;
            column.push(value);
        }
    }

    let [log_u_disk, log_u_bulge, log_ne_disk, log_ne_bulge, oh_disk, oh_bulge] =
        columns.map(Array1::from_vec);

    GalaxyProperties::new(
        ComponentProperties::from_oxygen_abundance(log_u_disk, log_ne_disk, oh_disk)?,
        ComponentProperties::from_oxygen_abundance(log_u_bulge, log_ne_bulge, oh_bulge)?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::oxygen_abundance_to_log_metallicity, galaxy::Component};

    #[test]
    fn table_parsing_works() {
        let text = "\
# logU_disk logU_bulge logne_disk logne_bulge loh12_disk loh12_bulge
-3.0 -2.5 1.5 2.5 8.5 8.9
-3.5 -1.5 nan 3.5 8.0 9.1
";
        let properties = parse_galaxy_properties(text, "galaxies.txt").unwrap();
        assert_eq!(properties.n_galaxies(), 2);

        let disk = properties.component(Component::Disk);
        assert_eq!(disk.log_u(), &array![-3.0, -3.5]);
        assert_eq!(disk.log_ne()[0], 1.5);
        assert!(disk.log_ne()[1].is_nan());
        assert_eq!(disk.log_z()[1], oxygen_abundance_to_log_metallicity(8.0));

        let bulge = properties.component(Component::Bulge);
        assert_eq!(bulge.log_u(), &array![-2.5, -1.5]);
        assert_eq!(bulge.log_ne(), &array![2.5, 3.5]);
    }

    #[test]
    fn wrong_column_count_is_rejected() {
        let result = parse_galaxy_properties("-3.0 -2.5 1.5 2.5 8.5\n", "galaxies.txt");
        assert!(matches!(result, Err(NebularError::InconsistentInput { .. })));
    }

    #[test]
    fn unparsable_values_are_rejected() {
        let result = parse_galaxy_properties("-3.0 -2.5 1.5 2.5 8.5 high\n", "galaxies.txt");
        match result {
            Err(NebularError::InconsistentInput { message }) => {
                assert!(message.contains("loh12_bulge"))
            }
            other => panic!("Unexpected result {:?}", other),
        }
    }
}
