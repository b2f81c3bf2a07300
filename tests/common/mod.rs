#![allow(dead_code)]

use nebular::{
    cli,
    constants::fem,
    model::gutkin16::{self, DENSITIES, METALLICITY_LABELS, N_LINES, U_BINS},
};
use std::{
    ffi::OsString,
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

pub const LIMITS_TEXT: &str = "\
# Property      Lower_limit     Upper_limit
Z               0.0001          0.040
U               -4.0            -1.0
xid             0.1             0.5
nH              1               4
";

/// Value of an emission line in the synthetic tables.
///
/// The values are linear in log U, log Z and log nH, so interpolation and
/// density blending reproduce them exactly anywhere inside the tabulated ranges.
pub fn expected_line(line_idx: usize, log_u: fem, log_z: fem, log_ne: fem) -> fem {
    (line_idx + 1) as fem * (10.0 + log_u + 2.0 * log_z + 3.0 * log_ne)
}

pub fn run<I, T>(args: I)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    cli::run::run_with_args(cli::build::build().get_matches_from(args));
}

/// A temporary data directory holding synthetic tables in the Gutkin et al. (2016) layout.
#[derive(Debug)]
pub struct SyntheticData {
    dir: TempDir,
}

impl SyntheticData {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Could not create temporary directory");
        let data = Self { dir };
        fs::create_dir_all(data.table_dir()).expect("Could not create table directory");
        fs::write(data.table_dir().join("limits_gutkin.txt"), LIMITS_TEXT)
            .expect("Could not write limits file");
        for label in METALLICITY_LABELS {
            fs::write(data.grid_path(label), grid_table_text(label))
                .expect("Could not write grid table");
        }
        data
    }

    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn table_dir(&self) -> PathBuf {
        self.data_dir().join(gutkin16::TABLE_DIR)
    }

    pub fn grid_path(&self, label: &str) -> PathBuf {
        self.table_dir()
            .join(format!("nebular_emission_Z{:0<3}.txt", label))
    }

    pub fn append_to_grid(&self, label: &str, text: &str) {
        let path = self.grid_path(label);
        let mut content = fs::read_to_string(&path).expect("Could not read grid table");
        content.push_str(text);
        fs::write(path, content).expect("Could not write grid table");
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.data_dir().join(file_name)
    }
}

/// Formats a table row with the given parameter columns and emission lines.
pub fn grid_row(log_u: fem, xid: fem, n_h: fem, co: fem, imf_cut: fem, lines: &[fem]) -> String {
    let mut row = format!("{} {} {} {} {}", log_u, xid, n_h, co, imf_cut);
    for line in lines {
        write!(row, " {:e}", line).unwrap();
    }
    row.push('\n');
    row
}

fn grid_table_text(label: &str) -> String {
    let log_z = format!("0.{}", label).parse::<fem>().unwrap().log10();
    let mut text = String::from("# logU xid nh (C/O)/(C/O)sol mup lines...\n");
    for &log_u in &U_BINS {
        for &n_h in &DENSITIES {
            let lines: Vec<_> = (0..N_LINES)
                .map(|k| expected_line(k, log_u, log_z, n_h.log10()))
                .collect();
            text.push_str(&grid_row(log_u, 0.3, n_h, 1.0, 100.0, &lines));
            // Rows with other parameters must be ignored
            text.push_str(&grid_row(log_u, 0.1, n_h, 1.0, 100.0, &[999.0; N_LINES]));
            text.push_str(&grid_row(log_u, 0.3, n_h, 0.52, 300.0, &[999.0; N_LINES]));
        }
        text.push_str(&grid_row(log_u, 0.3, 500.0, 1.0, 100.0, &[999.0; N_LINES]));
    }
    text
}

pub fn write_galaxy_table<P: AsRef<Path>>(file_path: P, rows: &[[fem; 6]]) {
    let mut text =
        String::from("# logU_disk logU_bulge logne_disk logne_bulge loh12_disk loh12_bulge\n");
    for row in rows {
        let fields: Vec<_> = row.iter().map(|value| value.to_string()).collect();
        text.push_str(&fields.join(" "));
        text.push('\n');
    }
    fs::write(file_path, text).expect("Could not write galaxy table");
}
