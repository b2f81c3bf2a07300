//! Writing of emission-line datasets.

use super::{utils as io_utils, OutputFormat, OverwriteMode};
use crate::{
    constants::{fem, LINE_LUMINOSITY_UNIT},
    error::Result,
    galaxy::Component,
    pipeline::EmissionLines,
};
use ndarray::prelude::*;
use std::{
    io::{self, BufWriter, Write},
    path::Path,
};

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Label of the disk emission-line array.
pub const DISK_LABEL: &str = "disk emission lines";
/// Label of the bulge emission-line array.
pub const BULGE_LABEL: &str = "bulge emission lines";

/// An emission-line array of shape [number of lines, number of galaxies]
/// with its label and units.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct LabeledLines<'a> {
    pub label: &'static str,
    pub units: &'static str,
    pub values: &'a Array2<fem>,
}

/// The output dataset handed over for storage.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct EmissionLineOutput<'a> {
    pub model: &'a str,
    pub disk: LabeledLines<'a>,
    pub bulge: LabeledLines<'a>,
}

impl<'a> EmissionLineOutput<'a> {
    pub fn new(lines: &'a EmissionLines) -> Self {
        let labeled = |component, label| LabeledLines {
            label,
            units: LINE_LUMINOSITY_UNIT,
            values: lines.lines(component),
        };
        Self {
            model: lines.model(),
            disk: labeled(Component::Disk, DISK_LABEL),
            bulge: labeled(Component::Bulge, BULGE_LABEL),
        }
    }
}

/// Writes the dataset as a text table with one row per galaxy, holding the
/// disk lines followed by the bulge lines.
pub fn write_output_as_text<W: Write>(
    output: &EmissionLineOutput,
    writer: &mut W,
) -> io::Result<()> {
    let n_lines = output.disk.values.nrows();
    writeln!(writer, "# Nebular emission lines of model {}", output.model)?;
    writeln!(writer, "# Units: {}", LINE_LUMINOSITY_UNIT)?;
    writeln!(
        writer,
        "# Columns 1-{}: {}, columns {}-{}: {}",
        n_lines,
        output.disk.label,
        n_lines + 1,
        2 * n_lines,
        output.bulge.label
    )?;
    for (disk, bulge) in output
        .disk
        .values
        .columns()
        .into_iter()
        .zip(output.bulge.values.columns())
    {
        let row: Vec<_> = disk
            .iter()
            .chain(bulge.iter())
            .map(|value| format!("{:e}", value))
            .collect();
        writeln!(writer, "{}", row.join(" "))?;
    }
    Ok(())
}

/// Serializes the dataset into protocol 3 pickle format and writes it.
#[cfg(feature = "pickle")]
pub fn write_output_as_pickle<W: Write>(
    output: &EmissionLineOutput,
    writer: &mut W,
) -> io::Result<()> {
    match serde_pickle::to_writer(writer, output, serde_pickle::SerOptions::new()) {
        Ok(_) => Ok(()),
        Err(serde_pickle::Error::Io(err)) => Err(err),
        Err(err) => Err(io::Error::new(
            io::ErrorKind::Other,
            format!("Unexpected error while serializing data to pickle: {}", err),
        )),
    }
}

/// Serializes the dataset into JSON format and writes it.
#[cfg(feature = "json")]
pub fn write_output_as_json<W: Write>(
    output: &EmissionLineOutput,
    writer: &mut W,
) -> io::Result<()> {
    serde_json::to_writer(writer, output).map_err(io::Error::from)
}

/// Saves the dataset at the given path in the given format.
pub fn save_output<P: AsRef<Path>>(
    file_path: P,
    format: OutputFormat,
    overwrite: OverwriteMode,
    output: &EmissionLineOutput,
) -> Result<()> {
    let file_path = file_path.as_ref();
    let file = io_utils::create_file_and_map_err(file_path, overwrite)?;
    let mut writer = BufWriter::new(file);
    match format {
        OutputFormat::Text => write_output_as_text(output, &mut writer),
        #[cfg(feature = "json")]
        OutputFormat::Json => write_output_as_json(output, &mut writer),
        #[cfg(feature = "pickle")]
        OutputFormat::Pickle => write_output_as_pickle(output, &mut writer),
    }
    .and_then(|_| writer.flush())
    .map_err(io_utils::map_io_err(file_path))
}
