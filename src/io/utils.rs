//! Utilities for input/output.

use crate::error::{NebularError, Result};
use std::{
    fs,
    io::{self, Read},
    path::Path,
};

/// Wraps an I/O error together with the path it concerns.
pub fn map_io_err<P: AsRef<Path>>(path: P) -> impl FnOnce(io::Error) -> NebularError {
    let path = path.as_ref().to_path_buf();
    move |source| NebularError::Io { path, source }
}

/// Opens the specified file for reading.
pub fn open_file_and_map_err<P: AsRef<Path>>(file_path: P) -> Result<fs::File> {
    let file_path = file_path.as_ref();
    fs::File::open(file_path).map_err(map_io_err(file_path))
}

/// Reads and returns the content of the specified text file.
pub fn read_text_file<P: AsRef<Path>>(file_path: P) -> Result<String> {
    let file_path = file_path.as_ref();
    let file = open_file_and_map_err(file_path)?;
    let mut text = String::new();
    let _ = io::BufReader::new(file)
        .read_to_string(&mut text)
        .map_err(map_io_err(file_path))?;
    Ok(text)
}

/// Creates the specified file for writing, refusing to replace an existing file
/// unless overwriting is allowed.
pub fn create_file_and_map_err<P: AsRef<Path>>(
    file_path: P,
    overwrite: super::OverwriteMode,
) -> Result<fs::File> {
    let file_path = file_path.as_ref();
    if overwrite == super::OverwriteMode::Never && file_path.exists() {
        return Err(map_io_err(file_path)(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "File exists and overwriting is disabled",
        )));
    }
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(map_io_err(parent))?;
        }
    }
    fs::File::create(file_path).map_err(map_io_err(file_path))
}

/// Returns the non-empty lines of a text that do not start with the given
/// comment character, along with their one-based line numbers.
pub fn data_lines(text: &str, comment_char: char) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(move |(_, line)| !line.is_empty() && !line.starts_with(comment_char))
}
