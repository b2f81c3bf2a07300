//! Function for building the command line interface.

use crate::{io::OutputFormat, model::gutkin16};
use clap::{
    builder::{PossibleValuesParser, TypedValueParser},
    value_parser, Arg, ArgAction, Command,
};
use std::path::PathBuf;

/// Directory holding the model tables when no other is specified.
pub const DEFAULT_DATA_DIR: &str = "nebular_data";

/// Build the `nebular` command line interface.
pub fn build() -> Command {
    Command::new(clap::crate_name!())
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .after_help(
            "You can use the RUST_LOG environment variable to control which \
             diagnostics are printed.",
        )
        .arg(
            Arg::new("input-file")
                .value_name("INPUT_FILE")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help(
                    "Path to the table of galaxy properties, with columns\n\
                     logU_disk logU_bulge logne_disk logne_bulge loh12_disk loh12_bulge",
                ),
        )
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_DATA_DIR)
                .help("Directory containing the photoionization model tables"),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("NAME")
                .default_value(gutkin16::NAME)
                .help("Photoionization model to interpolate"),
        )
        .arg(
            Arg::new("output-file")
                .short('o')
                .long("output")
                .value_name("OUTPUT_FILE")
                .value_parser(value_parser!(PathBuf))
                .help(
                    "Path where the emission lines should be written [default: print to stdout]",
                ),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .value_parser(
                    PossibleValuesParser::new(OutputFormat::names())
                        .try_map(|name| name.parse::<OutputFormat>()),
                )
                .default_value("text")
                .help("Format of the output file"),
        )
        .arg(
            Arg::new("skip-unmatched-u-bins")
                .long("skip-unmatched-u-bins")
                .action(ArgAction::SetTrue)
                .help(
                    "Skip grid rows whose ionization parameter matches no U bin \
                     instead of failing",
                ),
        )
        .arg(
            Arg::new("serial")
                .long("serial")
                .action(ArgAction::SetTrue)
                .help("Process galaxies serially rather than in parallel"),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .action(ArgAction::SetTrue)
                .help("Automatically overwrite any existing output file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Print status messages while computing"),
        )
        .arg(
            Arg::new("timing")
                .short('t')
                .long("timing")
                .action(ArgAction::SetTrue)
                .help("Display elapsed time when done"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_consistent() {
        build().debug_assert();
    }

    #[test]
    fn defaults_are_applied() {
        let arguments = build().get_matches_from(["nebular", "galaxies.txt"]);
        assert_eq!(
            arguments.get_one::<PathBuf>("data-dir").unwrap(),
            &PathBuf::from(DEFAULT_DATA_DIR)
        );
        assert_eq!(arguments.get_one::<String>("model").unwrap(), gutkin16::NAME);
        assert_eq!(
            arguments.get_one::<OutputFormat>("format").unwrap(),
            &OutputFormat::Text
        );
        assert!(!arguments.get_flag("serial"));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(build()
            .try_get_matches_from(["nebular", "galaxies.txt", "--format=hdf5"])
            .is_err());
    }
}
