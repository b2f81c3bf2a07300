//! Functions for running the command line program.

use super::build;
use crate::{
    exit_on_error, exit_on_false,
    grid::UBinMismatchPolicy,
    io::{
        galaxies::read_galaxy_properties,
        output::{self, EmissionLineOutput},
        OutputFormat, OverwriteMode,
    },
    model::ModelRegistry,
    pipeline::{NebularContext, PipelineConfig},
};
use clap::ArgMatches;
use log::info;
use std::{io, path::PathBuf, time::Instant};

/// Runs the `nebular` command line program.
pub fn run() {
    run_with_args(build::build().get_matches());
}

/// Runs the `nebular` command line program with the given parsed arguments.
pub fn run_with_args(arguments: ArgMatches) {
    init_logging(arguments.get_flag("verbose"));

    let start_instant = Instant::now();

    let input_file_path = arguments
        .get_one::<PathBuf>("input-file")
        .expect("No value for required argument");
    let data_dir = arguments
        .get_one::<PathBuf>("data-dir")
        .expect("No value for argument with default");
    let model = arguments
        .get_one::<String>("model")
        .expect("No value for argument with default");
    let format = *arguments
        .get_one::<OutputFormat>("format")
        .expect("No value for argument with default");
    let output_file_path = arguments.get_one::<PathBuf>("output-file");

    let overwrite = if arguments.get_flag("overwrite") {
        OverwriteMode::Always
    } else {
        OverwriteMode::Never
    };

    let config = PipelineConfig {
        u_bin_mismatch: if arguments.get_flag("skip-unmatched-u-bins") {
            UBinMismatchPolicy::Skip
        } else {
            UBinMismatchPolicy::Fail
        },
        parallel: !arguments.get_flag("serial"),
    };

    if output_file_path.is_none() {
        exit_on_false!(
            format == OutputFormat::Text,
            "Error: Output format {} requires an output file",
            format
        );
    }

    let mut properties = exit_on_error!(
        read_galaxy_properties(input_file_path),
        "Error: Could not read galaxy properties from {}: {}",
        input_file_path.display()
    );
    info!(
        "Read properties of {} galaxies from {}",
        properties.n_galaxies(),
        input_file_path.display()
    );

    let mut context = NebularContext::new(ModelRegistry::with_builtin_models(data_dir), config);
    let lines = exit_on_error!(
        context.compute_emission_lines(model, &mut properties),
        "Error: Could not compute emission lines: {}"
    );
    if !lines.anomalies().is_empty() {
        eprintln!(
            "Warning: Emission lines of {} galaxy components were set to zero",
            lines.anomalies().len()
        );
    }

    let output = EmissionLineOutput::new(&lines);
    match output_file_path {
        Some(output_file_path) => {
            exit_on_error!(
                output::save_output(output_file_path, format, overwrite, &output),
                "Error: Could not save emission lines: {}"
            );
            info!("Saved emission lines to {}", output_file_path.display());
        }
        None => {
            exit_on_error!(
                output::write_output_as_text(&output, &mut io::stdout().lock()),
                "Error: Could not print emission lines: {}"
            );
        }
    }

    if arguments.get_flag("timing") {
        eprintln!("Elapsed time: {} s", start_instant.elapsed().as_secs_f64());
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    // A logger may already be installed when running repeatedly in one process
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    )
    .try_init();
}
