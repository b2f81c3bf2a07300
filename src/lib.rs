//! The `nebular` crate estimates nebular emission-line luminosities for the disk and
//! bulge components of simulated galaxies by interpolating photoionization model grids.

pub mod blend;
pub mod clamp;
pub mod constants;
pub mod error;
pub mod galaxy;
pub mod grid;
pub mod interpolation;
pub mod io;
pub mod limits;
pub mod model;
pub mod pipeline;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(not(feature = "for-testing"))]
#[macro_export]
macro_rules! exit_with_error {
    ($($print_arg:tt)*) => {{
        eprintln!($($print_arg)*);
        quit::with_code(1);
    }};
}

#[cfg(feature = "for-testing")]
#[macro_export]
macro_rules! exit_with_error {
    ($($print_arg:tt)*) => {{
        panic!($($print_arg)*);
    }};
}

#[macro_export]
macro_rules! exit_on_error {
    ($result:expr, $($print_arg:tt)*) => {
        match $result {
            Ok(value) => value,
            Err(err) => {
                $crate::exit_with_error!($($print_arg)*, err)
            }
        }
    };
}

#[macro_export]
macro_rules! exit_on_false {
    ($logic:expr, $($print_arg:tt)*) => {
        if $logic {
            true
        } else {
            $crate::exit_with_error!($($print_arg)*)
        }
    };
}
