//! Input and output of galaxy properties and emission-line datasets.

pub mod galaxies;
pub mod output;
pub mod utils;

use std::{fmt, str::FromStr};

/// Whether existing files may be replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverwriteMode {
    Always,
    Never,
}

/// File formats the emission-line dataset can be written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    #[cfg(feature = "json")]
    Json,
    #[cfg(feature = "pickle")]
    Pickle,
}

impl OutputFormat {
    /// Names of the formats available with the enabled features.
    pub fn names() -> Vec<&'static str> {
        #[allow(unused_mut)]
        let mut names = vec!["text"];
        #[cfg(feature = "json")]
        names.push("json");
        #[cfg(feature = "pickle")]
        names.push("pickle");
        names
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            #[cfg(feature = "json")]
            "json" => Ok(Self::Json),
            #[cfg(feature = "pickle")]
            "pickle" => Ok(Self::Pickle),
            _ => Err(format!(
                "Unsupported output format `{}` (available: {})",
                s,
                Self::names().join(", ")
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            #[cfg(feature = "json")]
            Self::Json => "json",
            #[cfg(feature = "pickle")]
            Self::Pickle => "pickle",
        })
    }
}
