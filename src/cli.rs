//! Defines command-line interface options using `clap` for the climfix application.

use crate::config::NormalizeConfig;
use clap::Parser;
use std::path::PathBuf;

/// A CLI tool for normalizing monthly climate NetCDF files
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    name = "climfix",
    about = "Normalizes monthly climate NetCDF files for merging and comparison"
)]
pub struct Args {
    /// Folder containing the monthly NetCDF input files
    #[arg(short, long, default_value = ".")]
    pub folder: PathBuf,

    /// Comma-separated list of variables to process, in order
    #[arg(long, value_delimiter = ',', default_value = "pr,tasmax,tasmin")]
    pub variables: Vec<String>,

    /// Number of decimal digits to round lat/lon coordinates to
    #[arg(long, default_value_t = 2, value_parser = parse_digits)]
    pub digits: i32,

    /// Suffix appended to the input file stem to name the output file
    #[arg(long, default_value = "_fixed")]
    pub suffix: String,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Build the run configuration from the parsed flags
    pub fn to_config(&self) -> NormalizeConfig {
        NormalizeConfig {
            input_folder: self.folder.clone(),
            variables: self.variables.clone(),
            digits: self.digits,
            output_suffix: self.suffix.clone(),
        }
    }
}

fn parse_digits(s: &str) -> Result<i32, String> {
    let digits = s
        .parse::<i32>()
        .map_err(|_| "Invalid format: Expected an integer number of digits.".to_string())?;
    if !(0..=8).contains(&digits) {
        return Err(format!("Digits must be between 0 and 8, got {}", digits));
    }
    Ok(digits)
}
