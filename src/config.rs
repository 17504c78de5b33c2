//! Run configuration for the normalization pipeline
//!
//! The historical tool hard-coded the input folder, variable list, rounding
//! precision, and output suffix. They are explicit settings here so that
//! library callers and tests can construct runs directly.

use std::path::PathBuf;

/// Variables processed when none are given on the command line
pub const DEFAULT_VARIABLES: [&str; 3] = ["pr", "tasmax", "tasmin"];

/// Decimal digits lat/lon are rounded to by default
pub const DEFAULT_DIGITS: i32 = 2;

/// Suffix appended to the input file stem to form the output name
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_fixed";

/// Settings for one normalization run
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeConfig {
    /// Folder searched for `<variable>*.nc` input files
    pub input_folder: PathBuf,

    /// Variables to process, in order; the run aborts on the first failure
    pub variables: Vec<String>,

    /// Decimal digits for lat/lon rounding
    pub digits: i32,

    /// Appended to the input file stem to derive the output file name
    pub output_suffix: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            input_folder: PathBuf::from("."),
            variables: DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect(),
            digits: DEFAULT_DIGITS,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
        }
    }
}

impl NormalizeConfig {
    /// Create a configuration for the given input folder, defaults elsewhere
    pub fn new<P: Into<PathBuf>>(input_folder: P) -> Self {
        Self {
            input_folder: input_folder.into(),
            ..Self::default()
        }
    }

    /// Replace the ordered variable list
    #[must_use]
    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = variables.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the lat/lon rounding precision
    #[must_use]
    pub fn with_digits(mut self, digits: i32) -> Self {
        self.digits = digits;
        self
    }

    /// Replace the output file suffix
    #[must_use]
    pub fn with_output_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.output_suffix = suffix.into();
        self
    }
}
