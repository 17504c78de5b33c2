//! Centralized error handling for climfix
//!
//! This module provides structured error types for every failure the
//! normalization pipeline can hit. All errors are fatal: they propagate with
//! `?` to the binary entry point and terminate the run.

use std::fmt;

/// Main error type for climfix operations
#[derive(Debug)]
pub enum ClimFixError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Malformed glob pattern for input discovery
    PatternError(glob::PatternError),

    /// Variable not found in dataset
    VariableNotFound { var: String },

    /// Required coordinate variable missing from a file
    CoordinateNotFound { coord: String },

    /// No file in the input folder matches a variable's pattern
    NoInputFiles { pattern: String },

    /// Time-units parsing or calendar conversion errors
    CalendarError(String),

    /// Values were read before an explicit realize() call
    NotMaterialized { var: String },

    /// Coordinate arrays differ between chunks being concatenated
    CoordinateMismatch { coord: String },

    /// Generic error for backward compatibility
    Generic(String),
}

impl fmt::Display for ClimFixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClimFixError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            ClimFixError::IoError(e) => write!(f, "I/O error: {}", e),
            ClimFixError::ArrayError(e) => write!(f, "Array error: {}", e),
            ClimFixError::PatternError(e) => write!(f, "Invalid file pattern: {}", e),
            ClimFixError::VariableNotFound { var } => {
                write!(f, "Variable '{}' not found in dataset", var)
            }
            ClimFixError::CoordinateNotFound { coord } => {
                write!(f, "Coordinate '{}' not found in file", coord)
            }
            ClimFixError::NoInputFiles { pattern } => {
                write!(f, "No input files match pattern '{}'", pattern)
            }
            ClimFixError::CalendarError(msg) => write!(f, "Calendar error: {}", msg),
            ClimFixError::NotMaterialized { var } => {
                write!(f, "Variable '{}' is not materialized (call realize first)", var)
            }
            ClimFixError::CoordinateMismatch { coord } => {
                write!(f, "Coordinate '{}' differs between input chunks", coord)
            }
            ClimFixError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ClimFixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClimFixError::NetCDFError(e) => Some(e),
            ClimFixError::IoError(e) => Some(e),
            ClimFixError::ArrayError(e) => Some(e),
            ClimFixError::PatternError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for ClimFixError {
    fn from(error: netcdf::Error) -> Self {
        ClimFixError::NetCDFError(error)
    }
}

impl From<std::io::Error> for ClimFixError {
    fn from(error: std::io::Error) -> Self {
        ClimFixError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for ClimFixError {
    fn from(error: ndarray::ShapeError) -> Self {
        ClimFixError::ArrayError(error)
    }
}

impl From<glob::PatternError> for ClimFixError {
    fn from(error: glob::PatternError) -> Self {
        ClimFixError::PatternError(error)
    }
}

impl From<glob::GlobError> for ClimFixError {
    fn from(error: glob::GlobError) -> Self {
        ClimFixError::IoError(error.into_error())
    }
}

impl From<String> for ClimFixError {
    fn from(error: String) -> Self {
        ClimFixError::Generic(error)
    }
}

impl From<&str> for ClimFixError {
    fn from(error: &str) -> Self {
        ClimFixError::Generic(error.to_string())
    }
}

/// Result type alias for climfix operations
pub type Result<T> = std::result::Result<T, ClimFixError>;
