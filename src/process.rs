//! Per-variable driver: discover input files, open with per-chunk
//! normalization, re-normalize the assembled dataset, materialize, write
//!
//! The same [`normalize`] pass runs twice: once on every chunk before
//! concatenation, so merging operates on already-normalized coordinates, and
//! once more on the assembled dataset. Idempotence makes the second pass
//! safe.

use crate::config::NormalizeConfig;
use crate::dataset::Dataset;
use crate::errors::{ClimFixError, Result};
use crate::netcdf_io::{open_dataset, write_dataset};
use crate::normalize::normalize;
use glob::glob;
use std::path::{Path, PathBuf};

/// Input files matching `<folder>/<variable>*.nc`, sorted so the first
/// match does not depend on filesystem enumeration order.
pub fn find_variable_files(folder: &Path, variable: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in glob(&file_pattern(folder, variable))? {
        files.push(entry?);
    }
    files.sort();
    Ok(files)
}

/// Output path: the input file stem with the suffix appended, `.nc` kept.
#[must_use]
pub fn output_path_for(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}.nc", stem, suffix))
}

/// Run the full pipeline for one variable and return the written path.
pub fn normalize_and_materialize(variable: &str, config: &NormalizeConfig) -> Result<PathBuf> {
    let files = find_variable_files(&config.input_folder, variable)?;
    if files.is_empty() {
        return Err(ClimFixError::NoInputFiles {
            pattern: file_pattern(&config.input_folder, variable),
        });
    }
    if files.len() > 1 {
        println!(
            "⚠ {} files match '{}*.nc' ({}); using {}",
            files.len(),
            variable,
            files
                .iter()
                .map(|f| f.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            files[0].display()
        );
    }
    let input = &files[0];

    // The first match is the sole input; each opened file is one chunk and
    // gets the per-chunk normalization before assembly.
    let mut chunks = Vec::new();
    for path in &files[..1] {
        let chunk = open_dataset(path)?;
        chunks.push(normalize(chunk, config.digits)?);
    }

    let dataset = Dataset::concat(chunks)?;
    let dataset = normalize(dataset, config.digits)?;
    let mut dataset = dataset.select(variable)?;
    dataset.realize()?;

    let output = output_path_for(input, &config.output_suffix);
    println!("{}", output.display());
    write_dataset(&dataset, &output)?;
    Ok(output)
}

/// Process every configured variable in order, aborting on the first error.
///
/// Outputs written before a failure stay on disk.
pub fn run(config: &NormalizeConfig) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(config.variables.len());
    for variable in &config.variables {
        println!("📂 Processing variable '{}'", variable);
        let output = normalize_and_materialize(variable, config)?;
        println!("✅ Saved normalized '{}' to {}", variable, output.display());
        written.push(output);
    }
    Ok(written)
}

fn file_pattern(folder: &Path, variable: &str) -> String {
    folder
        .join(format!("{}*.nc", variable))
        .to_string_lossy()
        .into_owned()
}
