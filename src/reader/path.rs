use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const PARQUET_EXTENSION: &str = "parquet";

fn has_parquet_extension(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == PARQUET_EXTENSION)
}

/// Append `.parquet` to a path, keeping any dots already in the file name
/// ("Nuclear Physics 2.0" -> "Nuclear Physics 2.0.parquet").
pub fn with_parquet_extension(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(PARQUET_EXTENSION);
    PathBuf::from(name)
}

/// Resolve a dataset path that may be missing its `.parquet` extension.
///
/// An existing path (file or fragment directory) is returned as is. Otherwise
/// the extension is appended and that candidate is tried. Fails with a
/// NotFound error when neither exists.
pub fn resolve_parquet_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();

    if path.exists() {
        return Ok(path.to_path_buf());
    }

    if !has_parquet_extension(path) {
        let candidate = with_parquet_extension(path);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("No parquet dataset found at {}", path.display()),
    ))
    .context("Failed to resolve parquet path")
}

/// Dataset name used for log lines and year-column lookup: the name without
/// its `.parquet` extension, for files and fragment directories alike.
pub fn dataset_name(path: &Path) -> String {
    let stem = if has_parquet_extension(path) || !path.is_dir() {
        path.file_stem()
    } else {
        path.file_name()
    };
    stem.map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn collect_fragments(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read dataset directory: {:?}", dir))?;

    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read entry in {:?}", dir))?
            .path();
        if path.is_dir() {
            collect_fragments(&path, out)?;
        } else if has_parquet_extension(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// List the physical fragments of a dataset: the file itself, or every
/// `*.parquet` file below a directory, sorted by path.
pub fn list_fragments(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut fragments = Vec::new();
    collect_fragments(path, &mut fragments)?;
    fragments.sort();
    Ok(fragments)
}
