//! Topic partitions on disk: one `<topic>.parquet` per topic in the works
//! directory, mirrored by one `<topic>.parquet` in the relation directory.

pub mod driver;

pub use driver::{run_partition, ExpandConfig};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use log::info;
use polars::prelude::*;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::reader::{with_parquet_extension, PARQUET_EXTENSION};

/// Parquet codec for the relation output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputCompression {
    #[default]
    Brotli,
    Zstd,
    Gzip,
    Snappy,
    Lz4,
    Uncompressed,
}

impl OutputCompression {
    pub fn to_parquet(self) -> ParquetCompression {
        match self {
            OutputCompression::Brotli => ParquetCompression::Brotli(None),
            OutputCompression::Zstd => ParquetCompression::Zstd(None),
            OutputCompression::Gzip => ParquetCompression::Gzip(None),
            OutputCompression::Snappy => ParquetCompression::Snappy,
            OutputCompression::Lz4 => ParquetCompression::Lz4Raw,
            OutputCompression::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

impl fmt::Display for OutputCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputCompression::Brotli => "brotli",
            OutputCompression::Zstd => "zstd",
            OutputCompression::Gzip => "gzip",
            OutputCompression::Snappy => "snappy",
            OutputCompression::Lz4 => "lz4",
            OutputCompression::Uncompressed => "uncompressed",
        };
        f.write_str(name)
    }
}

/// List topic names (file stems of `*.parquet` files) in `works_dir`, sorted
/// so that a 1-based index means the same topic on every invocation.
pub fn list_partitions(works_dir: &Path) -> Result<Vec<String>> {
    let mut topics: Vec<String> = fs::read_dir(works_dir)
        .with_context(|| format!("Failed to read partition directory: {:?}", works_dir))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().map_or(false, |ext| ext == PARQUET_EXTENSION))
        .filter_map(|path| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        })
        .collect();

    topics.sort();
    Ok(topics)
}

/// Map a 1-based partition index onto the topic list
pub fn resolve_partition(topics: &[String], index: usize) -> Result<&str> {
    if index == 0 {
        bail!("Partition index starts at 1, got 0");
    }
    match topics.get(index - 1) {
        Some(topic) => Ok(topic.as_str()),
        None => bail!(
            "Partition index {} is out of range: {} partitions available",
            index,
            topics.len()
        ),
    }
}

/// Source and destination of one topic partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPaths {
    pub topic: String,
    pub origin: PathBuf,
    pub destination: PathBuf,
}

impl PartitionPaths {
    pub fn new(topic: &str, works_dir: &Path, output_dir: &Path) -> Self {
        Self {
            topic: topic.to_string(),
            origin: with_parquet_extension(&works_dir.join(topic)),
            destination: with_parquet_extension(&output_dir.join(topic)),
        }
    }
}

/// Write a relation table, creating the output directory if needed and
/// overwriting any previous file for the same topic.
pub fn write_relation(df: &mut DataFrame, path: &Path, compression: OutputCompression) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
        }
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {:?}", path))?;

    ParquetWriter::new(file)
        .with_compression(compression.to_parquet())
        .with_row_group_size(Some(250_000))
        .finish(df)
        .with_context(|| format!("Failed to write relation parquet: {:?}", path))?;

    info!("Wrote {} rows to {:?} ({})", df.height(), path, compression);
    Ok(())
}
