//! Dataset inspector: quick confirmation of what a parquet dataset holds
//! without loading it fully.

use anyhow::{Context, Result};
use polars::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::common::{render_preview, PreviewConfig};
use crate::reader::{dataset_name, list_fragments, resolve_parquet_path};

/// Everything `peek` reports about a dataset
#[derive(Debug, Clone)]
pub struct DatasetSummary {
    pub name: String,
    pub path: PathBuf,
    pub fragments: usize,
    pub rows: usize,
    pub schema: Vec<(String, String)>,
    /// Up to `PreviewConfig::rows` rows from the first non-empty fragment
    pub sample: DataFrame,
}

fn count_rows(fragment: &Path) -> Result<usize> {
    let counts = LazyFrame::scan_parquet(fragment, Default::default())
        .with_context(|| format!("Failed to scan fragment: {:?}", fragment))?
        .select([len().cast(DataType::UInt64).alias("rows")])
        .collect()
        .with_context(|| format!("Failed to count rows of fragment: {:?}", fragment))?;

    Ok(counts.column("rows")?.u64()?.get(0).unwrap_or(0) as usize)
}

fn fragment_head(fragment: &Path, rows: usize) -> Result<DataFrame> {
    LazyFrame::scan_parquet(fragment, Default::default())
        .with_context(|| format!("Failed to scan fragment: {:?}", fragment))?
        .limit(rows as IdxSize)
        .collect()
        .with_context(|| format!("Failed to read head of fragment: {:?}", fragment))
}

/// Collect fragment/row counts, schema and a sample for a parquet dataset.
pub fn summarize<P: AsRef<Path>>(path: P, config: &PreviewConfig) -> Result<DatasetSummary> {
    let path = resolve_parquet_path(path)?;
    let fragments = list_fragments(&path)?;

    let mut rows = 0;
    let mut sample = None;
    for fragment in &fragments {
        let fragment_rows = count_rows(fragment)?;
        rows += fragment_rows;
        if sample.is_none() && fragment_rows > 0 {
            sample = Some(fragment_head(fragment, config.rows)?);
        }
    }

    let mut schema_source = match fragments.first() {
        Some(first) => LazyFrame::scan_parquet(first, Default::default())
            .with_context(|| format!("Failed to scan fragment: {:?}", first))?,
        None => DataFrame::empty().lazy(),
    };
    let schema = schema_source
        .collect_schema()
        .with_context(|| format!("Failed to read schema of {:?}", path))?;
    let schema_fields: Vec<(String, String)> = schema
        .iter()
        .map(|(name, dtype)| (name.to_string(), dtype.to_string()))
        .collect();

    let sample = match sample {
        Some(df) => df,
        None => DataFrame::empty_with_schema(&schema),
    };

    Ok(DatasetSummary {
        name: dataset_name(&path),
        path,
        fragments: fragments.len(),
        rows,
        schema: schema_fields,
        sample,
    })
}

impl DatasetSummary {
    pub fn render(&self, config: &PreviewConfig) -> Result<String> {
        let mut out = String::new();
        out.push_str(&self.to_string());
        out.push_str(&format!("{} sample rows:\n", self.sample.height()));
        out.push_str(&render_preview(&self.sample, config)?);
        Ok(out)
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {:?}", self.name)?;
        writeln!(f, "Path: {:?}", self.path.display().to_string())?;
        writeln!(f, "Files: {}", self.fragments)?;
        writeln!(f, "Rows: {}", self.rows)?;
        writeln!(f, "Schema:")?;
        for (name, dtype) in &self.schema {
            writeln!(f, "    {}: {}", name, dtype)?;
        }
        Ok(())
    }
}

/// Print a summary of the dataset at `path` to stdout.
pub fn inspect<P: AsRef<Path>>(path: P, config: &PreviewConfig) -> Result<DatasetSummary> {
    let summary = summarize(path, config)?;
    println!("{}", summary.render(config)?);
    Ok(summary)
}
