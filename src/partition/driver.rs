use anyhow::{bail, Context, Result};
use log::info;
use polars::prelude::IntoLazy;
use std::path::PathBuf;
use std::time::Instant;

use super::{list_partitions, resolve_partition, write_relation, OutputCompression, PartitionPaths};
use crate::common::{create_spinner, ExpandStats, PreviewConfig};
use crate::expand::{count_references, expand, rename_lookup, ORIGIN_COLUMNS};
use crate::inspect::inspect;
use crate::reader::{read_parquet, ReadOptions};

/// Everything one partition run needs
#[derive(Debug, Clone)]
pub struct ExpandConfig {
    /// 1-based position of the topic in the sorted partition listing
    pub partition_index: usize,
    pub works_dir: PathBuf,
    pub lookup_path: PathBuf,
    pub output_dir: PathBuf,
    pub compression: OutputCompression,
    /// Inspect the written file afterwards
    pub peek: bool,
    pub preview: PreviewConfig,
}

/// Expand one topic partition end to end: resolve, load, expand, write, peek.
pub fn run_partition(config: &ExpandConfig) -> Result<ExpandStats> {
    let start = Instant::now();

    let topics = list_partitions(&config.works_dir)?;
    let topic = resolve_partition(&topics, config.partition_index)?;
    let paths = PartitionPaths::new(topic, &config.works_dir, &config.output_dir);

    info!(
        "Partition {}/{}: {:?}",
        config.partition_index,
        topics.len(),
        paths.topic
    );

    if !paths.origin.exists() {
        bail!("Origin partition file does not exist: {:?}", paths.origin);
    }

    let spinner = create_spinner("Reading global work -> primary topic lookup...");
    let lookup = read_parquet(&config.lookup_path, &ReadOptions::default())
        .context("Failed to read global lookup")?;
    spinner.finish_and_clear();
    info!("Read lookup: {} works", lookup.height());

    let lookup = rename_lookup(lookup.lazy())
        .collect()
        .context("Failed to rename lookup columns")?;
    info!("Renamed lookup columns");

    let origin_options = ReadOptions::default()
        .with_columns(&ORIGIN_COLUMNS)
        .quiet(true);
    let origin = read_parquet(&paths.origin, &origin_options)
        .with_context(|| format!("Failed to read origin partition: {:?}", paths.origin))?;

    let total_references = count_references(&origin)?;

    let spinner = create_spinner("Expanding related works...");
    let mut relation = expand(&origin, &lookup)?;
    spinner.finish_and_clear();

    write_relation(&mut relation, &paths.destination, config.compression)?;
    info!(
        "Successfully generated {:?} using {:?}.",
        paths.destination, paths.origin
    );

    if config.peek {
        info!("Here's a peek.");
        inspect(&paths.destination, &config.preview)?;
    }

    Ok(ExpandStats {
        topic: paths.topic,
        partition_index: config.partition_index,
        lookup_rows: lookup.height(),
        origin_rows: origin.height(),
        total_references,
        relation_rows: relation.height(),
        output_path: paths.destination.display().to_string(),
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
