use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::ExpandArgs;
use work2related::common::{format_elapsed, setup_logging, ExpandStats, PreviewConfig};
use work2related::partition::{run_partition, ExpandConfig};

fn expand_config(args: &ExpandArgs) -> ExpandConfig {
    ExpandConfig {
        partition_index: args.id,
        works_dir: PathBuf::from(&args.works_dir),
        lookup_path: PathBuf::from(&args.lookup),
        output_dir: PathBuf::from(&args.output_dir),
        compression: args.compression,
        peek: !args.no_peek,
        preview: PreviewConfig {
            rows: args.peek_rows,
            float_precision: args.float_precision,
        },
    }
}

pub fn run_expand(args: ExpandArgs) -> Result<ExpandStats> {
    setup_logging(args.log_level)?;

    info!("Starting related-works expansion");
    info!("Partition index: {}", args.id);
    info!("Works directory: {}", args.works_dir);
    info!("Lookup: {}", args.lookup);
    info!("Output directory: {}", args.output_dir);

    let config = expand_config(&args);
    let stats = run_partition(&config)?;

    if let Some(path) = &args.stats_json {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialize stats")?;
        fs::write(path, json).with_context(|| format!("Failed to write stats to {}", path))?;
    }

    info!("==================== FINAL SUMMARY ====================");
    info!(
        "Total execution time: {}",
        format_elapsed(Duration::from_secs_f64(stats.elapsed_secs))
    );
    info!("Topic: {} (partition {})", stats.topic, stats.partition_index);
    info!("Lookup works: {}", stats.lookup_rows);
    info!("Origin works: {}", stats.origin_rows);
    info!("Related-work references: {}", stats.total_references);
    info!(
        "Relation rows: {} ({:.2}% of references)",
        stats.relation_rows,
        stats.match_rate()
    );
    info!("References missing from lookup: {}", stats.dropped_references());
    info!("Output file: {}", stats.output_path);
    if let Some(path) = &args.stats_json {
        info!("Stats JSON: {}", path);
    }
    info!("========================================================");

    Ok(stats)
}
