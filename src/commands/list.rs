use anyhow::Result;
use log::info;
use std::path::Path;

use crate::cli::ListArgs;
use work2related::common::setup_logging;
use work2related::partition::list_partitions;

pub fn run_list(args: ListArgs) -> Result<Vec<String>> {
    setup_logging(args.log_level)?;

    let topics = list_partitions(Path::new(&args.works_dir))?;
    info!("{} partitions in {}", topics.len(), args.works_dir);

    for (i, topic) in topics.iter().enumerate() {
        println!("{}\t{}", i + 1, topic);
    }

    Ok(topics)
}
