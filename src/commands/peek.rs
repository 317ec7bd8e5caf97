use anyhow::Result;

use crate::cli::PeekArgs;
use work2related::common::{setup_logging, PreviewConfig};
use work2related::inspect::{inspect, DatasetSummary};

pub fn run_peek(args: PeekArgs) -> Result<DatasetSummary> {
    setup_logging(args.log_level)?;

    let config = PreviewConfig {
        rows: args.rows,
        float_precision: args.float_precision,
    };
    inspect(&args.path, &config)
}
