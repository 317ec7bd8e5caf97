use anyhow::Result;
use log::info;
use polars::prelude::DataFrame;
use std::time::Instant;

use crate::cli::ReadArgs;
use work2related::common::{format_elapsed, setup_logging, PreviewConfig};
use work2related::reader::{read_parquet, ReadOptions, YearColumnMap};

pub fn run_read(args: ReadArgs) -> Result<DataFrame> {
    let start_time = Instant::now();

    setup_logging(args.log_level)?;

    let mut year_columns = YearColumnMap::default();
    for spec in &args.year_columns {
        year_columns = year_columns.with_override_spec(spec)?;
    }

    let options = ReadOptions {
        columns: args.columns.clone(),
        year_range: args.years,
        filters: args.filters.clone(),
        convert_dtypes: !args.no_convert_dtypes,
        quiet: false,
        year_columns,
        preview: PreviewConfig {
            rows: args.rows,
            float_precision: args.float_precision,
        },
    };

    let df = read_parquet(&args.path, &options)?;

    info!(
        "Loaded {} rows x {} columns in {}",
        df.height(),
        df.width(),
        format_elapsed(start_time.elapsed())
    );

    Ok(df)
}
