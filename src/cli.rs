use clap::{Parser, Subcommand};
use log::LevelFilter;

use work2related::common::parse_log_level;
use work2related::partition::OutputCompression;
use work2related::reader::{RowFilter, YearRange};

#[derive(Parser)]
#[command(name = "work2related")]
#[command(about = "Expand per-topic works into work -> related-work relations with topic metadata")]
#[command(version = "1.0.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Expand the related works of one topic partition (one invocation per job-array task)
    Expand(ExpandArgs),

    /// List topic partitions with the 1-based index that `expand --id` takes
    List(ListArgs),

    /// Print file count, row count, schema and sample rows of a parquet dataset
    Peek(PeekArgs),

    /// Read a parquet dataset with optional projection, year range and filters
    Read(ReadArgs),
}

#[derive(Parser, Clone)]
pub struct ExpandArgs {
    /// The index of the topic in the sorted partition listing (starts at 1)
    #[arg(short, long = "id", visible_alias = "ID", default_value = "1")]
    pub id: usize,

    /// Directory with one <topic>.parquet file of works per topic
    #[arg(long, default_value = "data/works_by_topic_parquet")]
    pub works_dir: String,

    /// Global work -> primary topic lookup (columns id, date, primary_topic)
    #[arg(long, default_value = "data/all_works2primary_topic_parquet/all_works2primary_topic.parquet")]
    pub lookup: String,

    /// Directory for the <topic>.parquet relation outputs
    #[arg(short, long, default_value = "data/works2related_by_topic_parquet")]
    pub output_dir: String,

    /// Parquet compression codec for the output
    #[arg(short, long, value_enum, default_value_t = OutputCompression::Brotli)]
    pub compression: OutputCompression,

    /// Skip inspecting the written file
    #[arg(long, default_value = "false")]
    pub no_peek: bool,

    /// Number of rows shown when inspecting the output
    #[arg(long, default_value = "5")]
    pub peek_rows: usize,

    /// Digits after the decimal point in previews
    #[arg(long, default_value = "3")]
    pub float_precision: usize,

    /// Write run statistics as JSON to this file
    #[arg(long)]
    pub stats_json: Option<String>,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO", value_parser = parse_log_level)]
    pub log_level: LevelFilter,
}

#[derive(Parser, Clone)]
pub struct ListArgs {
    /// Directory with one <topic>.parquet file of works per topic
    #[arg(long, default_value = "data/works_by_topic_parquet")]
    pub works_dir: String,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO", value_parser = parse_log_level)]
    pub log_level: LevelFilter,
}

#[derive(Parser, Clone)]
pub struct PeekArgs {
    /// Parquet file or directory of parquet fragments (extension optional)
    pub path: String,

    /// Number of sample rows
    #[arg(short, long, default_value = "5")]
    pub rows: usize,

    /// Digits after the decimal point in previews
    #[arg(long, default_value = "3")]
    pub float_precision: usize,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO", value_parser = parse_log_level)]
    pub log_level: LevelFilter,
}

#[derive(Parser, Clone)]
pub struct ReadArgs {
    /// Parquet file or directory of parquet fragments (extension optional)
    pub path: String,

    /// Comma-separated columns to keep
    #[arg(long, value_delimiter = ',')]
    pub columns: Option<Vec<String>>,

    /// Inclusive publication-year range, e.g. 2010:2020
    #[arg(short, long)]
    pub years: Option<YearRange>,

    /// Row filter such as 'num_authors>=1' (repeatable, AND-combined)
    #[arg(short, long = "filter")]
    pub filters: Vec<RowFilter>,

    /// Year column for a dataset, e.g. works_referenced_works=work_publication_year (repeatable)
    #[arg(long = "year-column")]
    pub year_columns: Vec<String>,

    /// Keep the stored column types instead of compacting them
    #[arg(long, default_value = "false")]
    pub no_convert_dtypes: bool,

    /// Number of preview rows
    #[arg(short, long, default_value = "3")]
    pub rows: usize,

    /// Digits after the decimal point in previews
    #[arg(long, default_value = "3")]
    pub float_precision: usize,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(long, default_value = "INFO", value_parser = parse_log_level)]
    pub log_level: LevelFilter,
}
