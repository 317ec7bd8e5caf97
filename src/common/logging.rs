use anyhow::{bail, Result};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use time::macros::format_description;

/// Parse a `--log-level` value. Unknown levels are rejected at argument
/// parsing instead of silently falling back.
pub fn parse_log_level(level: &str) -> Result<LevelFilter> {
    let filter = match level.to_uppercase().as_str() {
        "DEBUG" => LevelFilter::Debug,
        "INFO" => LevelFilter::Info,
        "WARN" | "WARNING" => LevelFilter::Warn,
        "ERROR" => LevelFilter::Error,
        _ => bail!("Invalid log level '{}' (expected DEBUG, INFO, WARN or ERROR)", level),
    };
    Ok(filter)
}

/// Set up logging for one command run
pub fn setup_logging(level: LevelFilter) -> Result<()> {
    SimpleLogger::new()
        .with_level(level)
        .with_timestamp_format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .init()?;
    Ok(())
}
