//! Tabular source reader: loads a parquet dataset into a DataFrame with
//! optional year-range and row filters pushed into the scan, optional column
//! projection, and optional dtype compaction.

pub mod dtypes;
pub mod filters;
pub mod path;

pub use dtypes::{compact_dtypes, CompactType, DTYPE_POLICY};
pub use filters::*;
pub use path::*;

use anyhow::{bail, Context, Result};
use log::{debug, info, log};
use polars::prelude::*;
use std::path::Path;
use std::time::Instant;

use crate::common::{bytes_to_gib, format_elapsed, render_preview, PreviewConfig};

/// Options for [`read_parquet`]
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Columns to keep; `None` keeps every column
    pub columns: Option<Vec<String>>,
    /// Inclusive publication-year range
    pub year_range: Option<YearRange>,
    /// Extra row filters, AND-combined with the year range
    pub filters: Vec<RowFilter>,
    /// Apply the dtype compaction policy after loading
    pub convert_dtypes: bool,
    /// Log progress at debug instead of info and skip the preview
    pub quiet: bool,
    pub year_columns: YearColumnMap,
    pub preview: PreviewConfig,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            columns: None,
            year_range: None,
            filters: Vec::new(),
            convert_dtypes: true,
            quiet: false,
            year_columns: YearColumnMap::default(),
            preview: PreviewConfig {
                rows: 3,
                ..PreviewConfig::default()
            },
        }
    }
}

impl ReadOptions {
    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_year_range(mut self, year_range: YearRange) -> Self {
        self.year_range = Some(year_range);
        self
    }

    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn convert_dtypes(mut self, convert: bool) -> Self {
        self.convert_dtypes = convert;
        self
    }

    fn level(&self) -> log::Level {
        if self.quiet {
            log::Level::Debug
        } else {
            log::Level::Info
        }
    }

    /// Caller filters plus the year-range bounds on this dataset's year column
    pub fn effective_filters(&self, dataset: &str) -> Vec<RowFilter> {
        let mut filters = self.filters.clone();
        if let Some(range) = &self.year_range {
            filters.extend(range.to_filters(self.year_columns.year_column(dataset)));
        }
        filters
    }
}

/// Lazily scan every fragment of a resolved dataset path, in fragment order.
pub fn scan_dataset(path: &Path) -> Result<LazyFrame> {
    let fragments = list_fragments(path)?;
    if fragments.is_empty() {
        bail!("Dataset {:?} contains no parquet fragments", path);
    }

    let frames = fragments
        .iter()
        .map(|fragment| {
            LazyFrame::scan_parquet(fragment, Default::default())
                .with_context(|| format!("Failed to scan parquet fragment: {:?}", fragment))
        })
        .collect::<Result<Vec<_>>>()?;

    if frames.len() == 1 {
        return frames
            .into_iter()
            .next()
            .context("Dataset scan produced no frames");
    }

    concat(&frames, UnionArgs::default())
        .with_context(|| format!("Failed to concatenate fragments of {:?}", path))
}

/// Read a parquet dataset (file or fragment directory) into a DataFrame.
///
/// Filters are applied to the lazy scan before projection so that predicates
/// on columns outside `columns` still work and are pushed down to the reader.
pub fn read_parquet<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<DataFrame> {
    let path = resolve_parquet_path(path)?;
    let name = dataset_name(&path);
    let level = options.level();

    let filters = options.effective_filters(&name);
    if let Some(range) = &options.year_range {
        log!(
            level,
            "Filtering by years: {} on {:?}",
            range,
            options.year_columns.year_column(&name)
        );
    }
    for filter in &options.filters {
        debug!("Row filter: {}", filter);
    }

    log!(level, "Reading {:?} from {:?}", name, path.display().to_string());

    let start = Instant::now();
    let mut lf = scan_dataset(&path)?;
    if let Some(predicate) = combine_filters(&filters) {
        lf = lf.filter(predicate);
    }
    if let Some(columns) = &options.columns {
        lf = lf.select(columns.iter().map(|c| col(c.as_str())).collect::<Vec<_>>());
    }

    let df = lf
        .collect()
        .with_context(|| format!("Failed to read parquet dataset: {:?}", path))?;

    log!(
        level,
        "Read {} rows from {:?} in {}",
        df.height(),
        name,
        format_elapsed(start.elapsed())
    );

    let df = if options.convert_dtypes {
        let start = Instant::now();
        let size_before = bytes_to_gib(df.estimated_size());
        let df = compact_dtypes(df).context("Failed to convert dtypes")?;
        let size_after = bytes_to_gib(df.estimated_size());
        log!(
            level,
            "Converting dtypes took {}. Size before: {:.2}GB, after: {:.2}GB",
            format_elapsed(start.elapsed()),
            size_before,
            size_after
        );
        df
    } else {
        df
    };

    if !options.quiet {
        let head = df.head(Some(options.preview.rows));
        info!("\n{}", render_preview(&head, &options.preview)?);
    }

    Ok(df)
}
