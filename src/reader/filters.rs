use anyhow::{anyhow, bail, Result};
use polars::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Year column used when a dataset has no entry in the [`YearColumnMap`]
pub const DEFAULT_YEAR_COLUMN: &str = "publication_year";

/// Comparison operator of a [`RowFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::NotEq => "!=",
            FilterOp::Gt => ">",
            FilterOp::GtEq => ">=",
            FilterOp::Lt => "<",
            FilterOp::LtEq => "<=",
        }
    }
}

/// Right-hand side of a [`RowFilter`]
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl FilterValue {
    /// Integers first, then floats, anything else is a string literal.
    /// Surrounding single or double quotes force a string.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        for quote in ['"', '\''] {
            if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
                return FilterValue::Str(raw[1..raw.len() - 1].to_string());
            }
        }
        if let Ok(v) = raw.parse::<i64>() {
            return FilterValue::Int(v);
        }
        if let Ok(v) = raw.parse::<f64>() {
            return FilterValue::Float(v);
        }
        FilterValue::Str(raw.to_string())
    }

    fn to_lit(&self) -> Expr {
        match self {
            FilterValue::Int(v) => lit(*v),
            FilterValue::Float(v) => lit(*v),
            FilterValue::Str(v) => lit(v.as_str()),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Int(v) => write!(f, "{}", v),
            FilterValue::Float(v) => write!(f, "{}", v),
            FilterValue::Str(v) => write!(f, "{:?}", v),
        }
    }
}

/// A single row-level predicate, e.g. `num_authors >= 1`
#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter {
    pub column: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl RowFilter {
    pub fn new(column: &str, op: FilterOp, value: FilterValue) -> Self {
        Self {
            column: column.to_string(),
            op,
            value,
        }
    }

    pub fn to_expr(&self) -> Expr {
        let column = col(self.column.as_str());
        let value = self.value.to_lit();
        match self.op {
            FilterOp::Eq => column.eq(value),
            FilterOp::NotEq => column.neq(value),
            FilterOp::Gt => column.gt(value),
            FilterOp::GtEq => column.gt_eq(value),
            FilterOp::Lt => column.lt(value),
            FilterOp::LtEq => column.lt_eq(value),
        }
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.op.as_str(), self.value)
    }
}

impl FromStr for RowFilter {
    type Err = anyhow::Error;

    /// Parse `column<op>value`, e.g. `score>90` or `type == article`
    fn from_str(s: &str) -> Result<Self> {
        // Two-character operators must be tried before their one-character prefixes
        const OPS: [(&str, FilterOp); 7] = [
            (">=", FilterOp::GtEq),
            ("<=", FilterOp::LtEq),
            ("!=", FilterOp::NotEq),
            ("==", FilterOp::Eq),
            (">", FilterOp::Gt),
            ("<", FilterOp::Lt),
            ("=", FilterOp::Eq),
        ];

        let (pos, token, op) = OPS
            .iter()
            .filter_map(|(token, op)| s.find(token).map(|pos| (pos, *token, *op)))
            .min_by_key(|(pos, token, _)| (*pos, std::cmp::Reverse(token.len())))
            .ok_or_else(|| anyhow!("Filter '{}' has no comparison operator", s))?;

        let column = s[..pos].trim();
        let value = s[pos + token.len()..].trim();
        if column.is_empty() {
            bail!("Filter '{}' has no column name", s);
        }
        if value.is_empty() {
            bail!("Filter '{}' has no value", s);
        }

        Ok(RowFilter::new(column, op, FilterValue::parse(value)))
    }
}

/// Inclusive publication-year range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if start > end {
            bail!("Year range start {} is after end {}", start, end);
        }
        Ok(Self { start, end })
    }

    /// Both bounds as pushed-down predicates on `year_column`
    pub fn to_filters(&self, year_column: &str) -> [RowFilter; 2] {
        [
            RowFilter::new(year_column, FilterOp::GtEq, FilterValue::Int(self.start as i64)),
            RowFilter::new(year_column, FilterOp::LtEq, FilterValue::Int(self.end as i64)),
        ]
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -- {}", self.start, self.end)
    }
}

impl FromStr for YearRange {
    type Err = anyhow::Error;

    /// Parse `2010:2020`
    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("Year range '{}' must look like START:END", s))?;
        let start = start
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid start year in '{}': {}", s, e))?;
        let end = end
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid end year in '{}': {}", s, e))?;
        YearRange::new(start, end)
    }
}

/// Which column holds the publication year, per dataset name.
///
/// Most datasets use `publication_year`; the exceptions are listed here
/// instead of being special-cased inside the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearColumnMap {
    overrides: HashMap<String, String>,
    fallback: String,
}

impl Default for YearColumnMap {
    fn default() -> Self {
        let mut overrides = HashMap::new();
        overrides.insert(
            "works_referenced_works".to_string(),
            "work_publication_year".to_string(),
        );
        Self {
            overrides,
            fallback: DEFAULT_YEAR_COLUMN.to_string(),
        }
    }
}

impl YearColumnMap {
    /// Map with no overrides at all
    pub fn empty() -> Self {
        Self {
            overrides: HashMap::new(),
            fallback: DEFAULT_YEAR_COLUMN.to_string(),
        }
    }

    pub fn with_override(mut self, dataset: &str, column: &str) -> Self {
        self.overrides.insert(dataset.to_string(), column.to_string());
        self
    }

    /// Apply a `DATASET=COLUMN` spec from the command line
    pub fn with_override_spec(self, spec: &str) -> Result<Self> {
        let (dataset, column) = spec
            .split_once('=')
            .ok_or_else(|| anyhow!("Year column override '{}' must look like DATASET=COLUMN", spec))?;
        let (dataset, column) = (dataset.trim(), column.trim());
        if dataset.is_empty() || column.is_empty() {
            bail!("Year column override '{}' must look like DATASET=COLUMN", spec);
        }
        Ok(self.with_override(dataset, column))
    }

    pub fn year_column(&self, dataset: &str) -> &str {
        self.overrides
            .get(dataset)
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }
}

/// AND-combine a set of filters into one predicate, `None` when empty
pub fn combine_filters(filters: &[RowFilter]) -> Option<Expr> {
    filters
        .iter()
        .map(RowFilter::to_expr)
        .reduce(|acc, expr| acc.and(expr))
}
