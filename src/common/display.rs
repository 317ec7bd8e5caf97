use comfy_table::{presets::UTF8_FULL, Cell, Table};
use polars::prelude::*;

/// How DataFrame previews are rendered. Passed explicitly to every caller
/// that prints rows; nothing here touches process-wide polars formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewConfig {
    /// Maximum number of sample rows shown
    pub rows: usize,
    /// Digits after the decimal point for float cells
    pub float_precision: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            rows: 5,
            float_precision: 3,
        }
    }
}

fn format_cell(value: &AnyValue, float_precision: usize) -> String {
    match value {
        AnyValue::Null => "null".to_string(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Float32(v) => format!("{:.*}", float_precision, v),
        AnyValue::Float64(v) => format!("{:.*}", float_precision, v),
        other => other.to_string(),
    }
}

/// Render at most `config.rows` rows of `df` as a text table with a dtype header line.
pub fn render_preview(df: &DataFrame, config: &PreviewConfig) -> PolarsResult<String> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);

    let columns = df.get_columns();
    table.set_header(
        columns
            .iter()
            .map(|c| Cell::new(format!("{}\n{}", c.name(), c.dtype())))
            .collect::<Vec<_>>(),
    );

    let shown = df.height().min(config.rows);
    for row in 0..shown {
        let mut cells = Vec::with_capacity(columns.len());
        for column in columns {
            let value = column.get(row)?;
            cells.push(Cell::new(format_cell(&value, config.float_precision)));
        }
        table.add_row(cells);
    }

    Ok(format!("shape: ({}, {})\n{}", df.height(), df.width(), table))
}
