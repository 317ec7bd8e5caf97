use serde::{Deserialize, Serialize};

/// Statistics from one expand run over a single topic partition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpandStats {
    pub topic: String,
    pub partition_index: usize,
    pub lookup_rows: usize,
    pub origin_rows: usize,
    pub total_references: usize,
    pub relation_rows: usize,
    pub output_path: String,
    pub elapsed_secs: f64,
}

impl ExpandStats {
    /// References that found no entry in the global lookup and were dropped by the join
    pub fn dropped_references(&self) -> usize {
        self.total_references.saturating_sub(self.relation_rows)
    }

    pub fn match_rate(&self) -> f64 {
        100.0 * self.relation_rows as f64 / self.total_references.max(1) as f64
    }
}
