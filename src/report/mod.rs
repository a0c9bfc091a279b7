use serde::Serialize;

use crate::model::annotations::format_number;
use crate::model::thresholds::FilterConfig;
use crate::store::ChunkedMatrixSource;

const CELL_TYPE_COLUMN: &str = "cellType";
const DOUBLET_COLUMN: &str = "doublet";
const IMMUNE: &str = "immune";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterStats {
    pub min_coverage: f64,
    pub min_expression_nreads: f64,
    pub min_expressing_cells: u64,
    pub n_genes_raw: usize,
    pub n_cells_raw: usize,
    pub n_genes_filtered: usize,
    pub n_cells_filtered: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_cells_filtered_immune: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_cells_filtered_immune_nodoublet: Option<usize>,
}

pub fn collect_stats(
    raw: &dyn ChunkedMatrixSource,
    good: &dyn ChunkedMatrixSource,
    config: &FilterConfig,
) -> FilterStats {
    let (n_genes_raw, n_cells_raw) = raw.shape();
    let (n_genes_filtered, n_cells_filtered) = good.shape();

    let cols = good.column_annotations();
    let immune: Option<Vec<bool>> = cols
        .strings(CELL_TYPE_COLUMN)
        .map(|v| v.iter().map(|t| t == IMMUNE).collect());
    let singlet: Option<Vec<bool>> = cols.strings(DOUBLET_COLUMN).map(|v| {
        v.iter()
            .map(|t| t.trim().parse::<f64>().map(|d| d == 0.0).unwrap_or(false))
            .collect()
    });

    let n_cells_filtered_immune = immune.as_ref().map(|m| m.iter().filter(|&&b| b).count());
    let n_cells_filtered_immune_nodoublet = match (&immune, &singlet) {
        (Some(i), Some(s)) => Some(i.iter().zip(s).filter(|&(&a, &b)| a && b).count()),
        _ => None,
    };

    FilterStats {
        min_coverage: config.min_coverage,
        min_expression_nreads: config.min_expression_nreads as f64,
        min_expressing_cells: config.min_expressing_cells,
        n_genes_raw,
        n_cells_raw,
        n_genes_filtered,
        n_cells_filtered,
        n_cells_filtered_immune,
        n_cells_filtered_immune_nodoublet,
    }
}

pub fn render_stats_table(stats: &FilterStats) -> String {
    let opt = |v: Option<usize>| v.map(|n| n.to_string()).unwrap_or_else(|| "n/a".to_string());
    let rows: [(&str, String); 9] = [
        ("min_coverage", format_number(stats.min_coverage)),
        ("min_expression_nreads", format_number(stats.min_expression_nreads)),
        ("min_expressing_cells", stats.min_expressing_cells.to_string()),
        ("n_genes_raw", stats.n_genes_raw.to_string()),
        ("n_cells_raw", stats.n_cells_raw.to_string()),
        ("n_genes_filtered", stats.n_genes_filtered.to_string()),
        ("n_cells_filtered", stats.n_cells_filtered.to_string()),
        ("n_cells_filtered_immune", opt(stats.n_cells_filtered_immune)),
        (
            "n_cells_filtered_immune_nodoublet",
            opt(stats.n_cells_filtered_immune_nodoublet),
        ),
    ];
    let mut out = String::from("Data ingestion and filtering statistics:\n");
    for (key, value) in rows {
        out.push_str(&format!("{:35}\t{:>20}\n", format!("{key}:"), value));
    }
    out
}

pub fn render_stats_json(stats: &FilterStats) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(stats)
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
