use tracing::debug;

use crate::input::InputError;
use crate::model::thresholds::FilterConfig;
use crate::store::{ChunkedMatrixSource, column_chunks};

#[derive(Debug, Clone, PartialEq)]
pub struct CellStats {
    pub coverage: Vec<f64>,
    pub genes_detected: Vec<u32>,
}

pub fn compute_cell_stats(
    source: &dyn ChunkedMatrixSource,
    mapped_rows: &[usize],
    chunk_size: usize,
) -> Result<CellStats, InputError> {
    let (_, n_cells) = source.shape();
    let mut coverage = vec![0f64; n_cells];
    let mut genes_detected = vec![0u32; n_cells];

    for (ig, (start, end)) in column_chunks(n_cells, chunk_size).enumerate() {
        debug!(group = ig, start, end, "cell statistics");
        let sub = source.read_columns_rows(mapped_rows, start, end)?;
        for j in 0..sub.n_cols() {
            let mut sum = 0f64;
            let mut detected = 0u32;
            for &v in sub.column(j) {
                sum += v as f64;
                if v >= 1.0 {
                    detected += 1;
                }
            }
            coverage[start + j] = sum;
            genes_detected[start + j] = detected;
        }
    }

    Ok(CellStats {
        coverage,
        genes_detected,
    })
}

pub fn is_good_cell(coverage: f64, genes_detected: u32, config: &FilterConfig) -> bool {
    coverage >= config.min_coverage && genes_detected >= config.min_genes_detected
}

pub fn select_cells(cell_keys: &[String], stats: &CellStats, config: &FilterConfig) -> Vec<String> {
    cell_keys
        .iter()
        .enumerate()
        .filter(|&(i, _)| is_good_cell(stats.coverage[i], stats.genes_detected[i], config))
        .map(|(_, key)| key.clone())
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_cells.rs"]
mod tests;
