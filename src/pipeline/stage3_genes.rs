use tracing::debug;

use crate::input::InputError;
use crate::model::features::{FeatureClass, classify_feature};
use crate::model::thresholds::FilterConfig;
use crate::store::{ChunkedMatrixSource, column_chunks};

pub fn chunk_local_indices(selected: &[usize], start: usize, end: usize) -> Vec<usize> {
    let lo = selected.partition_point(|&i| i < start);
    let hi = selected.partition_point(|&i| i < end);
    selected[lo..hi].iter().map(|&i| i - start).collect()
}

/// `good_cells` must be sorted ascending.
pub fn count_expressing_cells(
    source: &dyn ChunkedMatrixSource,
    good_cells: &[usize],
    config: &FilterConfig,
) -> Result<Vec<u64>, InputError> {
    let (n_features, n_cells) = source.shape();
    let mut cells_expressing = vec![0u64; n_features];

    for (ig, (start, end)) in column_chunks(n_cells, config.chunk_size).enumerate() {
        let local = chunk_local_indices(good_cells, start, end);
        debug!(group = ig, start, end, cells = local.len(), "gene statistics");
        if local.is_empty() {
            continue;
        }
        let sub = source.read_columns(start, end)?;
        for &j in &local {
            for (row, &v) in sub.column(j).iter().enumerate() {
                // raw reads, before normalization
                if v >= config.min_expression_nreads {
                    cells_expressing[row] += 1;
                }
            }
        }
    }

    Ok(cells_expressing)
}

pub fn is_good_gene(
    key: &str,
    name: &str,
    cells_expressing: u64,
    config: &FilterConfig,
) -> bool {
    let mapped = classify_feature(key, config) == FeatureClass::Mapped;
    (mapped && cells_expressing >= config.min_expressing_cells) || config.is_safe_gene(name)
}

pub fn select_genes(
    feature_keys: &[String],
    names: &[String],
    cells_expressing: &[u64],
    config: &FilterConfig,
) -> Vec<String> {
    feature_keys
        .iter()
        .enumerate()
        .filter(|&(i, key)| is_good_gene(key, &names[i], cells_expressing[i], config))
        .map(|(_, key)| key.clone())
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_genes.rs"]
mod tests;
