use std::collections::HashSet;

use tracing::warn;

use crate::input::InputError;
use crate::model::features::{FeatureClass, classify_feature};
use crate::model::thresholds::FilterConfig;
use crate::store::{ChunkedMatrixSource, column_chunks};

#[derive(Debug, Clone, PartialEq)]
pub struct VerifySummary {
    pub n_features: usize,
    pub n_cells: usize,
    pub n_spikeins: usize,
    pub n_other: usize,
    pub n_duplicate_names: usize,
    pub n_nonfinite: usize,
    pub min_column_sum: f64,
    pub max_column_sum: f64,
}

pub fn verify_filtered(
    source: &dyn ChunkedMatrixSource,
    config: &FilterConfig,
) -> Result<VerifySummary, InputError> {
    let (n_features, n_cells) = source.shape();
    let names = source
        .row_annotations()
        .strings(&config.gene_name_column)
        .ok_or_else(|| {
            InputError::SchemaMismatch(format!(
                "filtered store has no {} row annotation",
                config.gene_name_column
            ))
        })?;
    if source
        .column_annotations()
        .get(&config.cell_key_column)
        .is_none()
    {
        return Err(InputError::SchemaMismatch(format!(
            "filtered store has no {} column annotation",
            config.cell_key_column
        )));
    }

    let mut n_spikeins = 0usize;
    let mut n_other = 0usize;
    let mut seen = HashSet::with_capacity(names.len());
    let mut n_duplicate_names = 0usize;
    for name in &names {
        match classify_feature(name, config) {
            FeatureClass::SpikeIn => n_spikeins += 1,
            FeatureClass::Other => n_other += 1,
            FeatureClass::Mapped => {}
        }
        if !seen.insert(name.as_str()) {
            n_duplicate_names += 1;
        }
    }
    if n_duplicate_names > 0 {
        warn!(n = n_duplicate_names, "duplicate gene names in filtered store");
    }

    let mut n_nonfinite = 0usize;
    let mut min_column_sum = f64::INFINITY;
    let mut max_column_sum = f64::NEG_INFINITY;
    for (start, end) in column_chunks(n_cells, config.chunk_size) {
        let sub = source.read_columns(start, end)?;
        for j in 0..sub.n_cols() {
            let mut sum = 0f64;
            for &v in sub.column(j) {
                if v.is_finite() {
                    sum += v as f64;
                } else {
                    n_nonfinite += 1;
                }
            }
            min_column_sum = min_column_sum.min(sum);
            max_column_sum = max_column_sum.max(sum);
        }
    }
    if n_cells == 0 {
        min_column_sum = 0.0;
        max_column_sum = 0.0;
    }

    Ok(VerifySummary {
        n_features,
        n_cells,
        n_spikeins,
        n_other,
        n_duplicate_names,
        n_nonfinite,
        min_column_sum,
        max_column_sum,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage7_verify.rs"]
mod tests;
