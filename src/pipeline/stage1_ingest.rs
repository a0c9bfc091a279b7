use tracing::info;

use crate::input::InputError;
use crate::input::counts::CountsTable;
use crate::input::features::FeatureSheet;
use crate::model::annotations::{AnnotationTable, AnnotationValues};
use crate::model::features::{count_classes, mapped_rows, strip_key_prefix};
use crate::model::thresholds::FilterConfig;
use crate::pipeline::stage2_cells::compute_cell_stats;
use crate::store::MemoryStore;

pub fn build_raw_store(
    counts: CountsTable,
    featuresheet: &FeatureSheet,
    samples: AnnotationTable,
    config: &FilterConfig,
) -> Result<MemoryStore, InputError> {
    let keys: Vec<String> = counts
        .feature_keys
        .iter()
        .map(|k| strip_key_prefix(k, &config.key_prefix).to_string())
        .collect();
    featuresheet.check_matches(&keys)?;
    if samples.n_records() != counts.cell_ids.len() {
        return Err(InputError::SchemaMismatch(format!(
            "samplesheet has {} cells, counts table has {}",
            samples.n_records(),
            counts.cell_ids.len()
        )));
    }

    let classes = count_classes(&keys, config);
    info!(
        mapped = classes.mapped,
        spikeins = classes.spikein,
        other = classes.other,
        "feature classes"
    );

    let mut rows = AnnotationTable::new();
    rows.insert(
        &config.feature_key_column,
        AnnotationValues::Text(keys.clone()),
    );
    for col in &featuresheet.table.columns {
        rows.insert(&col.name, col.values.clone());
    }

    let mut cols = AnnotationTable::new();
    cols.insert(
        &config.cell_key_column,
        AnnotationValues::Text(counts.cell_ids.clone()),
    );
    for col in samples.columns {
        cols.insert(&col.name, col.values);
    }

    let mut store = MemoryStore::new(counts.matrix, rows, cols)?;
    let mapped = mapped_rows(&keys, config);
    let stats = compute_cell_stats(&store, &mapped, config.chunk_size)?;
    store
        .cols
        .insert("coverage", AnnotationValues::Number(stats.coverage));
    store.cols.insert(
        "number_of_genes_1plusreads",
        AnnotationValues::Number(stats.genes_detected.iter().map(|&n| n as f64).collect()),
    );
    Ok(store)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_ingest.rs"]
mod tests;
