use crate::input::InputError;
use crate::input::features::{FeatureSheet, truncate_column_name};
use crate::model::annotations::{AnnotationTable, AnnotationValues};
use crate::model::thresholds::FilterConfig;
use crate::store::{DenseMatrix, MemoryStore};

#[derive(Debug)]
pub struct OutputParts<'a> {
    pub matrix: DenseMatrix,
    pub gene_rows: &'a [usize],
    pub discard: &'a [bool],
    pub feature_keys: &'a [String],
    pub featuresheet: &'a FeatureSheet,
    pub samples: &'a AnnotationTable,
    pub cell_keys: &'a [String],
    pub cell_positions: &'a [usize],
    pub config: &'a FilterConfig,
}

pub fn assemble_output(parts: OutputParts<'_>) -> Result<MemoryStore, InputError> {
    if parts.discard.len() != parts.gene_rows.len() || parts.matrix.n_rows() != parts.gene_rows.len()
    {
        return Err(InputError::SchemaMismatch(format!(
            "matrix has {} rows, {} genes selected, {} discard flags",
            parts.matrix.n_rows(),
            parts.gene_rows.len(),
            parts.discard.len()
        )));
    }
    let kept_local: Vec<usize> = parts
        .discard
        .iter()
        .enumerate()
        .filter(|&(_, &d)| !d)
        .map(|(i, _)| i)
        .collect();
    let matrix = parts.matrix.select_rows(&kept_local);
    let kept_rows: Vec<usize> = kept_local.iter().map(|&i| parts.gene_rows[i]).collect();

    let mut rows = AnnotationTable::new();
    rows.insert(
        &parts.config.feature_key_column,
        AnnotationValues::Text(
            kept_rows
                .iter()
                .map(|&r| parts.feature_keys[r].clone())
                .collect(),
        ),
    );
    for col in &parts.featuresheet.table.columns {
        rows.insert(
            truncate_column_name(&col.name),
            col.values.select(&kept_rows),
        );
    }

    let mut cols = AnnotationTable::new();
    cols.insert(
        &parts.config.cell_key_column,
        AnnotationValues::Text(
            parts
                .cell_positions
                .iter()
                .map(|&c| parts.cell_keys[c].clone())
                .collect(),
        ),
    );
    for col in parts.samples.select(parts.cell_positions).columns {
        cols.insert(&col.name, col.values);
    }

    MemoryStore::new(matrix, rows, cols)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_output.rs"]
mod tests;
