use tracing::debug;

use crate::input::InputError;
use crate::pipeline::stage3_genes::chunk_local_indices;
use crate::store::{ChunkedMatrixSource, DenseMatrix, column_chunks};

pub const CPM_SCALE: f64 = 1e6;

#[derive(Debug, Clone)]
pub struct NormalizeInputs<'a> {
    pub gene_rows: &'a [usize],
    pub cell_cols: &'a [usize],
    pub coverage: &'a [f64],
    pub chunk_size: usize,
}

#[derive(Debug, Clone)]
pub struct NormalizedMatrix {
    pub matrix: DenseMatrix,
    pub source_cols: Vec<usize>,
    pub skipped_chunks: usize,
}

pub fn normalize_cpm(
    source: &dyn ChunkedMatrixSource,
    inputs: &NormalizeInputs<'_>,
) -> Result<NormalizedMatrix, InputError> {
    let (_, n_cells) = source.shape();
    if inputs.coverage.len() != n_cells {
        return Err(InputError::SchemaMismatch(format!(
            "coverage has {} values, matrix has {} cells",
            inputs.coverage.len(),
            n_cells
        )));
    }
    let mut matrix = DenseMatrix::zeros(inputs.gene_rows.len(), inputs.cell_cols.len());
    let mut source_cols = Vec::with_capacity(inputs.cell_cols.len());
    let mut skipped_chunks = 0usize;
    let mut ii = 0usize;

    for (ig, (start, end)) in column_chunks(n_cells, inputs.chunk_size).enumerate() {
        let local = chunk_local_indices(inputs.cell_cols, start, end);
        if local.is_empty() {
            debug!(group = ig, start, end, "no kept cells in chunk, skipped");
            skipped_chunks += 1;
            continue;
        }
        debug!(group = ig, start, end, cells = local.len(), "normalize");
        let sub = source.read_columns_rows(inputs.gene_rows, start, end)?;
        for &j in &local {
            let cov = inputs.coverage[start + j];
            let src = sub.column(j);
            let dst = matrix.column_mut(ii);
            if cov > 0.0 {
                for (d, &v) in dst.iter_mut().zip(src) {
                    *d = (CPM_SCALE * v as f64 / cov) as f32;
                }
            }
            source_cols.push(start + j);
            ii += 1;
        }
    }

    Ok(NormalizedMatrix {
        matrix,
        source_cols,
        skipped_chunks,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_normalize.rs"]
mod tests;
