use crate::input::InputError;
use crate::model::annotations::AnnotationTable;

pub mod dense;
pub mod kstore;
pub mod memory;

pub use dense::DenseMatrix;
pub use kstore::{MatrixStore, write_store};
pub use memory::MemoryStore;

pub trait ChunkedMatrixSource {
    /// `(n_features, n_samples)`.
    fn shape(&self) -> (usize, usize);
    fn row_annotations(&self) -> &AnnotationTable;
    fn column_annotations(&self) -> &AnnotationTable;
    fn read_columns(&self, start: usize, end: usize) -> Result<DenseMatrix, InputError>;
    fn read_columns_rows(
        &self,
        rows: &[usize],
        start: usize,
        end: usize,
    ) -> Result<DenseMatrix, InputError>;
}

pub fn column_chunks(n_cols: usize, chunk_size: usize) -> impl Iterator<Item = (usize, usize)> {
    let step = chunk_size.max(1);
    (0..n_cols.div_ceil(step)).map(move |ig| {
        let start = ig * step;
        (start, (start + step).min(n_cols))
    })
}

pub(crate) fn check_range(
    shape: (usize, usize),
    rows: Option<&[usize]>,
    start: usize,
    end: usize,
) -> Result<(), InputError> {
    let (n_rows, n_cols) = shape;
    if start > end || end > n_cols {
        return Err(InputError::InvalidInput(format!(
            "column range {}..{} out of bounds for {} columns",
            start, end, n_cols
        )));
    }
    if let Some(rows) = rows {
        if let Some(&bad) = rows.iter().find(|&&r| r >= n_rows) {
            return Err(InputError::InvalidInput(format!(
                "row index {} out of bounds for {} rows",
                bad, n_rows
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/store/mod.rs"]
mod tests;
