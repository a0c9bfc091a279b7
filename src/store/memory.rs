use crate::input::InputError;
use crate::model::annotations::AnnotationTable;
use crate::store::{ChunkedMatrixSource, DenseMatrix, check_range};

#[derive(Debug, Clone)]
pub struct MemoryStore {
    pub matrix: DenseMatrix,
    pub rows: AnnotationTable,
    pub cols: AnnotationTable,
}

impl MemoryStore {
    pub fn new(
        matrix: DenseMatrix,
        rows: AnnotationTable,
        cols: AnnotationTable,
    ) -> Result<Self, InputError> {
        rows.check_lengths(matrix.n_rows())
            .map_err(InputError::SchemaMismatch)?;
        cols.check_lengths(matrix.n_cols())
            .map_err(InputError::SchemaMismatch)?;
        Ok(Self { matrix, rows, cols })
    }
}

impl ChunkedMatrixSource for MemoryStore {
    fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    fn row_annotations(&self) -> &AnnotationTable {
        &self.rows
    }

    fn column_annotations(&self) -> &AnnotationTable {
        &self.cols
    }

    fn read_columns(&self, start: usize, end: usize) -> Result<DenseMatrix, InputError> {
        check_range(self.shape(), None, start, end)?;
        let data = self.matrix.column_range(start, end).to_vec();
        DenseMatrix::from_column_major(self.matrix.n_rows(), end - start, data)
            .ok_or_else(|| InputError::InvalidInput("column slice size mismatch".to_string()))
    }

    fn read_columns_rows(
        &self,
        rows: &[usize],
        start: usize,
        end: usize,
    ) -> Result<DenseMatrix, InputError> {
        check_range(self.shape(), Some(rows), start, end)?;
        let mut out = DenseMatrix::zeros(rows.len(), end - start);
        for (j, col) in (start..end).enumerate() {
            let src = self.matrix.column(col);
            let dst = out.column_mut(j);
            for (i, &r) in rows.iter().enumerate() {
                dst[i] = src[r];
            }
        }
        Ok(out)
    }
}
