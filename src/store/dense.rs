/// Dense f32 matrix stored column-major: one contiguous slice per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f32>,
}

impl DenseMatrix {
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            data: vec![0.0; n_rows * n_cols],
        }
    }

    pub fn from_column_major(n_rows: usize, n_cols: usize, data: Vec<f32>) -> Option<Self> {
        if data.len() != n_rows * n_cols {
            return None;
        }
        Some(Self {
            n_rows,
            n_cols,
            data,
        })
    }

    pub fn from_row_major(n_rows: usize, n_cols: usize, values: &[f32]) -> Option<Self> {
        if values.len() != n_rows * n_cols {
            return None;
        }
        let mut out = Self::zeros(n_rows, n_cols);
        for row in 0..n_rows {
            for col in 0..n_cols {
                out.data[col * n_rows + row] = values[row * n_cols + col];
            }
        }
        Some(out)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[col * self.n_rows + row]
    }

    pub fn column(&self, col: usize) -> &[f32] {
        let start = col * self.n_rows;
        &self.data[start..start + self.n_rows]
    }

    pub fn column_mut(&mut self, col: usize) -> &mut [f32] {
        let start = col * self.n_rows;
        &mut self.data[start..start + self.n_rows]
    }

    pub fn row(&self, row: usize) -> Vec<f32> {
        (0..self.n_cols).map(|col| self.get(row, col)).collect()
    }

    pub fn add_row_into(&mut self, dst: usize, src: usize) {
        for col in 0..self.n_cols {
            let base = col * self.n_rows;
            self.data[base + dst] += self.data[base + src];
        }
    }

    pub fn select_rows(&self, rows: &[usize]) -> DenseMatrix {
        let mut out = Self::zeros(rows.len(), self.n_cols);
        for col in 0..self.n_cols {
            let src = self.column(col);
            let dst = out.column_mut(col);
            for (i, &r) in rows.iter().enumerate() {
                dst[i] = src[r];
            }
        }
        out
    }

    pub fn column_range(&self, start: usize, end: usize) -> &[f32] {
        &self.data[start * self.n_rows..end * self.n_rows]
    }
}
