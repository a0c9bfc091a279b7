use std::io::BufRead;
use std::path::Path;

use crate::input::InputError;
use crate::input::io::open_maybe_gz;
use crate::store::DenseMatrix;

#[derive(Debug, Clone)]
pub struct CountsTable {
    pub index_name: String,
    pub feature_keys: Vec<String>,
    pub cell_ids: Vec<String>,
    pub matrix: DenseMatrix,
}

pub fn read_cell_ids(path: &Path) -> Result<Vec<String>, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();
    if reader.read_line(&mut buf)? == 0 {
        return Err(InputError::Parse("counts table is empty".to_string()));
    }
    Ok(parse_header(&buf).1)
}

fn parse_header(line: &str) -> (String, Vec<String>) {
    let mut fields = line.trim_end_matches(['\n', '\r']).split('\t');
    let index_name = fields.next().unwrap_or("").to_string();
    (index_name, fields.map(|s| s.to_string()).collect())
}

pub fn read_counts_tsv(path: &Path) -> Result<CountsTable, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();

    if reader.read_line(&mut buf)? == 0 {
        return Err(InputError::Parse("counts table is empty".to_string()));
    }
    let (index_name, cell_ids) = parse_header(&buf);
    if cell_ids.is_empty() {
        return Err(InputError::Parse(
            "counts table header lists no cells".to_string(),
        ));
    }
    let n_cells = cell_ids.len();

    let mut feature_keys = Vec::new();
    let mut values: Vec<f32> = Vec::new();
    let mut line_no = 1usize;
    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let key = fields.next().unwrap_or("").to_string();
        let mut n = 0usize;
        for raw in fields {
            let v: f32 = raw.trim().parse().map_err(|_| {
                InputError::Parse(format!(
                    "invalid count {:?} at line {} (feature {})",
                    raw, line_no, key
                ))
            })?;
            if !v.is_finite() || v < 0.0 {
                return Err(InputError::Parse(format!(
                    "count must be finite and non-negative at line {}",
                    line_no
                )));
            }
            values.push(v);
            n += 1;
        }
        if n != n_cells {
            return Err(InputError::Parse(format!(
                "line {} has {} counts, header lists {} cells",
                line_no, n, n_cells
            )));
        }
        feature_keys.push(key);
    }

    let matrix = DenseMatrix::from_row_major(feature_keys.len(), n_cells, &values)
        .ok_or_else(|| InputError::Parse("counts table is ragged".to_string()))?;
    Ok(CountsTable {
        index_name,
        feature_keys,
        cell_ids,
        matrix,
    })
}
