use std::io::BufRead;
use std::path::Path;

use crate::input::InputError;
use crate::input::io::{open_maybe_gz, write_atomic};
use crate::model::annotations::{AnnotationTable, AnnotationValues};

#[derive(Debug, Clone)]
pub struct IndexedTable {
    pub index_name: String,
    pub keys: Vec<String>,
    pub table: AnnotationTable,
}

pub fn read_tsv_table(path: &Path) -> Result<IndexedTable, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();

    if reader.read_line(&mut buf)? == 0 {
        return Err(InputError::Parse(format!("{} is empty", path.display())));
    }
    let header: Vec<String> = buf
        .trim_end_matches(['\n', '\r'])
        .split('\t')
        .map(|s| s.to_string())
        .collect();
    let index_name = header[0].clone();
    let names = &header[1..];

    let mut keys = Vec::new();
    let mut raw_cols: Vec<Vec<String>> = vec![Vec::new(); names.len()];
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
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() > header.len() {
            return Err(InputError::Parse(format!(
                "{} line {} has {} fields, header has {}",
                path.display(),
                line_no,
                fields.len(),
                header.len()
            )));
        }
        keys.push(fields[0].to_string());
        for (idx, col) in raw_cols.iter_mut().enumerate() {
            col.push(fields.get(idx + 1).copied().unwrap_or("").to_string());
        }
    }

    let mut table = AnnotationTable::new();
    for (name, raw) in names.iter().zip(raw_cols) {
        table.insert(name, AnnotationValues::infer(raw));
    }
    Ok(IndexedTable {
        index_name,
        keys,
        table,
    })
}

pub fn render_tsv_table(data: &IndexedTable) -> String {
    let mut out = String::new();
    out.push_str(&data.index_name);
    for name in data.table.column_names() {
        out.push('\t');
        out.push_str(name);
    }
    out.push('\n');
    for (row, key) in data.keys.iter().enumerate() {
        out.push_str(key);
        for col in &data.table.columns {
            out.push('\t');
            out.push_str(&col.values.render(row));
        }
        out.push('\n');
    }
    out
}

pub fn write_tsv_table(path: &Path, data: &IndexedTable) -> Result<(), InputError> {
    write_atomic(path, render_tsv_table(data).as_bytes())
}
