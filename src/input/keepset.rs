use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::input::InputError;
use crate::input::io::write_atomic;

pub fn render_keepset(keys: &[String]) -> String {
    keys.join("\n")
}

pub fn write_keepset(path: &Path, keys: &[String]) -> Result<(), InputError> {
    write_atomic(path, render_keepset(keys).as_bytes())
}

pub fn read_keepset(path: &Path) -> Result<Vec<String>, InputError> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .split('\n')
        .map(|s| s.trim_end_matches('\r'))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect())
}

pub fn resolve_positions(
    keys: &[String],
    selected: &[String],
    what: &str,
) -> Result<Vec<usize>, InputError> {
    let mut lookup: HashMap<&str, usize> = HashMap::with_capacity(keys.len());
    for (idx, key) in keys.iter().enumerate() {
        if lookup.insert(key.as_str(), idx).is_some() {
            return Err(InputError::SchemaMismatch(format!(
                "duplicate {} key {}",
                what, key
            )));
        }
    }
    let mut seen = vec![false; keys.len()];
    let mut out = Vec::with_capacity(selected.len());
    for key in selected {
        let idx = *lookup.get(key.as_str()).ok_or_else(|| {
            InputError::SchemaMismatch(format!("{} keep-set lists unknown key {}", what, key))
        })?;
        if seen[idx] {
            return Err(InputError::SchemaMismatch(format!(
                "{} keep-set lists {} twice",
                what, key
            )));
        }
        seen[idx] = true;
        out.push(idx);
    }
    Ok(out)
}
