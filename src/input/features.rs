use std::path::Path;

use crate::input::InputError;
use crate::input::table::read_tsv_table;
use crate::model::annotations::AnnotationTable;
use crate::model::features::{resolve_name, strip_key_prefix};
use crate::model::thresholds::FilterConfig;

const COLUMN_RENAMES: &[(&str, &str)] = &[("Chromosome/scaffold name", "Chromosome")];

#[derive(Debug, Clone)]
pub struct FeatureSheet {
    pub keys: Vec<String>,
    pub table: AnnotationTable,
}

impl FeatureSheet {
    pub fn resolved_names(&self, config: &FilterConfig) -> Result<Vec<String>, InputError> {
        let raw = self.table.strings(&config.gene_name_column).ok_or_else(|| {
            InputError::SchemaMismatch(format!(
                "featuresheet has no {} column",
                config.gene_name_column
            ))
        })?;
        Ok(raw.iter().map(|s| resolve_name(s).to_string()).collect())
    }

    pub fn check_matches(&self, keys: &[String]) -> Result<(), InputError> {
        if self.keys.len() != keys.len() {
            return Err(InputError::SchemaMismatch(format!(
                "featuresheet has {} features, matrix has {}",
                self.keys.len(),
                keys.len()
            )));
        }
        if let Some((idx, (a, b))) = self
            .keys
            .iter()
            .zip(keys)
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            return Err(InputError::SchemaMismatch(format!(
                "featuresheet feature {} is {}, matrix has {}",
                idx, a, b
            )));
        }
        Ok(())
    }
}

pub fn load_featuresheet(path: &Path, config: &FilterConfig) -> Result<FeatureSheet, InputError> {
    let parsed = read_tsv_table(path)?;
    let keys = parsed
        .keys
        .iter()
        .map(|k| strip_key_prefix(k, &config.key_prefix).to_string())
        .collect();
    let mut table = parsed.table;
    for (from, to) in COLUMN_RENAMES {
        table.rename(from, to);
    }
    if parsed.keys.is_empty() {
        return Err(InputError::Parse(format!(
            "featuresheet {} has no features",
            path.display()
        )));
    }
    Ok(FeatureSheet { keys, table })
}

pub fn truncate_column_name(name: &str) -> &str {
    match name.find('/') {
        Some(pos) => &name[..pos],
        None => name,
    }
}
