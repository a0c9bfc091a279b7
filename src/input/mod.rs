use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod counts;
pub mod features;
pub mod io;
pub mod keepset;
pub mod samplesheet;
pub mod table;

pub const DATASET_VERSIONS: &[&str] = &["20190325", "20190513", "20190620", "20190828"];
pub const DEFAULT_DATA_ROOT: &str = "../../data/sequencing/datasets";

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("unresolved category: {0}")]
    UnresolvedCategory(String),
}

#[derive(Debug, Clone)]
pub struct DatasetPaths {
    pub dir: PathBuf,
}

impl DatasetPaths {
    pub fn new(data_root: &Path, version: &str) -> Self {
        Self {
            dir: data_root.join(format!("all_{version}")),
        }
    }

    pub fn from_dir(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn counts(&self) -> Result<PathBuf, InputError> {
        find_first(&self.dir, &["counts.tsv", "counts.tsv.gz"])
    }

    pub fn featuresheet(&self) -> Result<PathBuf, InputError> {
        find_first(&self.dir, &["featuresheet.tsv", "featuresheet.tsv.gz"])
    }

    pub fn samplesheet(&self) -> PathBuf {
        self.dir.join("samplesheet.tsv")
    }

    pub fn raw_store(&self) -> PathBuf {
        self.dir.join("raw.kstore")
    }

    pub fn good_cells(&self) -> PathBuf {
        self.dir.join("good_cells.tsv")
    }

    pub fn good_genes(&self) -> PathBuf {
        self.dir.join("good_genes.tsv")
    }

    pub fn good_store(&self) -> PathBuf {
        self.dir.join("good.kstore")
    }

    pub fn stats_json(&self) -> PathBuf {
        self.dir.join("filter_stats.json")
    }
}

fn find_first(dir: &Path, candidates: &[&str]) -> Result<PathBuf, InputError> {
    for name in candidates {
        let path = dir.join(name);
        if path.exists() {
            return Ok(path);
        }
    }
    Err(InputError::MissingInput(format!(
        "none of {} found in {}",
        candidates.join(", "),
        dir.display()
    )))
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
