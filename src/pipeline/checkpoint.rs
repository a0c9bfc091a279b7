use std::path::Path;

use tracing::info;

use crate::input::keepset::{read_keepset, write_keepset};
use crate::pipeline::PipelineError;

#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub keys: Vec<String>,
    pub reused: bool,
}

pub fn load_or_compute_keepset<F>(
    path: &Path,
    force: bool,
    what: &str,
    compute: F,
) -> Result<Checkpoint, PipelineError>
where
    F: FnOnce() -> Result<Vec<String>, PipelineError>,
{
    if !force && path.exists() {
        let keys = read_keepset(path)?;
        info!(
            path = %path.display(),
            n = keys.len(),
            "reusing existing {} keep-set",
            what
        );
        return Ok(Checkpoint { keys, reused: true });
    }
    let keys = compute()?;
    write_keepset(path, &keys)?;
    info!(path = %path.display(), n = keys.len(), "wrote {} keep-set", what);
    let keys = read_keepset(path)?;
    Ok(Checkpoint {
        keys,
        reused: false,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/checkpoint.rs"]
mod tests;
