use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_scingest_checkpoint_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn keys(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_computes_and_persists_when_missing() {
    let path = make_temp_dir().join("good_cells.tsv");
    let cp = load_or_compute_keepset(&path, false, "cell", || Ok(keys(&["a", "b"]))).unwrap();
    assert!(!cp.reused);
    assert_eq!(cp.keys, keys(&["a", "b"]));
    assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb");
}

#[test]
fn test_existing_file_is_reused_without_computing() {
    let path = make_temp_dir().join("good_cells.tsv");
    fs::write(&path, "x\ny\n").unwrap();
    let called = Cell::new(false);
    let cp = load_or_compute_keepset(&path, false, "cell", || {
        called.set(true);
        Ok(keys(&["a"]))
    })
    .unwrap();
    assert!(cp.reused);
    assert!(!called.get());
    assert_eq!(cp.keys, keys(&["x", "y"]));
    assert_eq!(fs::read_to_string(&path).unwrap(), "x\ny\n");
}

#[test]
fn test_force_overwrites_existing_file() {
    let path = make_temp_dir().join("good_genes.tsv");
    fs::write(&path, "old").unwrap();
    let cp = load_or_compute_keepset(&path, true, "gene", || Ok(keys(&["g1", "g2"]))).unwrap();
    assert!(!cp.reused);
    assert_eq!(cp.keys, keys(&["g1", "g2"]));
    assert_eq!(fs::read_to_string(&path).unwrap(), "g1\ng2");
}

#[test]
fn test_keys_come_back_from_disk() {
    let path = make_temp_dir().join("good_genes.tsv");
    // empty keys do not survive the file round trip
    let cp = load_or_compute_keepset(&path, false, "gene", || Ok(keys(&["g1", "", "g2"]))).unwrap();
    assert_eq!(cp.keys, keys(&["g1", "g2"]));
    assert_eq!(fs::read_to_string(&path).unwrap(), "g1\n\ng2");
}

#[test]
fn test_compute_error_leaves_no_file() {
    let path = make_temp_dir().join("good_cells.tsv");
    let err = load_or_compute_keepset(&path, false, "cell", || {
        Err(PipelineError::Config("boom".to_string()))
    })
    .unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    assert!(!path.exists());
}
