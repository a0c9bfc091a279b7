use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::input::counts::{read_cell_ids, read_counts_tsv};
use crate::input::features::{FeatureSheet, load_featuresheet};
use crate::input::io::write_atomic;
use crate::input::keepset::resolve_positions;
use crate::input::samplesheet::make_samplesheet;
use crate::input::table::{IndexedTable, write_tsv_table};
use crate::input::{DatasetPaths, InputError};
use crate::model::annotations::{AnnotationTable, AnnotationValues};
use crate::model::features::{count_classes, mapped_rows};
use crate::model::thresholds::FilterConfig;
use crate::report::{FilterStats, collect_stats, render_stats_json, render_stats_table};
use crate::store::{ChunkedMatrixSource, MatrixStore, MemoryStore, write_store};

pub mod checkpoint;
pub mod stage1_ingest;
pub mod stage2_cells;
pub mod stage3_genes;
pub mod stage4_normalize;
pub mod stage5_dedup;
pub mod stage6_output;
pub mod stage7_verify;

use checkpoint::load_or_compute_keepset;
use stage1_ingest::build_raw_store;
use stage2_cells::{compute_cell_stats, select_cells};
use stage3_genes::{count_expressing_cells, select_genes};
use stage4_normalize::{NormalizeInputs, normalize_cpm};
use stage5_dedup::{DedupSummary, merge_duplicate_genes};
use stage6_output::{OutputParts, assemble_output};
use stage7_verify::{VerifySummary, verify_filtered};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry: bool,
    pub force: bool,
}

pub fn with_store<T, F>(path: &Path, f: F) -> Result<T, PipelineError>
where
    F: FnOnce(&MatrixStore) -> Result<T, PipelineError>,
{
    let store = MatrixStore::open(path)?;
    let (n_rows, n_cols) = store.shape();
    debug!(
        path = %path.display(),
        n_rows,
        n_cols,
        annotation_bytes = store.header().annotations_bytes,
        "opened store"
    );
    let result = f(&store);
    drop(store);
    debug!(path = %path.display(), "closed store");
    result
}

fn key_column(
    table: &AnnotationTable,
    name: &str,
    what: &str,
) -> Result<Vec<String>, InputError> {
    table.strings(name).ok_or_else(|| {
        InputError::SchemaMismatch(format!("store has no {} key annotation {}", what, name))
    })
}

pub fn run_ingest(
    paths: &DatasetPaths,
    config: &FilterConfig,
    opts: RunOptions,
) -> Result<MemoryStore, PipelineError> {
    config.validate().map_err(PipelineError::Config)?;
    let counts_path = paths.counts()?;

    info!("make samplesheet");
    let cell_ids = read_cell_ids(&counts_path)?;
    let samples = make_samplesheet(&cell_ids)?;

    info!(path = %counts_path.display(), "load counts");
    let counts = read_counts_tsv(&counts_path)?;
    debug!(
        index = %counts.index_name,
        n_features = counts.feature_keys.len(),
        "counts parsed"
    );
    if counts.cell_ids != cell_ids {
        return Err(InputError::SchemaMismatch(
            "counts header changed while reading".to_string(),
        )
        .into());
    }

    info!("load featuresheet");
    let featuresheet = load_featuresheet(&paths.featuresheet()?, config)?;
    let sheet = IndexedTable {
        index_name: config.cell_key_column.clone(),
        keys: cell_ids,
        table: samples.clone(),
    };
    let store = build_raw_store(counts, &featuresheet, samples, config)?;

    if !opts.dry {
        write_tsv_table(&paths.samplesheet(), &sheet)?;
        info!(path = %paths.samplesheet().display(), "saved samplesheet");
    }
    let (n_features, n_cells) = store.shape();
    info!(n_features, n_cells, "raw dataset assembled");
    if !opts.dry {
        write_store(&paths.raw_store(), &store, config.chunk_size)?;
        info!(path = %paths.raw_store().display(), "saved raw store");
    }
    Ok(store)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterReport {
    pub n_features_raw: usize,
    pub n_cells_raw: usize,
    pub n_good_cells: usize,
    pub n_good_genes: usize,
    pub cells_reused: bool,
    pub genes_reused: bool,
    pub skipped_chunks: usize,
    pub dedup: DedupSummary,
}

#[derive(Debug, Clone)]
pub struct KeepSetPaths {
    pub cells: PathBuf,
    pub genes: PathBuf,
}

pub fn filter_source(
    source: &dyn ChunkedMatrixSource,
    featuresheet: &FeatureSheet,
    keepsets: &KeepSetPaths,
    config: &FilterConfig,
    opts: RunOptions,
) -> Result<(MemoryStore, FilterReport), PipelineError> {
    config.validate().map_err(PipelineError::Config)?;
    let (n_features, n_cells) = source.shape();

    let feature_keys = key_column(source.row_annotations(), &config.feature_key_column, "row")?;
    featuresheet.check_matches(&feature_keys)?;
    // Fails before any keep-set is written.
    let names = featuresheet.resolved_names(config)?;
    let cell_keys = key_column(
        source.column_annotations(),
        &config.cell_key_column,
        "column",
    )?;
    let mut samples = source.column_annotations().clone();
    samples.remove(&config.cell_key_column);

    info!(n_cells, "total cells before filtering");
    info!(n_features, "total features before filtering");
    let classes = count_classes(&feature_keys, config);
    info!(
        spikeins = classes.spikein,
        other = classes.other,
        "set spikeins and other features"
    );

    let mapped = mapped_rows(&feature_keys, config);
    let stats = compute_cell_stats(source, &mapped, config.chunk_size)?;
    samples.insert(
        "coverage",
        AnnotationValues::Number(stats.coverage.clone()),
    );
    samples.insert(
        "number_of_genes_1plusreads",
        AnnotationValues::Number(stats.genes_detected.iter().map(|&n| n as f64).collect()),
    );

    info!("select decently expressing cells");
    let cells = load_or_compute_keepset(&keepsets.cells, opts.force, "cell", || {
        Ok(select_cells(&cell_keys, &stats, config))
    })?;
    info!(n = cells.keys.len(), "number of decent cells");
    let cell_positions = resolve_positions(&cell_keys, &cells.keys, "cell")?;
    let mut cell_cols = cell_positions.clone();
    cell_cols.sort_unstable();

    info!("select decently expressed genes");
    let genes = load_or_compute_keepset(
        &keepsets.genes,
        opts.force || !cells.reused,
        "gene",
        || {
            let cells_expressing = count_expressing_cells(source, &cell_cols, config)?;
            Ok(select_genes(
                &feature_keys,
                &names,
                &cells_expressing,
                config,
            ))
        },
    )?;
    info!(n = genes.keys.len(), "number of decent genes");
    let mut gene_rows = resolve_positions(&feature_keys, &genes.keys, "gene")?;
    gene_rows.sort_unstable();

    info!("restrict and normalize data");
    let normalized = normalize_cpm(
        source,
        &NormalizeInputs {
            gene_rows: &gene_rows,
            cell_cols: &cell_cols,
            coverage: &stats.coverage,
            chunk_size: config.chunk_size,
        },
    )?;
    if normalized.source_cols != cell_positions {
        // Matrix columns follow source order, column annotations follow keep-set order.
        warn!("cell keep-set is not in source order; output columns are written in source order");
    }

    info!("merge genes sharing a name, drop unnamed genes");
    let row_names: Vec<String> = gene_rows.iter().map(|&r| names[r].clone()).collect();
    let mut matrix = normalized.matrix;
    let dedup = merge_duplicate_genes(&mut matrix, &row_names);
    info!(
        unresolved = dedup.summary.unresolved,
        merged_groups = dedup.summary.merged_groups,
        merged_rows = dedup.summary.merged_rows,
        kept = dedup.summary.kept,
        "gene deduplication"
    );

    let output = assemble_output(OutputParts {
        matrix,
        gene_rows: &gene_rows,
        discard: &dedup.discard,
        feature_keys: &feature_keys,
        featuresheet,
        samples: &samples,
        cell_keys: &cell_keys,
        cell_positions: &cell_positions,
        config,
    })?;

    let report = FilterReport {
        n_features_raw: n_features,
        n_cells_raw: n_cells,
        n_good_cells: cells.keys.len(),
        n_good_genes: genes.keys.len(),
        cells_reused: cells.reused,
        genes_reused: genes.reused,
        skipped_chunks: normalized.skipped_chunks,
        dedup: dedup.summary,
    };
    Ok((output, report))
}

pub fn run_filter(
    paths: &DatasetPaths,
    config: &FilterConfig,
    opts: RunOptions,
) -> Result<FilterReport, PipelineError> {
    info!("load featuresheet");
    let featuresheet = load_featuresheet(&paths.featuresheet()?, config)?;
    let keepsets = KeepSetPaths {
        cells: paths.good_cells(),
        genes: paths.good_genes(),
    };

    info!(path = %paths.raw_store().display(), "load raw store");
    let (output, report) = with_store(&paths.raw_store(), |store| {
        filter_source(store, &featuresheet, &keepsets, config, opts)
    })?;

    if !opts.dry {
        write_store(&paths.good_store(), &output, config.chunk_size)?;
        info!(path = %paths.good_store().display(), "saved filtered store");
    }
    Ok(report)
}

pub fn run_verify(
    paths: &DatasetPaths,
    config: &FilterConfig,
) -> Result<VerifySummary, PipelineError> {
    info!(path = %paths.good_store().display(), "load filtered store");
    let summary = with_store(&paths.good_store(), |store| {
        Ok(verify_filtered(store, config)?)
    })?;
    info!(
        n_features = summary.n_features,
        n_cells = summary.n_cells,
        spikeins = summary.n_spikeins,
        other = summary.n_other,
        nonfinite = summary.n_nonfinite,
        min_column_sum = summary.min_column_sum,
        max_column_sum = summary.max_column_sum,
        "filtered store verified"
    );
    if summary.n_spikeins > 0 || summary.n_other > 0 {
        warn!("spike-in or other features survived filtering");
    }
    Ok(summary)
}

pub fn run_stats(
    paths: &DatasetPaths,
    config: &FilterConfig,
    opts: RunOptions,
) -> Result<FilterStats, PipelineError> {
    let stats = with_store(&paths.raw_store(), |raw| {
        with_store(&paths.good_store(), |good| Ok(collect_stats(raw, good, config)))
    })?;
    print!("{}", render_stats_table(&stats));
    if !opts.dry {
        let json = render_stats_json(&stats).map_err(InputError::from)?;
        write_atomic(&paths.stats_json(), json.as_bytes())?;
    }
    Ok(stats)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/mod.rs"]
mod tests;
