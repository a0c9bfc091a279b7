use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::Compression;
use flate2::write::GzEncoder;

use super::counts::{read_cell_ids, read_counts_tsv};
use super::features::{load_featuresheet, truncate_column_name};
use super::io::{open_maybe_gz, write_atomic};
use super::keepset::{read_keepset, render_keepset, resolve_positions, write_keepset};
use super::samplesheet::{infer_sample, make_samplesheet};
use super::table::{IndexedTable, read_tsv_table, render_tsv_table};
use super::*;
use crate::model::thresholds::FilterConfig;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_scingest_input_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(path: &Path, contents: &str) {
    let mut f = BufWriter::new(File::create(path).unwrap());
    f.write_all(contents.as_bytes()).unwrap();
}

fn write_gz(path: &Path, contents: &str) {
    let mut enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    enc.write_all(contents.as_bytes()).unwrap();
    enc.finish().unwrap();
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_dataset_paths_layout() {
    let paths = DatasetPaths::new(Path::new("/data"), "20190828");
    assert_eq!(paths.dir, PathBuf::from("/data/all_20190828"));
    assert_eq!(paths.raw_store(), PathBuf::from("/data/all_20190828/raw.kstore"));
    assert_eq!(paths.good_cells(), PathBuf::from("/data/all_20190828/good_cells.tsv"));
    assert_eq!(paths.good_genes(), PathBuf::from("/data/all_20190828/good_genes.tsv"));
    assert!(DATASET_VERSIONS.contains(&"20190828"));
}

#[test]
fn test_dataset_paths_find_gz_counts() {
    let dir = make_temp_dir();
    let paths = DatasetPaths::from_dir(&dir);
    assert!(matches!(paths.counts(), Err(InputError::MissingInput(_))));
    write_gz(&dir.join("counts.tsv.gz"), "FeatureID\tc\n");
    assert_eq!(paths.counts().unwrap(), dir.join("counts.tsv.gz"));
    write_file(&dir.join("counts.tsv"), "FeatureID\tc\n");
    assert_eq!(paths.counts().unwrap(), dir.join("counts.tsv"));
}

#[test]
fn test_open_maybe_gz_reads_both() {
    let dir = make_temp_dir();
    let plain = dir.join("a.tsv");
    let gz = dir.join("a.tsv.gz");
    write_file(&plain, "x\ty\n");
    write_gz(&gz, "x\ty\n");
    for path in [plain, gz] {
        let mut text = String::new();
        open_maybe_gz(&path).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "x\ty\n");
    }
}

#[test]
fn test_write_atomic_creates_parent() {
    let dir = make_temp_dir();
    let path = dir.join("nested").join("out.txt");
    write_atomic(&path, b"hello").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    assert!(!io::tmp_path_for(&path).exists());
}

#[test]
fn test_counts_parsing() {
    let dir = make_temp_dir();
    let path = dir.join("counts.tsv.gz");
    write_gz(
        &path,
        "FeatureID\tc1\tc2\ngene:g1\t1\t2\nERCC-1\t0\t5.5\n",
    );
    assert_eq!(read_cell_ids(&path).unwrap(), strings(&["c1", "c2"]));
    let counts = read_counts_tsv(&path).unwrap();
    assert_eq!(counts.index_name, "FeatureID");
    assert_eq!(counts.feature_keys, strings(&["gene:g1", "ERCC-1"]));
    assert_eq!(counts.matrix.shape(), (2, 2));
    assert_eq!(counts.matrix.get(1, 1), 5.5);
    assert_eq!(counts.matrix.column(0), &[1.0, 0.0]);
}

#[test]
fn test_counts_rejects_bad_values() {
    let dir = make_temp_dir();
    let ragged = dir.join("ragged.tsv");
    write_file(&ragged, "FeatureID\tc1\tc2\ng1\t1\n");
    assert!(matches!(read_counts_tsv(&ragged), Err(InputError::Parse(_))));

    let negative = dir.join("negative.tsv");
    write_file(&negative, "FeatureID\tc1\ng1\t-1\n");
    assert!(matches!(read_counts_tsv(&negative), Err(InputError::Parse(_))));

    let text = dir.join("text.tsv");
    write_file(&text, "FeatureID\tc1\ng1\tabc\n");
    assert!(matches!(read_counts_tsv(&text), Err(InputError::Parse(_))));
}

#[test]
fn test_tsv_table_infers_and_renders() {
    let dir = make_temp_dir();
    let path = dir.join("sheet.tsv");
    write_file(&path, "ID\tname\tlength\nr1\tFoo\t10\nr2\t\t2.5\n");
    let table = read_tsv_table(&path).unwrap();
    assert_eq!(table.index_name, "ID");
    assert_eq!(table.keys, strings(&["r1", "r2"]));
    assert_eq!(table.table.text("name").unwrap(), &strings(&["Foo", ""])[..]);
    assert_eq!(table.table.number("length").unwrap(), &[10.0, 2.5]);
    assert_eq!(
        render_tsv_table(&table),
        "ID\tname\tlength\nr1\tFoo\t10\nr2\t\t2.5\n"
    );
}

#[test]
fn test_featuresheet_prefix_and_renames() {
    let dir = make_temp_dir();
    let path = dir.join("featuresheet.tsv");
    write_file(
        &path,
        "EnsemblID\tGeneName\tChromosome/scaffold name\tGene start (bp)/x\n\
         gene:E1\tActb\t5\t100\n\
         gene:E2\tnan\tX\t200\n\
         ERCC-1\t\tERCC\t1\n",
    );
    let cfg = FilterConfig::default_v1();
    let sheet = load_featuresheet(&path, &cfg).unwrap();
    assert_eq!(sheet.keys, strings(&["E1", "E2", "ERCC-1"]));
    assert!(sheet.table.get("Chromosome").is_some());
    assert_eq!(
        sheet.resolved_names(&cfg).unwrap(),
        strings(&["Actb", "nan", "nan"])
    );
    assert!(sheet.check_matches(&strings(&["E1", "E2", "ERCC-1"])).is_ok());
    assert!(matches!(
        sheet.check_matches(&strings(&["E1", "E3", "ERCC-1"])),
        Err(InputError::SchemaMismatch(_))
    ));
    assert!(matches!(
        sheet.check_matches(&strings(&["E1"])),
        Err(InputError::SchemaMismatch(_))
    ));
    assert_eq!(truncate_column_name("Gene start (bp)/x"), "Gene start (bp)");
    assert_eq!(truncate_column_name("GeneName"), "GeneName");
}

#[test]
fn test_featuresheet_without_name_column() {
    let dir = make_temp_dir();
    let path = dir.join("featuresheet.tsv");
    write_file(&path, "EnsemblID\tBiotype\nE1\tprotein_coding\n");
    let cfg = FilterConfig::default_v1();
    let sheet = load_featuresheet(&path, &cfg).unwrap();
    assert!(matches!(
        sheet.resolved_names(&cfg),
        Err(InputError::SchemaMismatch(_))
    ));
}

#[test]
fn test_keepset_format_and_roundtrip() {
    let dir = make_temp_dir();
    let path = dir.join("good_cells.tsv");
    let keys = strings(&["c1", "c3"]);
    assert_eq!(render_keepset(&keys), "c1\nc3");
    write_keepset(&path, &keys).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "c1\nc3");
    assert_eq!(read_keepset(&path).unwrap(), keys);

    write_file(&path, "c1\r\n\nc3\n");
    assert_eq!(read_keepset(&path).unwrap(), keys);
}

#[test]
fn test_resolve_positions_order_and_errors() {
    let keys = strings(&["a", "b", "c"]);
    assert_eq!(
        resolve_positions(&keys, &strings(&["c", "a"]), "cell").unwrap(),
        vec![2, 0]
    );
    assert!(matches!(
        resolve_positions(&keys, &strings(&["z"]), "cell"),
        Err(InputError::SchemaMismatch(_))
    ));
    assert!(matches!(
        resolve_positions(&keys, &strings(&["a", "a"]), "cell"),
        Err(InputError::SchemaMismatch(_))
    ));
    assert!(matches!(
        resolve_positions(&strings(&["a", "a"]), &strings(&["a"]), "gene"),
        Err(InputError::SchemaMismatch(_))
    ));
}

#[test]
fn test_infer_sample_rules() {
    let rec = infer_sample("10X_P7_M_CD45_A1").unwrap();
    assert_eq!(rec.sort_type, "immune");
    assert_eq!(rec.gender, "M");
    assert_eq!(rec.timepoint, "P7");
    assert_eq!(rec.time_days, 7.0);
    assert_eq!(rec.mousename, "M_P7");
    assert_eq!(rec.treatment, "normal");
    assert_eq!(rec.well, "A1");

    let rec = infer_sample("Mesench_Cornfield_F_FE18_B3").unwrap();
    assert_eq!(rec.sort_type, "mesenchymal");
    assert_eq!(rec.gender, "F");
    assert_eq!(rec.timepoint, "E18.5");
    assert_eq!(rec.time_days, -1.0);
    assert_eq!(rec.well, "B3");
}

#[test]
fn test_infer_sample_unresolved() {
    let err = infer_sample("plate1_A1").unwrap_err();
    assert!(matches!(err, InputError::UnresolvedCategory(_)));
    assert!(err.to_string().contains("SortType not found: plate1_A1"));

    let err = infer_sample("CD31_X_A1").unwrap_err();
    assert!(err.to_string().contains("Gender not found"));

    let err = infer_sample("CD31_F_P3_A1").unwrap_err();
    assert!(err.to_string().contains("Timepoint not found"));
}

#[test]
fn test_make_samplesheet_columns() {
    let ids = strings(&["CD31_P21_F_C7", "CD45_P1_M_D2"]);
    let sheet = make_samplesheet(&ids).unwrap();
    assert_eq!(
        sheet.column_names(),
        vec![
            "Timepoint",
            "Mousename",
            "Gender",
            "SortType",
            "Time [days]",
            "Treatment",
            "Well"
        ]
    );
    assert_eq!(sheet.number("Time [days]").unwrap(), &[21.0, 1.0]);
    assert_eq!(
        sheet.text("SortType").unwrap(),
        &strings(&["endothelial", "immune"])[..]
    );

    let written = IndexedTable {
        index_name: "CellID".to_string(),
        keys: ids,
        table: sheet,
    };
    let rendered = render_tsv_table(&written);
    assert!(rendered.starts_with("CellID\tTimepoint\tMousename\t"));
    assert!(rendered.contains("CD31_P21_F_C7\tP21\tF_P21\tF\tendothelial\t21\tnormal\tC7\n"));
    assert!(matches!(
        make_samplesheet(&strings(&["nothing"])),
        Err(InputError::UnresolvedCategory(_))
    ));
}
