use super::*;

#[test]
fn test_cli_defaults() {
    let cli = Cli::try_parse_from(["kira-scingest", "--block", "2"]).unwrap();
    assert_eq!(cli.block, 2);
    assert!(!cli.dry);
    assert!(!cli.force);
    assert_eq!(cli.data_root, PathBuf::from(DEFAULT_DATA_ROOT));
    assert_eq!(cli.dataset_version, "20190828");
}

#[test]
fn test_cli_flags_and_version() {
    let cli = Cli::try_parse_from([
        "kira-scingest",
        "--block",
        "4",
        "--dry",
        "--force",
        "--data-root",
        "/tmp/data",
        "--version",
        "20190513",
    ])
    .unwrap();
    let opts = cli.options();
    assert!(opts.dry && opts.force);
    assert_eq!(cli.dataset_version, "20190513");
    assert_eq!(
        DatasetPaths::new(&cli.data_root, &cli.dataset_version).dir,
        PathBuf::from("/tmp/data/all_20190513")
    );
}

#[test]
fn test_cli_rejects_bad_values() {
    assert!(Cli::try_parse_from(["kira-scingest", "--block", "5"]).is_err());
    assert!(Cli::try_parse_from(["kira-scingest", "--block", "0"]).is_err());
    assert!(Cli::try_parse_from(["kira-scingest"]).is_err());
    assert!(
        Cli::try_parse_from(["kira-scingest", "--block", "1", "--version", "2020"]).is_err()
    );
}
