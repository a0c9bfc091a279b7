use super::*;

#[test]
fn test_default_v1_values() {
    let cfg = FilterConfig::default();
    assert_eq!(cfg.min_coverage, 50_000.0);
    assert_eq!(cfg.min_genes_detected, 400);
    assert_eq!(cfg.min_expression_nreads, 5.0);
    assert_eq!(cfg.min_expressing_cells, 10);
    assert_eq!(cfg.chunk_size, 400);
    assert_eq!(cfg.safe_genes.len(), 8);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_safe_gene_lookup_is_exact() {
    let cfg = FilterConfig::default_v1();
    assert!(cfg.is_safe_gene("Mcpt4"));
    assert!(cfg.is_safe_gene("Adamts9"));
    assert!(!cfg.is_safe_gene("mcpt4"));
    assert!(!cfg.is_safe_gene("Actb"));
}

#[test]
fn test_validate_rejects_zero_chunk() {
    let cfg = FilterConfig {
        chunk_size: 0,
        ..FilterConfig::default_v1()
    };
    assert!(cfg.validate().is_err());
}
