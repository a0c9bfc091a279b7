pub const SAFE_GENES_V1: &[&str] = &[
    "Mcpt4", "Mcpt2", "Mcpt9", "Cma2", "Tpsb2", "Tpsab1", "Cma1", "Adamts9",
];

#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub min_coverage: f64,
    pub min_genes_detected: u32,
    pub min_expression_nreads: f32,
    pub min_expressing_cells: u64,
    pub chunk_size: usize,
    pub safe_genes: Vec<String>,
    pub spikein_prefix: String,
    pub other_prefix: String,
    pub key_prefix: String,
    pub feature_key_column: String,
    pub cell_key_column: String,
    pub gene_name_column: String,
}

impl FilterConfig {
    pub fn default_v1() -> Self {
        Self {
            min_coverage: 50_000.0,
            min_genes_detected: 400,
            min_expression_nreads: 5.0,
            min_expressing_cells: 10,
            chunk_size: 400,
            safe_genes: SAFE_GENES_V1.iter().map(|s| s.to_string()).collect(),
            spikein_prefix: "ERCC-".to_string(),
            other_prefix: "__".to_string(),
            key_prefix: "gene:".to_string(),
            feature_key_column: "FeatureID".to_string(),
            cell_key_column: "CellID".to_string(),
            gene_name_column: "GeneName".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be positive".to_string());
        }
        if !self.min_coverage.is_finite() || self.min_coverage < 0.0 {
            return Err(format!("invalid min_coverage: {}", self.min_coverage));
        }
        if !self.min_expression_nreads.is_finite() {
            return Err("min_expression_nreads must be finite".to_string());
        }
        if self.spikein_prefix.is_empty() || self.other_prefix.is_empty() {
            return Err("feature class prefixes must be non-empty".to_string());
        }
        Ok(())
    }

    pub fn is_safe_gene(&self, name: &str) -> bool {
        self.safe_genes.iter().any(|g| g == name)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::default_v1()
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/thresholds.rs"]
mod tests;
