use std::collections::HashMap;

use crate::model::features::UNRESOLVED_NAME;
use crate::store::DenseMatrix;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupSummary {
    pub unresolved: usize,
    pub merged_groups: usize,
    pub merged_rows: usize,
    pub kept: usize,
}

#[derive(Debug, Clone)]
pub struct DedupOutcome {
    pub discard: Vec<bool>,
    pub summary: DedupSummary,
}

/// `matrix` is modified in place; rows flagged in the returned mask still hold their
/// original values and are expected to be dropped by the caller.
pub fn merge_duplicate_genes(matrix: &mut DenseMatrix, names: &[String]) -> DedupOutcome {
    let mut discard: Vec<bool> = names.iter().map(|n| n == UNRESOLVED_NAME).collect();
    let mut summary = DedupSummary {
        unresolved: discard.iter().filter(|&&d| d).count(),
        ..DedupSummary::default()
    };

    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, name) in names.iter().enumerate() {
        groups
            .entry(name.as_str())
            .or_insert_with(|| {
                order.push(name.as_str());
                Vec::new()
            })
            .push(idx);
    }

    for name in order {
        let members = &groups[name];
        if members.len() < 2 {
            continue;
        }
        if name == UNRESOLVED_NAME {
            for &i in members {
                discard[i] = true;
            }
            continue;
        }
        let first = members[0];
        for &i in &members[1..] {
            matrix.add_row_into(first, i);
            discard[i] = true;
        }
        summary.merged_groups += 1;
        summary.merged_rows += members.len() - 1;
    }

    summary.kept = discard.iter().filter(|&&d| !d).count();
    DedupOutcome { discard, summary }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_dedup.rs"]
mod tests;
