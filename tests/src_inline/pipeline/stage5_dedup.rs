use super::*;

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_duplicates_merge_into_first() {
    let mut m = DenseMatrix::from_row_major(
        4,
        2,
        &[
            1.0, 2.0, //
            10.0, 20.0, //
            100.0, 200.0, //
            5.0, 5.0,
        ],
    )
    .unwrap();
    let out = merge_duplicate_genes(&mut m, &names(&["Foo", "Bar", "Foo", "Foo"]));
    assert_eq!(out.discard, vec![false, false, true, true]);
    assert_eq!(m.row(0), vec![106.0, 207.0]);
    assert_eq!(m.row(1), vec![10.0, 20.0]);
    assert_eq!(
        out.summary,
        DedupSummary {
            unresolved: 0,
            merged_groups: 1,
            merged_rows: 2,
            kept: 2
        }
    );
}

#[test]
fn test_unresolved_rows_dropped_unmerged() {
    let mut m = DenseMatrix::from_row_major(4, 1, &[1.0, 2.0, 3.0, 4.0]).unwrap();
    let out = merge_duplicate_genes(&mut m, &names(&["Foo", "Foo", "nan", "nan"]));
    assert_eq!(out.discard, vec![false, true, true, true]);
    assert_eq!(m.row(0), vec![3.0]);
    assert_eq!(m.row(2), vec![3.0]);
    assert_eq!(out.summary.unresolved, 2);
    assert_eq!(out.summary.merged_groups, 1);
    assert_eq!(out.summary.kept, 1);
}

#[test]
fn test_single_unresolved_row_dropped() {
    let mut m = DenseMatrix::from_row_major(2, 1, &[1.0, 2.0]).unwrap();
    let out = merge_duplicate_genes(&mut m, &names(&["nan", "Actb"]));
    assert_eq!(out.discard, vec![true, false]);
    assert_eq!(out.summary.kept, 1);
}

#[test]
fn test_names_differing_in_whitespace_stay_separate() {
    let mut m = DenseMatrix::from_row_major(2, 1, &[1.0, 2.0]).unwrap();
    let row_names: Vec<String> = ["Foo", "Foo "]
        .iter()
        .map(|n| crate::model::features::resolve_name(n).to_string())
        .collect();
    let out = merge_duplicate_genes(&mut m, &row_names);
    assert_eq!(out.discard, vec![false, false]);
    assert_eq!(out.summary.merged_groups, 0);
    assert_eq!(m.row(0), vec![1.0]);
    assert_eq!(m.row(1), vec![2.0]);
}
