use crate::input::InputError;
use crate::model::annotations::{AnnotationTable, AnnotationValues};

#[derive(Debug, Clone, Copy)]
struct CategoryRule {
    value: &'static str,
    patterns: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
struct TimepointRule {
    label: &'static str,
    days: f64,
    patterns: &'static [&'static str],
}

const SORT_TYPE_RULES: &[CategoryRule] = &[
    CategoryRule {
        value: "mesenchymal",
        patterns: &["Mesench", "mesench"],
    },
    CategoryRule {
        value: "immune",
        patterns: &["CD45"],
    },
    CategoryRule {
        value: "endothelial",
        patterns: &["CD31"],
    },
];

const GENDER_RULES: &[CategoryRule] = &[
    CategoryRule {
        value: "F",
        patterns: &["Cornfield_F", "_F_"],
    },
    CategoryRule {
        value: "M",
        patterns: &["Cornfield_M", "_M_"],
    },
];

const TIMEPOINT_RULES: &[TimepointRule] = &[
    TimepointRule {
        label: "E18.5",
        days: -1.0,
        patterns: &["_FE18", "_ME18", "E18_M_", "E18_F_"],
    },
    TimepointRule {
        label: "P1",
        days: 1.0,
        patterns: &["_FP1", "_MP1", "P1_M_", "P1_F_"],
    },
    TimepointRule {
        label: "P7",
        days: 7.0,
        patterns: &["_FP7", "_MP7", "P7_M_", "P7_F_"],
    },
    TimepointRule {
        label: "P21",
        days: 21.0,
        patterns: &["_FP21", "_MP21", "P21_M_", "P21_F_"],
    },
];

const TREATMENT: &str = "normal";

#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub timepoint: &'static str,
    pub mousename: String,
    pub gender: &'static str,
    pub sort_type: &'static str,
    pub time_days: f64,
    pub treatment: &'static str,
    pub well: String,
}

fn first_match(cell_id: &str, rules: &[CategoryRule]) -> Option<&'static str> {
    rules
        .iter()
        .find(|r| r.patterns.iter().any(|p| cell_id.contains(p)))
        .map(|r| r.value)
}

pub fn infer_sample(cell_id: &str) -> Result<SampleRecord, InputError> {
    let sort_type = first_match(cell_id, SORT_TYPE_RULES)
        .ok_or_else(|| InputError::UnresolvedCategory(format!("SortType not found: {cell_id}")))?;
    let gender = first_match(cell_id, GENDER_RULES)
        .ok_or_else(|| InputError::UnresolvedCategory(format!("Gender not found: {cell_id}")))?;
    let timepoint = TIMEPOINT_RULES
        .iter()
        .find(|r| r.patterns.iter().any(|p| cell_id.contains(p)))
        .ok_or_else(|| {
            InputError::UnresolvedCategory(format!("Timepoint not found: {cell_id}"))
        })?;
    let well = cell_id.rsplit('_').next().unwrap_or(cell_id).to_string();

    Ok(SampleRecord {
        timepoint: timepoint.label,
        mousename: format!("{}_{}", gender, timepoint.label),
        gender,
        sort_type,
        time_days: timepoint.days,
        treatment: TREATMENT,
        well,
    })
}

pub fn make_samplesheet(cell_ids: &[String]) -> Result<AnnotationTable, InputError> {
    let records = cell_ids
        .iter()
        .map(|id| infer_sample(id))
        .collect::<Result<Vec<_>, _>>()?;

    let mut table = AnnotationTable::new();
    table.insert("Timepoint", text_column(&records, |r| r.timepoint.to_string()));
    table.insert("Mousename", text_column(&records, |r| r.mousename.clone()));
    table.insert("Gender", text_column(&records, |r| r.gender.to_string()));
    table.insert("SortType", text_column(&records, |r| r.sort_type.to_string()));
    table.insert(
        "Time [days]",
        AnnotationValues::Number(records.iter().map(|r| r.time_days).collect()),
    );
    table.insert("Treatment", text_column(&records, |r| r.treatment.to_string()));
    table.insert("Well", text_column(&records, |r| r.well.clone()));
    Ok(table)
}

fn text_column(records: &[SampleRecord], f: impl Fn(&SampleRecord) -> String) -> AnnotationValues {
    AnnotationValues::Text(records.iter().map(f).collect())
}
