use crate::model::thresholds::FilterConfig;

pub const UNRESOLVED_NAME: &str = "nan";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureClass {
    Mapped,
    SpikeIn,
    Other,
}

pub fn classify_feature(key: &str, config: &FilterConfig) -> FeatureClass {
    if key.starts_with(config.spikein_prefix.as_str()) {
        FeatureClass::SpikeIn
    } else if key.starts_with(config.other_prefix.as_str()) {
        FeatureClass::Other
    } else {
        FeatureClass::Mapped
    }
}

pub fn mapped_rows(keys: &[String], config: &FilterConfig) -> Vec<usize> {
    keys.iter()
        .enumerate()
        .filter(|(_, key)| classify_feature(key, config) == FeatureClass::Mapped)
        .map(|(idx, _)| idx)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounts {
    pub mapped: usize,
    pub spikein: usize,
    pub other: usize,
}

pub fn count_classes(keys: &[String], config: &FilterConfig) -> ClassCounts {
    let mut counts = ClassCounts::default();
    for key in keys {
        match classify_feature(key, config) {
            FeatureClass::Mapped => counts.mapped += 1,
            FeatureClass::SpikeIn => counts.spikein += 1,
            FeatureClass::Other => counts.other += 1,
        }
    }
    counts
}

pub fn strip_key_prefix<'a>(key: &'a str, prefix: &str) -> &'a str {
    key.strip_prefix(prefix).unwrap_or(key)
}

// Names are compared exactly; only empty values and `nan` are unresolved.
pub fn resolve_name(raw: &str) -> &str {
    if raw.is_empty() || raw == UNRESOLVED_NAME {
        UNRESOLVED_NAME
    } else {
        raw
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/features.rs"]
mod tests;
