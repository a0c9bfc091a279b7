use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum AnnotationValues {
    Number(Vec<f64>),
    Text(Vec<String>),
}

impl AnnotationValues {
    pub fn len(&self) -> usize {
        match self {
            AnnotationValues::Number(v) => v.len(),
            AnnotationValues::Text(v) => v.len(),
        }
    }

    pub fn select(&self, indices: &[usize]) -> AnnotationValues {
        match self {
            AnnotationValues::Number(v) => {
                AnnotationValues::Number(indices.iter().map(|&i| v[i]).collect())
            }
            AnnotationValues::Text(v) => {
                AnnotationValues::Text(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }

    pub fn render(&self, idx: usize) -> String {
        match self {
            AnnotationValues::Number(v) => format_number(v[idx]),
            AnnotationValues::Text(v) => v[idx].clone(),
        }
    }

    pub fn infer(raw: Vec<String>) -> AnnotationValues {
        let parsed: Option<Vec<f64>> = raw
            .iter()
            .map(|s| s.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
            .collect();
        match parsed {
            Some(values) if !values.is_empty() => AnnotationValues::Number(values),
            _ => AnnotationValues::Text(raw),
        }
    }
}

pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationColumn {
    pub name: String,
    pub values: AnnotationValues,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationTable {
    pub columns: Vec<AnnotationColumn>,
}

impl AnnotationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_records(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn check_lengths(&self, expected: usize) -> Result<(), String> {
        for col in &self.columns {
            if col.values.len() != expected {
                return Err(format!(
                    "annotation column {} has {} values, expected {}",
                    col.name,
                    col.values.len(),
                    expected
                ));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AnnotationValues> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.values)
    }

    pub fn text(&self, name: &str) -> Option<&[String]> {
        match self.get(name) {
            Some(AnnotationValues::Text(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<&[f64]> {
        match self.get(name) {
            Some(AnnotationValues::Number(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn strings(&self, name: &str) -> Option<Vec<String>> {
        let values = self.get(name)?;
        Some((0..values.len()).map(|i| values.render(i)).collect())
    }

    pub fn insert(&mut self, name: &str, values: AnnotationValues) {
        if let Some(col) = self.columns.iter_mut().find(|c| c.name == name) {
            col.values = values;
        } else {
            self.columns.push(AnnotationColumn {
                name: name.to_string(),
                values,
            });
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<AnnotationValues> {
        let pos = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(pos).values)
    }

    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(col) = self.columns.iter_mut().find(|c| c.name == from) {
            col.name = to.to_string();
        }
    }

    pub fn select(&self, indices: &[usize]) -> AnnotationTable {
        AnnotationTable {
            columns: self
                .columns
                .iter()
                .map(|c| AnnotationColumn {
                    name: c.name.clone(),
                    values: c.values.select(indices),
                })
                .collect(),
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/annotations.rs"]
mod tests;
