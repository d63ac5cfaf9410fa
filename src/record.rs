//! Output rows and the table they are collected into.

use crate::extract::{EvaluationMetrics, FieldSet, KeyFields, Metric};

/// The identifying columns of a catalog run.
pub const IDENTITY_HEADER: [&str; 3] = ["title", "crn", "term"];

/// One course offering in one term, as named on its detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseIdentity {
    pub title: String,
    pub crn: String,
    pub term: String,
}

/// A single output row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseRecord(Vec<String>);

impl CourseRecord {
    pub fn from_identity(identity: &CourseIdentity) -> Self {
        Self(vec![
            identity.title.clone(),
            identity.crn.clone(),
            identity.term.clone(),
        ])
    }

    /// Start from columns copied unchanged from an input course list.
    pub fn from_passthrough(cells: Vec<String>) -> Self {
        Self(cells)
    }

    pub fn with_fields(mut self, fields: &FieldSet) -> Self {
        self.0.extend(
            fields
                .values()
                .iter()
                .map(|value| value.clone().unwrap_or_default()),
        );
        self
    }

    pub fn with_metrics(mut self, metrics: &EvaluationMetrics) -> Self {
        self.0.extend(metrics.values().iter().map(|value| match value {
            Some(v) => format!("{v:?}"),
            None => String::new(),
        }));
        self
    }

    /// Append `count` empty cells, for a course whose page could not be scraped.
    pub fn with_blanks(mut self, count: usize) -> Self {
        self.0.extend(std::iter::repeat_n(String::new(), count));
        self
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("row has {actual} columns but the header has {expected}")]
pub struct WidthMismatch {
    pub expected: usize,
    pub actual: usize,
}

/// Rows sharing one header, in the order they were scraped.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseTable {
    header: Vec<String>,
    rows: Vec<CourseRecord>,
}

impl CourseTable {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// Append a row, rejecting one whose width differs from the header.
    pub fn push(&mut self, record: CourseRecord) -> Result<(), WidthMismatch> {
        if record.len() != self.header.len() {
            return Err(WidthMismatch {
                expected: self.header.len(),
                actual: record.len(),
            });
        }
        self.rows.push(record);
        Ok(())
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[CourseRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Metric column names in chart order.
pub fn metric_header() -> impl Iterator<Item = String> {
    Metric::ALL.iter().map(|m| m.name().to_string())
}

/// Header for a catalog run: identity, key fields, then optionally metrics.
pub fn catalog_header(fields: &KeyFields, with_metrics: bool) -> Vec<String> {
    let mut header: Vec<String> = IDENTITY_HEADER.iter().map(|s| s.to_string()).collect();
    header.extend(fields.names().into_iter().map(str::to_string));
    if with_metrics {
        header.extend(metric_header());
    }
    header
}
