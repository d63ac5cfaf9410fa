//! Course detail page extraction.
//!
//! Course pages have no structured markup for their attributes. Each one is a
//! `Label: value` line inside one of two generic `div.col-lg-6` columns, so
//! fields are found by matching the text before the first colon against the
//! configured labels.

use html_scraper::{Html, Selector};
use indexmap::IndexSet;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::extract::{ExtractError, child_texts, split_label};
use crate::record::CourseIdentity;

/// Number of field columns on a course page.
const FIELD_CONTAINERS: usize = 2;

/// Position of the heading block among the page's `div.col-lg-12` elements.
const HEADING_INDEX: usize = 3;

/// Length of the subject and course number prefix of a heading, e.g. `COMP 140`.
const TITLE_LEN: usize = 8;

/// Ordered set of lowercase field labels to collect.
///
/// Position in this set is the column a value is written to, so it must stay in
/// lockstep with the output header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFields(IndexSet<String>);

impl KeyFields {
    /// Normalize `names` to trimmed lowercase, dropping blanks and repeats.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        Self(
            names
                .iter()
                .map(|name| name.as_ref().trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.0.get_index_of(label)
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(String::as_str).collect()
    }
}

/// Values extracted for each [`KeyFields`] entry, by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet(Vec<Option<String>>);

impl FieldSet {
    /// A set with every field unset.
    pub fn unset(len: usize) -> Self {
        Self(vec![None; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|v| v.as_deref())
    }

    /// Number of fields that were found on the page.
    pub fn found(&self) -> usize {
        self.0.iter().filter(|v| v.is_some()).count()
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.0
    }
}

/// Extract the configured fields from the first two field columns of a course page.
///
/// Labels that are not configured are ignored, and configured labels that never
/// appear stay unset. When a label appears twice, the later value wins.
pub fn extract_fields(html: &Html, fields: &KeyFields) -> Result<FieldSet, ExtractError> {
    let container_sel = Selector::parse("div.col-lg-6").unwrap();
    let mut values = FieldSet::unset(fields.len());
    let mut containers = 0;

    for container in html.select(&container_sel).take(FIELD_CONTAINERS) {
        containers += 1;
        for text in child_texts(container) {
            let Some((label, value)) = split_label(&text) else {
                continue;
            };
            if let Some(index) = fields.index_of(&label) {
                values.0[index] = Some(value.to_string());
            }
        }
    }

    if containers == 0 {
        return Err(ExtractError::MissingElement("field column"));
    }

    debug!(
        found = values.found(),
        wanted = fields.len(),
        "extracted course fields"
    );
    Ok(values)
}

/// Extract the title, CRN and term of the course page fetched from `url`.
///
/// The heading reads like `COMP 140 - COMPUTATIONAL THINKING (12345)`: the
/// title is its first eight characters and the CRN the trailing parenthesized
/// number. The term comes from the URL's `p_term` parameter.
pub fn extract_identity(html: &Html, url: &str) -> Result<CourseIdentity, ExtractError> {
    static CRN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d+)\)\s*$").unwrap());

    let heading_sel = Selector::parse("div.col-lg-12").unwrap();
    let heading_div = html
        .select(&heading_sel)
        .nth(HEADING_INDEX)
        .ok_or(ExtractError::MissingElement("course heading"))?;
    let heading = child_texts(heading_div)
        .into_iter()
        .next()
        .ok_or(ExtractError::MissingElement("course heading text"))?;
    let heading = heading.trim();

    let title: String = heading.chars().take(TITLE_LEN).collect();
    let crn = CRN_RE
        .captures(heading)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| ExtractError::MissingCrn {
            heading: heading.to_string(),
        })?;

    Ok(CourseIdentity {
        title: title.trim().to_string(),
        crn,
        term: term_from_url(url).ok_or(ExtractError::MissingTerm)?,
    })
}

/// The `p_term` query parameter of a portal URL.
pub fn term_from_url(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "p_term")
        .map(|(_, value)| value.trim().to_string())
        .filter(|term| !term.is_empty())
}
