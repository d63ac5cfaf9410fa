//! HTML extraction for catalog, course detail and evaluation pages.
//!
//! Everything here is a pure function of a parsed document. Fetching and
//! retrying live in the pipeline.

pub mod catalog;
pub mod evaluation;
pub mod fields;

use html_scraper::ElementRef;

pub use catalog::extract_course_links;
pub use evaluation::{EvaluationMetrics, Metric, extract_metrics};
pub use fields::{FieldSet, KeyFields, extract_fields, extract_identity};

/// The page did not have the structure the extractor relies on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("no {0} found on page")]
    MissingElement(&'static str),
    #[error("no CRN in course heading {heading:?}")]
    MissingCrn { heading: String },
    #[error("no p_term parameter in URL")]
    MissingTerm,
}

impl ExtractError {
    /// A URL without a term or a heading without a CRN never changes on
    /// refetch; a missing element may be a truncated or error page.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::MissingTerm | Self::MissingCrn { .. })
    }
}

/// Text of every direct child node of `element`, in document order.
///
/// Text nodes contribute their own content and elements contribute all of
/// their descendant text. Comments and other nodes yield an empty string.
pub(crate) fn child_texts(element: ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .map(|child| match ElementRef::wrap(child) {
            Some(el) => el.text().collect::<String>(),
            None => child
                .value()
                .as_text()
                .map(|text| String::from(&**text))
                .unwrap_or_default(),
        })
        .collect()
}

/// Split `text` at its first colon into a lowercased label and a trimmed value.
///
/// Returns `None` when there is no colon or the colon is the first character.
pub fn split_label(text: &str) -> Option<(String, &str)> {
    let colon = text.find(':')?;
    if colon == 0 {
        return None;
    }
    let label = text[..colon].trim().to_lowercase();
    Some((label, text[colon + 1..].trim()))
}
