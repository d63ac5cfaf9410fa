//! Request URL templates for the catalog and evaluation sites.
//!
//! Identifiers are substituted verbatim. A malformed term or CRN still yields
//! a URL; the failure surfaces when the page is fetched.

pub const DEFAULT_CATALOG_HOST: &str = "https://courses.rice.edu";
pub const DEFAULT_EVALUATION_HOST: &str = "https://esther.rice.edu";

/// The three page types the scraper requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Full-term listing of every course offered in a term.
    Catalog,
    /// Detail page for one course offering.
    Course,
    /// Evaluation survey results for one course offering.
    Evaluation,
}

/// Host roots the URL templates are rendered against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    catalog_host: String,
    evaluation_host: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_CATALOG_HOST, DEFAULT_EVALUATION_HOST)
    }
}

impl Endpoints {
    pub fn new(catalog_host: &str, evaluation_host: &str) -> Self {
        Self {
            catalog_host: catalog_host.trim_end_matches('/').to_string(),
            evaluation_host: evaluation_host.trim_end_matches('/').to_string(),
        }
    }

    pub fn catalog_host(&self) -> &str {
        &self.catalog_host
    }

    pub fn evaluation_host(&self) -> &str {
        &self.evaluation_host
    }

    /// Render the URL for `kind`. The CRN is ignored for catalog pages and
    /// substituted as an empty string when absent for the other kinds.
    pub fn url(&self, kind: ResourceKind, term: &str, crn: Option<&str>) -> String {
        let crn = crn.unwrap_or_default();
        match kind {
            ResourceKind::Catalog => format!(
                "{}/courses/courses/!SWKSCAT.cat?p_action=QUERY&p_term={term}&p_ptrm=1&p_crn=&p_onebar=&p_mode=AND&p_subj_cd=&p_subj=&p_dept=&p_school=&p_spon_coll=&p_df=&p_insm=&p_submit=",
                self.catalog_host
            ),
            ResourceKind::Course => format!(
                "{}/courses/!SWKSCAT.cat?p_action=COURSE&p_term={term}&p_crn={crn}",
                self.catalog_host
            ),
            ResourceKind::Evaluation => format!(
                "{}/selfserve/swkscmt.main?p_term={term}&p_crn={crn}&p_commentid=&p_confirm=1&p_type=Course",
                self.evaluation_host
            ),
        }
    }

    pub fn catalog(&self, term: &str) -> String {
        self.url(ResourceKind::Catalog, term, None)
    }

    pub fn course(&self, term: &str, crn: &str) -> String {
        self.url(ResourceKind::Course, term, Some(crn))
    }

    pub fn evaluation(&self, term: &str, crn: &str) -> String {
        self.url(ResourceKind::Evaluation, term, Some(crn))
    }
}
