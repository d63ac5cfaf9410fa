//! The three scrape runs: catalog listing, course list, and evaluations.
//!
//! Every course is fetched and parsed before the next begins. Each page is
//! one retried unit of work; a course that fails for good is logged and
//! either skipped (catalog run) or written with empty cells (list runs) so
//! input rows are never lost.

use anyhow::{Context, Result};
use html_scraper::Html;
use tracing::{error, info, warn};
use url::Url;

use crate::config::Config;
use crate::extract::{
    EvaluationMetrics, FieldSet, KeyFields, Metric, extract_course_links, extract_fields,
    extract_identity, extract_metrics,
};
use crate::portal::{Endpoints, Fetch, ScrapeError};
use crate::record::{CourseIdentity, CourseRecord, CourseTable, catalog_header, metric_header};
use crate::retry::{RetryPolicy, with_retry};
use crate::table_io::CourseList;
use crate::utils::progress;

/// Fetches and extracts pages through a [`Fetch`] source.
pub struct Scraper<F> {
    fetch: F,
    endpoints: Endpoints,
    site_root: Url,
    key_fields: KeyFields,
    retry: RetryPolicy,
}

impl<F: Fetch> Scraper<F> {
    pub fn new(fetch: F, config: &Config) -> Result<Self> {
        let endpoints = config.endpoints();
        let site_root = Url::parse(endpoints.catalog_host())
            .with_context(|| format!("Invalid catalog host {:?}", endpoints.catalog_host()))?;

        Ok(Self {
            fetch,
            endpoints,
            site_root,
            key_fields: config.key_fields(),
            retry: config.retry_policy(),
        })
    }

    pub fn fetcher(&self) -> &F {
        &self.fetch
    }

    /// Course detail URLs listed in `term`'s catalog, in page order.
    pub async fn list_catalog(&self, term: &str) -> Result<Vec<String>, ScrapeError> {
        let url = self.endpoints.catalog(term);
        let url = url.as_str();

        let links = with_retry(self.retry, url, |_| async move {
            let body = self.fetch.fetch(url).await?;
            let html = Html::parse_document(&body);
            Ok::<_, ScrapeError>(extract_course_links(&html, &self.site_root))
        })
        .await?;

        if links.is_empty() {
            warn!(term, url, "catalog lists no courses");
        }
        Ok(links)
    }

    /// Identity and key fields of the course page at `url`.
    pub async fn scrape_course(
        &self,
        url: &str,
    ) -> Result<(CourseIdentity, FieldSet), ScrapeError> {
        with_retry(self.retry, url, |_| async move {
            let body = self.fetch.fetch(url).await?;
            let html = Html::parse_document(&body);
            let identity =
                extract_identity(&html, url).map_err(|e| ScrapeError::parse(url, e))?;
            let fields = extract_fields(&html, &self.key_fields)
                .map_err(|e| ScrapeError::parse(url, e))?;
            Ok::<_, ScrapeError>((identity, fields))
        })
        .await
    }

    /// Key fields of the course page at `url`.
    pub async fn scrape_fields(&self, url: &str) -> Result<FieldSet, ScrapeError> {
        with_retry(self.retry, url, |_| async move {
            let body = self.fetch.fetch(url).await?;
            let html = Html::parse_document(&body);
            extract_fields(&html, &self.key_fields).map_err(|e| ScrapeError::parse(url, e))
        })
        .await
    }

    /// Evaluation metrics for one course offering.
    pub async fn scrape_evaluation(
        &self,
        term: &str,
        crn: &str,
    ) -> Result<EvaluationMetrics, ScrapeError> {
        let url = self.endpoints.evaluation(term, crn);
        let url = url.as_str();

        let metrics = with_retry(self.retry, url, |_| async move {
            let body = self.fetch.fetch(url).await?;
            Ok::<_, ScrapeError>(extract_metrics(&Html::parse_document(&body)))
        })
        .await?;

        if !metrics.is_complete() {
            info!(url, found = metrics.found(), "evaluation data not found");
        }
        Ok(metrics)
    }

    /// Scrape every course listed in each term's catalog.
    pub async fn run_catalog(
        &self,
        terms: &[String],
        include_evaluations: bool,
    ) -> Result<CourseTable> {
        let mut table = CourseTable::new(catalog_header(&self.key_fields, include_evaluations));

        for term in terms {
            let urls = match self.list_catalog(term).await {
                Ok(urls) => urls,
                Err(e) => {
                    error!(
                        term = term.as_str(),
                        error = ?e,
                        "failed to list catalog, skipping term"
                    );
                    continue;
                }
            };
            info!(term = term.as_str(), courses = urls.len(), "listed catalog");

            for (i, url) in urls.iter().enumerate() {
                info!(
                    term = term.as_str(),
                    index = i + 1,
                    total = urls.len(),
                    progress = progress(i, urls.len()),
                    url = url.as_str(),
                    "scraping course"
                );

                let (identity, fields) = match self.scrape_course(url).await {
                    Ok(course) => course,
                    Err(e) => {
                        error!(
                            url = url.as_str(),
                            error = ?e,
                            "failed to scrape course, skipping"
                        );
                        continue;
                    }
                };

                let mut record = CourseRecord::from_identity(&identity).with_fields(&fields);
                if include_evaluations {
                    let metrics = self
                        .scrape_evaluation(&identity.term, &identity.crn)
                        .await
                        .unwrap_or_else(|e| {
                            warn!(
                                crn = identity.crn.as_str(),
                                error = ?e,
                                "failed to scrape evaluation"
                            );
                            EvaluationMetrics::default()
                        });
                    record = record.with_metrics(&metrics);
                }
                table.push(record)?;
            }
        }

        info!(rows = table.len(), "catalog run complete");
        Ok(table)
    }

    /// Append key fields to every row of a list of unique courses.
    pub async fn run_course_list(
        &self,
        list: CourseList,
        url_column: &str,
    ) -> Result<CourseTable> {
        let url_index = list.column(url_column)?;
        let mut header = list.header;
        header.extend(self.key_fields.names().into_iter().map(str::to_string));
        let mut table = CourseTable::new(header);

        let total = list.rows.len();
        for (i, row) in list.rows.into_iter().enumerate() {
            let url = row.get(url_index).map_or("", |s| s.trim()).to_string();
            info!(
                index = i + 1,
                total,
                progress = progress(i, total),
                url = url.as_str(),
                "scraping course"
            );

            let record = CourseRecord::from_passthrough(row);
            if url.is_empty() {
                warn!(index = i + 1, "row has no URL, leaving fields empty");
                table.push(record.with_blanks(self.key_fields.len()))?;
                continue;
            }
            let record = match self.scrape_fields(&url).await {
                Ok(fields) => record.with_fields(&fields),
                Err(e) => {
                    error!(
                        url = url.as_str(),
                        error = ?e,
                        "failed to scrape course, leaving fields empty"
                    );
                    record.with_blanks(self.key_fields.len())
                }
            };
            table.push(record)?;
        }

        info!(rows = table.len(), "course list run complete");
        Ok(table)
    }

    /// Append evaluation metrics to the first `limit` rows of a course list.
    pub async fn run_evaluations(
        &self,
        list: CourseList,
        term_column: &str,
        crn_column: &str,
        limit: Option<usize>,
    ) -> Result<CourseTable> {
        let term_index = list.column(term_column)?;
        let crn_index = list.column(crn_column)?;
        let mut header = list.header;
        header.extend(metric_header());
        let mut table = CourseTable::new(header);

        let total = limit.map_or(list.rows.len(), |n| n.min(list.rows.len()));
        for (i, row) in list.rows.into_iter().take(total).enumerate() {
            let term = row.get(term_index).map_or("", |s| s.trim()).to_string();
            let crn = row.get(crn_index).map_or("", |s| s.trim()).to_string();
            info!(
                index = i + 1,
                total,
                progress = progress(i, total),
                term = term.as_str(),
                crn = crn.as_str(),
                "scraping evaluation"
            );

            let record = CourseRecord::from_passthrough(row);
            let record = match self.scrape_evaluation(&term, &crn).await {
                Ok(metrics) => record.with_metrics(&metrics),
                Err(e) => {
                    error!(
                        term = term.as_str(),
                        crn = crn.as_str(),
                        error = ?e,
                        "failed to scrape evaluation, leaving metrics empty"
                    );
                    record.with_blanks(Metric::COUNT)
                }
            };
            table.push(record)?;
        }

        info!(rows = table.len(), "evaluation run complete");
        Ok(table)
    }
}
