//! Recorded-page fixtures shared by the pipeline tests.
#![allow(dead_code)]

use async_trait::async_trait;
use course_scraper::config::Config;
use course_scraper::portal::{Endpoints, Fetch, ScrapeError};
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A canned response for one URL.
#[derive(Debug, Clone)]
pub enum Reply {
    Page(String),
    Status(u16),
    InvalidSession,
}

/// [`Fetch`] source serving fixture pages by exact URL.
///
/// Each URL may have a queue of replies; the last one repeats once the queue
/// is drained. Unknown URLs answer 404.
#[derive(Default)]
pub struct FixtureFetch {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl FixtureFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.reply(url, Reply::Page(body.into()))
    }

    pub fn reply(self, url: impl Into<String>, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(url.into())
            .or_default()
            .push_back(reply);
        self
    }

    /// Every URL requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Fetch for FixtureFetch {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        self.calls.lock().unwrap().push(url.to_string());

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Page(body)) => Ok(body),
            Some(Reply::Status(code)) => Err(ScrapeError::Status {
                status: StatusCode::from_u16(code).unwrap(),
                url: url.to_string(),
            }),
            Some(Reply::InvalidSession) => Err(ScrapeError::InvalidSession {
                url: url.to_string(),
            }),
            None => Err(ScrapeError::Status {
                status: StatusCode::NOT_FOUND,
                url: url.to_string(),
            }),
        }
    }
}

/// Config with pacing disabled and a bounded retry budget.
pub fn test_config() -> Config {
    Config {
        delay_min_ms: 0,
        delay_max_ms: 0,
        max_attempts: Some(5),
        session_id: Some("test-session".to_string()),
        key_fields: vec!["credit hours".to_string(), "prerequisites".to_string()],
        ..Config::default()
    }
}

pub fn endpoints() -> Endpoints {
    Endpoints::default()
}

/// A term's catalog listing linking to each CRN's course page.
pub fn catalog_page(term: &str, crns: &[&str]) -> String {
    let rows: String = crns
        .iter()
        .map(|crn| {
            format!(
                r#"<tr><td class="cls-crn"><a href="/courses/!SWKSCAT.cat?p_action=COURSE&amp;p_term={term}&amp;p_crn={crn}">{crn}</a></td><td>Course</td></tr>"#
            )
        })
        .collect();
    format!("<html><body><table>{rows}</table></body></html>")
}

/// A course detail page with the heading in the fourth full-width block and
/// `fields` as `Label: value` lines in the first field column.
pub fn course_page(heading: &str, fields: &[(&str, &str)]) -> String {
    let lines: String = fields
        .iter()
        .map(|(label, value)| format!("<div>{label}: {value}</div>"))
        .collect();
    format!(
        r#"<html><body>
        <div class="col-lg-12">Rice University</div>
        <div class="col-lg-12">Course Catalog</div>
        <div class="col-lg-12">Search</div>
        <div class="col-lg-12">{heading}</div>
        <div class="col-lg-6">{lines}</div>
        <div class="col-lg-6"></div>
        </body></html>"#
    )
}

/// An evaluation page with one chart per class average.
pub fn evaluation_page(averages: &[&str]) -> String {
    let charts: String = averages
        .iter()
        .map(|avg| {
            format!(
                r#"<div class="chart"><div class="first">Responses: 20</div><div class="filler"><div class="third">Class Average: {avg}</div></div></div>"#
            )
        })
        .collect();
    format!("<html><body>{charts}</body></html>")
}
