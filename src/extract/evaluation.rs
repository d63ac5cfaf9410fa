//! Evaluation page extraction.
//!
//! An evaluation page shows one bar chart per survey question. Each chart's
//! `div.filler > div.third` holds the class average as `Class Average: 4.21`.
//! Charts carry no usable label, so a metric is identified purely by the
//! position of its chart. This assumes the site never reorders its charts.

use html_scraper::{ElementRef, Html, Selector};
use std::fmt;
use tracing::warn;

/// Survey questions reported on the evaluation page, in chart order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Organization,
    Assignments,
    Quality,
    Challenge,
    Workload,
    Credit,
    Grade,
    Pass,
}

impl Metric {
    pub const COUNT: usize = 8;

    pub const ALL: [Metric; Self::COUNT] = [
        Self::Organization,
        Self::Assignments,
        Self::Quality,
        Self::Challenge,
        Self::Workload,
        Self::Credit,
        Self::Grade,
        Self::Pass,
    ];

    /// Column name used in CSV output.
    pub fn name(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Assignments => "assignments",
            Self::Quality => "quality",
            Self::Challenge => "challenge",
            Self::Workload => "workload",
            Self::Credit => "credit",
            Self::Grade => "grade",
            Self::Pass => "pass",
        }
    }

    /// Chart position on the page.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Class-average values for the eight survey questions; unset when the page
/// did not provide one.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvaluationMetrics([Option<f64>; Metric::COUNT]);

impl EvaluationMetrics {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        self.0[metric.index()] = Some(value);
    }

    pub fn values(&self) -> &[Option<f64>; Metric::COUNT] {
        &self.0
    }

    pub fn found(&self) -> usize {
        self.0.iter().filter(|v| v.is_some()).count()
    }

    /// Whether every chart was read. A page without its final chart is
    /// treated as having no evaluation data.
    pub fn is_complete(&self) -> bool {
        self.get(Metric::Pass).is_some()
    }
}

/// Read the class average of each chart, in document order.
///
/// Missing charts leave trailing metrics unset, and a chart that cannot be
/// read leaves only its own slot unset.
pub fn extract_metrics(html: &Html) -> EvaluationMetrics {
    let chart_sel = Selector::parse("div.chart").unwrap();
    let mut metrics = EvaluationMetrics::default();

    for (index, chart) in html.select(&chart_sel).enumerate() {
        let Some(&metric) = Metric::ALL.get(index) else {
            warn!(index, "ignoring unexpected extra evaluation chart");
            continue;
        };
        match chart_average(chart) {
            Some(value) => metrics.set(metric, value),
            None => warn!(metric = metric.name(), "unreadable evaluation chart"),
        }
    }

    metrics
}

fn chart_average(chart: ElementRef<'_>) -> Option<f64> {
    let filler_sel = Selector::parse("div.filler").unwrap();
    let third_sel = Selector::parse("div.third").unwrap();

    let filler = chart.select(&filler_sel).next()?;
    let third = filler.select(&third_sel).next()?;
    let text = third.text().collect::<String>();
    let value = match text.find(':') {
        Some(colon) => &text[colon + 1..],
        None => text.as_str(),
    };
    value.trim().parse().ok()
}
