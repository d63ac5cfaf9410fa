use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::cli::Command;
use crate::config::Config;
use crate::pipeline::Scraper;
use crate::portal::PortalClient;
use crate::table_io::{read_course_list, write_table};
use crate::utils::fmt_duration;

pub const DEFAULT_COURSE_OUTPUT: &str = "course-information.csv";
pub const DEFAULT_EVALUATION_OUTPUT: &str = "course-evaluations.csv";

/// One scrape run: resolves command-line overrides against the config, runs
/// the pipeline and writes the table.
pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(mut self, command: Command) -> Result<()> {
        let start = Instant::now();

        let (table, output, bom) = match command {
            Command::Catalog {
                terms,
                with_evaluations,
                output,
            } => {
                if !terms.is_empty() {
                    self.config.terms = terms;
                }
                anyhow::ensure!(
                    !self.config.terms.is_empty(),
                    "No terms to scrape; pass --term or set `terms` in the config"
                );
                let include_evaluations = with_evaluations || self.config.include_evaluations;
                if include_evaluations {
                    self.config.require_session()?;
                }

                info!(
                    terms = ?self.config.terms,
                    include_evaluations,
                    "starting catalog run"
                );
                let scraper = self.scraper()?;
                let table = scraper
                    .run_catalog(&self.config.terms, include_evaluations)
                    .await?;
                (table, self.output(output, DEFAULT_COURSE_OUTPUT), false)
            }
            Command::Courses { input, output } => {
                let list = read_course_list(&input)?;
                // Fail on a missing URL column before any request is made.
                list.column(&self.config.url_column)?;

                info!(input = %input.display(), courses = list.rows.len(), "starting course list run");
                let scraper = self.scraper()?;
                let table = scraper
                    .run_course_list(list, &self.config.url_column)
                    .await?;
                (table, self.output(output, DEFAULT_COURSE_OUTPUT), false)
            }
            Command::Evals {
                input,
                limit,
                output,
            } => {
                self.config.require_session()?;
                let list = read_course_list(&input)?;
                list.column(&self.config.term_column)?;
                list.column(&self.config.crn_column)?;

                info!(input = %input.display(), courses = list.rows.len(), limit, "starting evaluation run");
                let scraper = self.scraper()?;
                let table = scraper
                    .run_evaluations(
                        list,
                        &self.config.term_column,
                        &self.config.crn_column,
                        limit,
                    )
                    .await?;
                (table, self.output(output, DEFAULT_EVALUATION_OUTPUT), true)
            }
        };

        let bom = self.config.write_bom.unwrap_or(bom);
        write_table(&output, &table, bom)?;

        info!(
            rows = table.len(),
            output = %output.display(),
            duration = fmt_duration(start.elapsed()),
            "run complete"
        );
        Ok(())
    }

    fn scraper(&self) -> Result<Scraper<PortalClient>> {
        let client = PortalClient::new(&self.config).context("Failed to create portal client")?;
        Scraper::new(client, &self.config)
    }

    fn output(&self, cli: Option<PathBuf>, default: &str) -> PathBuf {
        cli.or_else(|| self.config.output.clone())
            .unwrap_or_else(|| PathBuf::from(default))
    }
}
