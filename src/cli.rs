use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Scrape course catalog and evaluation data into CSV files.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// TOML config file (defaults to ./course-scraper.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = TracingFormat::Pretty, global = true)]
    pub tracing: TracingFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    /// Human-readable console output
    Pretty,
    /// One JSON object per event
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scrape every course listed in each term's catalog
    Catalog {
        /// Term code to scrape; repeatable. Overrides the configured terms.
        #[arg(long = "term", value_name = "CODE")]
        terms: Vec<String>,
        /// Also collect evaluation metrics for each course
        #[arg(long)]
        with_evaluations: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Add course page fields to a CSV list of unique courses
    Courses {
        /// CSV with a URL column
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Add evaluation metrics to a CSV list of courses
    Evals {
        /// CSV with term and CRN columns
        #[arg(short, long)]
        input: PathBuf,
        /// Only scrape the first N rows
        #[arg(long)]
        limit: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
