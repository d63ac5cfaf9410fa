//! Client for the university course portal: URL templates, page fetching and
//! failure classification.

pub mod client;
pub mod errors;
pub mod urls;

pub use client::{Fetch, Pacing, PortalClient};
pub use errors::ScrapeError;
pub use urls::{Endpoints, ResourceKind};
