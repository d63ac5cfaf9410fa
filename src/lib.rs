pub mod app;
pub mod cli;
pub mod config;
pub mod extract;
pub mod logging;
pub mod pipeline;
pub mod portal;
pub mod record;
pub mod retry;
pub mod table_io;
pub mod utils;
