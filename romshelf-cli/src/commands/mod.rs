pub mod config;
pub mod scrape;
