pub mod ingest;
pub mod push;
pub mod scrape;
pub mod stats;
