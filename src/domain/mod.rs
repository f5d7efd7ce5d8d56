pub mod keyword;
pub mod lead;
pub mod run_request;
pub mod scrape_job;
pub mod table;
pub mod text;
