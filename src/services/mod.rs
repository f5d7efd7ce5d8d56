pub mod anonova_client;
pub mod apify_client;
pub mod csv_export;
pub mod job_poller;
pub mod result_pipeline;

pub use anonova_client::*;
pub use apify_client::*;
pub use csv_export::*;
pub use job_poller::*;
pub use result_pipeline::*;
