use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Ready,
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Unknown,
}

impl From<&str> for JobStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "READY" => JobStatus::Ready,
            "RUNNING" => JobStatus::Running,
            "SUCCEEDED" => JobStatus::Succeeded,
            "FAILED" => JobStatus::Failed,
            _ => JobStatus::Unknown,
        }
    }
}

/// One run of an external actor, owned by the request that started it.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeJob {
    pub id: String,
    pub actor_id: String,
    pub status: JobStatus,
    pub dataset_id: Option<String>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl ScrapeJob {
    pub fn new(id: String, actor_id: String, dataset_id: Option<String>) -> Self {
        ScrapeJob {
            id,
            actor_id,
            status: JobStatus::Ready,
            dataset_id,
            error_message: None,
            started_at: Utc::now(),
        }
    }
}
