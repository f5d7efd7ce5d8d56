use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{configuration::ApifySettings, error::PipelineError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DATASET_LIMIT: u32 = 1000;

/// What a provider hands back when a run is started.
#[derive(Debug, Clone, PartialEq)]
pub struct RunHandle {
    pub id: String,
    pub dataset_id: String,
}

/// One observation of a run's state.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub status: String,
    pub error_message: Option<String>,
    pub dataset_id: Option<String>,
}

/// The calls the poller and pipeline need from a scraping provider.
#[allow(async_fn_in_trait)]
pub trait ScrapeProvider {
    async fn start_run(&self, actor_id: &str, input: &Value) -> Result<RunHandle, PipelineError>;
    async fn run_status(&self, run_id: &str) -> Result<RunState, PipelineError>;
    async fn dataset_items(&self, dataset_id: &str) -> Result<Value, PipelineError>;
}

// The provider answers either `{...}` or `{"data": {...}}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunResponse {
    id: Option<String>,
    status: Option<String>,
    default_dataset_id: Option<String>,
    error_message: Option<String>,
    status_message: Option<String>,
}

#[derive(Serialize)]
struct DatasetQuery {
    clean: bool,
    format: &'static str,
    limit: u32,
}

pub struct ApifyClient {
    client: Client,
    token: String,
    base_url: String,
}

impl ApifyClient {
    pub fn new(settings: &ApifySettings) -> Result<Self, PipelineError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(ApifyClient {
            client,
            token: settings.token.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PipelineError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(PipelineError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| PipelineError::MalformedResponse(e.to_string()))
    }
}

impl ScrapeProvider for ApifyClient {
    async fn start_run(&self, actor_id: &str, input: &Value) -> Result<RunHandle, PipelineError> {
        // Actor ids in URLs use `~` between owner and name
        let url = format!("{}/acts/{}/runs", self.base_url, actor_id.replace('/', "~"));

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;

        let run = match Self::read_json::<Envelope<RunResponse>>(response).await {
            Ok(envelope) => envelope.into_inner(),
            Err(PipelineError::Network(e)) => return Err(PipelineError::Network(e)),
            Err(e) => return Err(PipelineError::Submission(e.to_string())),
        };

        match (run.id, run.default_dataset_id) {
            (Some(id), Some(dataset_id)) => Ok(RunHandle { id, dataset_id }),
            (None, _) => Err(PipelineError::Submission(
                "Provider response has no run id".to_string(),
            )),
            (_, None) => Err(PipelineError::Submission(
                "Provider response has no dataset id".to_string(),
            )),
        }
    }

    async fn run_status(&self, run_id: &str) -> Result<RunState, PipelineError> {
        let response = self
            .client
            .get(format!("{}/actor-runs/{}", self.base_url, run_id))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let run = Self::read_json::<Envelope<RunResponse>>(response)
            .await?
            .into_inner();

        let status = run.status.ok_or_else(|| {
            PipelineError::MalformedResponse(format!("Run {} has no status", run_id))
        })?;

        Ok(RunState {
            status,
            error_message: run.error_message.or(run.status_message),
            dataset_id: run.default_dataset_id,
        })
    }

    async fn dataset_items(&self, dataset_id: &str) -> Result<Value, PipelineError> {
        let response = self
            .client
            .get(format!("{}/datasets/{}/items", self.base_url, dataset_id))
            .bearer_auth(&self.token)
            .query(&DatasetQuery {
                clean: true,
                format: "json",
                limit: DATASET_LIMIT,
            })
            .send()
            .await?;

        Self::read_json(response).await
    }
}
