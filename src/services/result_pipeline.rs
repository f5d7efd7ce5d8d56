use serde_json::Value;

use crate::{
    configuration::{ApifySettings, PollingSettings},
    domain::{
        keyword::{clamp_max_leads, normalize_keyword},
        lead::{extract, LeadRecord},
        run_request::RunRequest,
    },
    error::PipelineError,
};

use super::{CancelToken, JobPoller, ScrapeProvider};

/// Drives one extraction request from keyword to lead records.
pub struct ResultPipeline<'a, P> {
    provider: &'a P,
    apify: &'a ApifySettings,
    polling: PollingSettings,
}

impl<'a, P: ScrapeProvider> ResultPipeline<'a, P> {
    pub fn new(provider: &'a P, apify: &'a ApifySettings, polling: PollingSettings) -> Self {
        ResultPipeline {
            provider,
            apify,
            polling,
        }
    }

    pub async fn run(
        &self,
        request: &RunRequest,
        cancel: &mut CancelToken,
    ) -> Result<Vec<LeadRecord>, PipelineError> {
        let keyword = normalize_keyword(request.keyword())?;
        let max_leads = clamp_max_leads(request.max_leads);
        let actor_id = request.platform.actor_id(self.apify);
        let input = request.platform.actor_input(&keyword, max_leads);

        log::info!(
            "Extracting up to {} leads for {} with actor {}",
            max_leads,
            keyword,
            actor_id
        );

        let poller = JobPoller::new(self.provider, self.polling.clone());
        let mut job = poller.submit(actor_id, &input).await?;
        poller.await_completion(&mut job, cancel).await?;

        let dataset_id = job.dataset_id.ok_or_else(|| {
            PipelineError::MalformedResponse(format!("Run {} finished without a dataset", job.id))
        })?;
        let items = self.dataset(&dataset_id).await?;

        leads_from_items(&items)
    }

    /// Raw items of the dataset behind a run.
    pub async fn fetch_dataset(&self, run_id: &str) -> Result<Vec<Value>, PipelineError> {
        let state = self.provider.run_status(run_id).await?;
        let dataset_id = state.dataset_id.ok_or_else(|| {
            PipelineError::MalformedResponse(format!("Run {} has no dataset", run_id))
        })?;

        self.dataset(&dataset_id).await
    }

    async fn dataset(&self, dataset_id: &str) -> Result<Vec<Value>, PipelineError> {
        match self.provider.dataset_items(dataset_id).await? {
            Value::Array(items) => {
                log::info!("Dataset {} has {} items", dataset_id, items.len());
                Ok(items)
            }
            other => Err(PipelineError::MalformedResponse(format!(
                "Dataset {} is {} instead of a list",
                dataset_id,
                json_kind(&other)
            ))),
        }
    }
}

pub fn leads_from_items(items: &[Value]) -> Result<Vec<LeadRecord>, PipelineError> {
    if items.is_empty() {
        return Err(PipelineError::EmptyResult);
    }

    let leads: Vec<LeadRecord> = items.iter().map(extract).collect();

    match leads.iter().all(LeadRecord::is_empty) {
        true => Err(PipelineError::EmptyResult),
        false => Ok(leads),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
