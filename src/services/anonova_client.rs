use std::time::Duration;

use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;

use crate::{
    configuration::AnonovaSettings,
    domain::keyword::{clamp_max_leads, normalize_keyword},
    error::PipelineError,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct CreateOrderQuery<'a> {
    source: &'a str,
    source_type: &'a str,
    max_leads: u32,
}

/// Client for the Instagram order API. Orders are created, checked, and
/// downloaded as CSV; nothing is polled server side.
pub struct AnonovaClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnonovaClient {
    pub fn new(settings: &AnonovaSettings) -> Result<Self, PipelineError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(AnonovaClient {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn create_order(
        &self,
        source: Option<&str>,
        source_type: &str,
        max_leads: Option<u32>,
    ) -> Result<Value, PipelineError> {
        let source = normalize_keyword(source)?;
        let max_leads = clamp_max_leads(max_leads);

        let response = self
            .client
            .post(format!("{}/orders/create/", self.base_url))
            .header("X-API-Key", &self.api_key)
            .query(&CreateOrderQuery {
                source: &source,
                source_type,
                max_leads,
            })
            .send()
            .await?;

        let order: Value = match read_body(response).await {
            Ok(body) => serde_json::from_str(&body)
                .map_err(|e| PipelineError::Submission(format!("Unreadable order: {}", e)))?,
            Err(PipelineError::Provider { status, body }) => {
                return Err(PipelineError::Submission(format!("HTTP {}: {}", status, body)))
            }
            Err(e) => return Err(e),
        };

        match order.get("id") {
            Some(id) if !id.is_null() => {
                log::info!("Created order {} for {} ({})", id, source, source_type);
                Ok(order)
            }
            _ => Err(PipelineError::Submission(
                "Order response has no id".to_string(),
            )),
        }
    }

    pub async fn order(&self, id: &str) -> Result<Value, PipelineError> {
        let response = self
            .client
            .get(format!("{}/orders/{}", self.base_url, id))
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        let body = read_body(response).await?;
        serde_json::from_str(&body).map_err(|e| PipelineError::MalformedResponse(e.to_string()))
    }

    pub async fn download(&self, id: &str) -> Result<String, PipelineError> {
        let response = self
            .client
            .get(format!("{}/orders/{}/download", self.base_url, id))
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        read_body(response).await
    }
}

async fn read_body(response: Response) -> Result<String, PipelineError> {
    let status = response.status();
    let body = response.text().await?;

    match status.is_success() {
        true => Ok(body),
        false => Err(PipelineError::Provider {
            status: status.as_u16(),
            body,
        }),
    }
}
