use crate::config::AppConfig;
use crate::enrichment::traits::DescriptionGenerator;
use crate::enrichment::types::{DescriptionRequest, DescriptionResponse};
use crate::error::EnrichmentError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{info, warn};

/// Calls the hosted `generate-location-description` function
pub struct FunctionDescriptionClient {
    client: Client,
    endpoint: String,
    key: String,
}

impl FunctionDescriptionClient {
    pub fn new(config: &AppConfig) -> Result<Self, EnrichmentError> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/functions/v1/generate-location-description",
                config.store_url
            ),
            key: config.store_key.clone(),
        })
    }
}

#[async_trait]
impl DescriptionGenerator for FunctionDescriptionClient {
    async fn generate(&self, request: &DescriptionRequest) -> Result<String, EnrichmentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.key)
            .header("apikey", &self.key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let description = read_description(status, &body)?;
        info!("Generated location description ({} chars)", description.len());
        Ok(description)
    }
}

fn read_description(status: StatusCode, body: &str) -> Result<String, EnrichmentError> {
    if !status.is_success() {
        warn!("Description function returned status: {}", status);
        return Err(EnrichmentError::Api {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }
    let data: DescriptionResponse =
        serde_json::from_str(body).map_err(|e| EnrichmentError::InvalidResponse(e.to_string()))?;
    data.description
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| EnrichmentError::InvalidResponse("no description returned".into()))
}
