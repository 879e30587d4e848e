use crate::enrichment::types::{ApiPlace, DescriptionRequest, NearbyRequest};
use crate::error::EnrichmentError;
use async_trait::async_trait;

/// Nearby search against an external places provider
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search_nearby(&self, request: &NearbyRequest) -> Result<Vec<ApiPlace>, EnrichmentError>;
}

/// Text generation for the neighbourhood paragraph of a listing
#[async_trait]
pub trait DescriptionGenerator: Send + Sync {
    async fn generate(&self, request: &DescriptionRequest) -> Result<String, EnrichmentError>;
}
