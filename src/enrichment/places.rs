use crate::enrichment::traits::PlaceSearch;
use crate::enrichment::types::{ApiPlace, NearbyRequest, NearbyResponse};
use crate::error::EnrichmentError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

const SEARCH_NEARBY_URL: &str = "https://places.googleapis.com/v1/places:searchNearby";
const FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,places.rating,places.userRatingCount,places.types,places.location";

/// Google Places API (v1) client
pub struct GooglePlacesClient {
    client: Client,
    api_key: String,
}

impl GooglePlacesClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, EnrichmentError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl PlaceSearch for GooglePlacesClient {
    async fn search_nearby(&self, request: &NearbyRequest) -> Result<Vec<ApiPlace>, EnrichmentError> {
        debug!("Places request: {:?}", request);

        let response = self
            .client
            .post(SEARCH_NEARBY_URL)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let places = read_places(status, &body)?;
        debug!("Places API returned {} place(s)", places.len());
        Ok(places)
    }
}

/// Decode a `searchNearby` reply. No `places` key means nothing was found.
fn read_places(status: StatusCode, body: &str) -> Result<Vec<ApiPlace>, EnrichmentError> {
    if !status.is_success() {
        warn!("Places API returned status: {}", status);
        return Err(EnrichmentError::Api {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }
    let data: NearbyResponse =
        serde_json::from_str(body).map_err(|e| EnrichmentError::InvalidResponse(e.to_string()))?;
    Ok(data.places.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reply_means_no_places() {
        assert!(read_places(StatusCode::OK, "{}").unwrap().is_empty());
        assert!(read_places(StatusCode::OK, r#"{"places": null}"#).unwrap().is_empty());
    }

    #[test]
    fn places_are_decoded_with_optional_fields() {
        let body = r#"{"places": [
            {"id": "abc", "displayName": {"text": "Cafe Central", "languageCode": "nl"},
             "rating": 4.2, "userRatingCount": 31, "types": ["cafe"],
             "location": {"latitude": 52.1, "longitude": 4.3}},
            {"id": "bare"}
        ]}"#;
        let places = read_places(StatusCode::OK, body).unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].display_name.as_ref().unwrap().text, "Cafe Central");
        assert_eq!(places[0].user_rating_count, Some(31));
        assert_eq!(places[1].rating, None);
        assert!(places[1].types.is_empty());
    }

    #[test]
    fn error_status_and_garbage_are_errors() {
        let err = read_places(StatusCode::FORBIDDEN, "API key invalid").unwrap_err();
        assert!(matches!(err, EnrichmentError::Api { status: 403, ref body } if body == "API key invalid"));

        let err = read_places(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, EnrichmentError::InvalidResponse(_)));
    }
}
