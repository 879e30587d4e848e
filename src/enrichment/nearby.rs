use crate::enrichment::traits::{DescriptionGenerator, PlaceSearch};
use crate::enrichment::types::{
    category_types, ApiPlace, DescriptionRequest, LatLng, NearbyRequest, NearbySearchParams,
};
use crate::error::EnrichmentError;
use crate::models::{Place, PropertyFormData};
use std::collections::HashSet;
use tracing::{error, info, warn};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres, rounded to one decimal
pub fn distance_km(from: LatLng, to: LatLng) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lng = (to.longitude - from.longitude).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos() * to.latitude.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let km = 2.0 * EARTH_RADIUS_KM * a.sqrt().asin();
    (km * 10.0).round() / 10.0
}

fn to_place(api: ApiPlace, place_type: &str, category: &str, origin: LatLng) -> Place {
    Place {
        name: api
            .display_name
            .map(|n| n.text)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unknown place".to_string()),
        vicinity: api.formatted_address.unwrap_or_default(),
        rating: api.rating,
        user_ratings_total: api.user_rating_count.unwrap_or(0),
        place_type: place_type.to_string(),
        types: api.types,
        visible_in_webview: true,
        distance: api.location.map(|loc| distance_km(origin, loc)),
        latitude: api.location.map(|loc| loc.latitude),
        longitude: api.location.map(|loc| loc.longitude),
        category: Some(category.to_string()),
        id: api.id,
    }
}

/// Search every place type of `category` around the property.
///
/// Returns `None` when coordinates or the property id are missing, or when
/// any search fails.
pub async fn fetch_places<P: PlaceSearch + ?Sized>(
    form: &PropertyFormData,
    category: &str,
    search: &P,
    params: &NearbySearchParams,
) -> Option<Vec<Place>> {
    let (Some(latitude), Some(longitude)) = (form.latitude, form.longitude) else {
        error!("Property coordinates are required to fetch nearby places");
        return None;
    };
    if form.id.is_none() {
        error!("Property must be saved before fetching nearby places");
        return None;
    }

    let origin = LatLng {
        latitude,
        longitude,
    };
    let mut places = Vec::new();
    for place_type in category_types(category) {
        let request = NearbyRequest::new(&place_type, origin, params);
        match search.search_nearby(&request).await {
            Ok(found) => {
                places.extend(
                    found
                        .into_iter()
                        .map(|api| to_place(api, &place_type, category, origin)),
                );
            }
            Err(e) => {
                error!("Failed to fetch {} places ({}): {}", category, place_type, e);
                return None;
            }
        }
    }

    info!("Found {} place(s) for category {}", places.len(), category);
    Some(places)
}

/// Append incoming places whose id is not listed yet. Existing entries are kept as they are.
pub fn merge_places(existing: &[Place], incoming: &[Place]) -> Vec<Place> {
    let mut seen: HashSet<&str> = existing.iter().map(|p| p.id.as_str()).collect();
    let mut merged = existing.to_vec();
    for place in incoming {
        if seen.insert(place.id.as_str()) {
            merged.push(place.clone());
        }
    }
    merged
}

const STATIC_MAP_URL: &str = "https://maps.googleapis.com/maps/api/staticmap";

/// Roadmap image centred on the property with a red marker
pub fn static_map_url(center: LatLng, api_key: &str) -> String {
    let at = format!("{},{}", center.latitude, center.longitude);
    format!(
        "{}?center={}&zoom=14&size=600x300&maptype=roadmap&markers=color:red%7C{}&key={}",
        STATIC_MAP_URL, at, at, api_key
    )
}

/// Static map URL for the property's coordinates
pub fn property_map_url(form: &PropertyFormData, api_key: &str) -> Result<String, EnrichmentError> {
    let (Some(latitude), Some(longitude)) = (form.latitude, form.longitude) else {
        warn!("Cannot generate a map without coordinates");
        return Err(EnrichmentError::MissingPrerequisite("coordinates"));
    };
    Ok(static_map_url(LatLng { latitude, longitude }, api_key))
}

/// Ask the generator for a neighbourhood description of the property
pub async fn generate_location_description<G: DescriptionGenerator + ?Sized>(
    form: &PropertyFormData,
    generator: &G,
) -> Result<String, EnrichmentError> {
    if form.address.trim().is_empty() {
        warn!("Cannot generate a location description without an address");
        return Err(EnrichmentError::MissingPrerequisite("address"));
    }
    let request = DescriptionRequest {
        address: form.address.clone(),
        nearby_places: form.nearby_places.clone(),
        description: form.description.clone(),
        language: "nl".to_string(),
        max_length: 1000,
    };
    generator.generate(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::types::LocalizedText;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSearch {
        requested: Mutex<Vec<String>>,
        fail_type: Option<&'static str>,
    }

    #[async_trait]
    impl PlaceSearch for FakeSearch {
        async fn search_nearby(&self, request: &NearbyRequest) -> Result<Vec<ApiPlace>, EnrichmentError> {
            let place_type = request.included_types[0].clone();
            self.requested.lock().unwrap().push(place_type.clone());
            if self.fail_type == Some(place_type.as_str()) {
                return Err(EnrichmentError::Api {
                    status: 403,
                    body: "denied".into(),
                });
            }
            Ok(vec![ApiPlace {
                id: format!("{place_type}-1"),
                display_name: Some(LocalizedText {
                    text: format!("Best {place_type}"),
                }),
                rating: Some(4.5),
                location: Some(LatLng {
                    latitude: 52.0,
                    longitude: 4.01,
                }),
                ..Default::default()
            }])
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl DescriptionGenerator for EchoGenerator {
        async fn generate(&self, request: &DescriptionRequest) -> Result<String, EnrichmentError> {
            Ok(format!("Near {}", request.address))
        }
    }

    fn located() -> PropertyFormData {
        PropertyFormData {
            id: Some("p1".into()),
            latitude: Some(52.0),
            longitude: Some(4.0),
            ..Default::default()
        }
    }

    fn place(id: &str, name: &str) -> Place {
        Place {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn category_results_are_concatenated_and_tagged() {
        let search = FakeSearch::default();
        let places = fetch_places(&located(), "Shopping", &search, &NearbySearchParams::default())
            .await
            .unwrap();

        assert_eq!(
            *search.requested.lock().unwrap(),
            vec!["supermarket".to_string(), "shopping_mall".to_string()]
        );
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].place_type, "supermarket");
        assert_eq!(places[1].place_type, "shopping_mall");
        assert_eq!(places[0].category.as_deref(), Some("Shopping"));
        assert_eq!(places[0].name, "Best supermarket");
        assert!(places[0].visible_in_webview);
        assert_eq!(places[0].distance, Some(0.7));
    }

    #[tokio::test]
    async fn prerequisites_and_failures_yield_none() {
        let search = FakeSearch::default();
        let params = NearbySearchParams::default();

        let unsaved = PropertyFormData {
            id: None,
            ..located()
        };
        assert!(fetch_places(&unsaved, "cafe", &search, &params).await.is_none());

        let nowhere = PropertyFormData {
            latitude: None,
            ..located()
        };
        assert!(fetch_places(&nowhere, "cafe", &search, &params).await.is_none());
        assert!(search.requested.lock().unwrap().is_empty());

        let failing = FakeSearch {
            fail_type: Some("bar"),
            ..Default::default()
        };
        assert!(fetch_places(&located(), "Food & Drinks", &failing, &params)
            .await
            .is_none());
    }

    #[test]
    fn merge_keeps_existing_entries() {
        let existing = vec![place("a", "original")];
        let incoming = vec![place("a", "refreshed"), place("b", "new"), place("b", "again")];

        let merged = merge_places(&existing, &incoming);
        let ids: Vec<&str> = merged.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(merged[0].name, "original");
        assert_eq!(merged[1].name, "new");
    }

    #[test]
    fn distance_is_rounded_km() {
        let amsterdam = LatLng {
            latitude: 52.3676,
            longitude: 4.9041,
        };
        let rotterdam = LatLng {
            latitude: 51.9244,
            longitude: 4.4777,
        };
        let km = distance_km(amsterdam, rotterdam);
        assert!((56.0..59.0).contains(&km), "got {km}");
        assert_eq!(distance_km(amsterdam, amsterdam), 0.0);
    }

    #[test]
    fn map_url_is_centred_on_the_property() {
        let url = property_map_url(&located(), "KEY").unwrap();
        assert_eq!(
            url,
            "https://maps.googleapis.com/maps/api/staticmap?center=52,4&zoom=14&size=600x300&maptype=roadmap&markers=color:red%7C52,4&key=KEY"
        );

        let nowhere = PropertyFormData {
            longitude: None,
            ..located()
        };
        assert!(matches!(
            property_map_url(&nowhere, "KEY"),
            Err(EnrichmentError::MissingPrerequisite("coordinates"))
        ));
    }

    #[tokio::test]
    async fn description_needs_an_address() {
        let form = located();
        let err = generate_location_description(&form, &EchoGenerator).await.unwrap_err();
        assert!(matches!(err, EnrichmentError::MissingPrerequisite("address")));

        let form = PropertyFormData {
            address: "Herengracht 1".into(),
            ..located()
        };
        let text = generate_location_description(&form, &EchoGenerator).await.unwrap();
        assert_eq!(text, "Near Herengracht 1");
    }
}
