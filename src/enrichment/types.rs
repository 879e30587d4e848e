use crate::models::Place;
use serde::{Deserialize, Serialize};

/// Search parameters for nearby place lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbySearchParams {
    /// Search radius around the property (meters)
    pub radius_meters: f64,
    /// Results requested per place type
    pub max_results: u32,
}

impl Default for NearbySearchParams {
    fn default() -> Self {
        Self {
            radius_meters: 5000.0,
            max_results: 10,
        }
    }
}

/// Place types searched for each named category
const CATEGORIES: &[(&str, &[&str])] = &[
    ("Food & Drinks", &["restaurant", "bar", "cafe"]),
    (
        "Nightlife & Entertainment",
        &["casino", "concert_hall", "event_venue", "night_club", "movie_theater"],
    ),
    (
        "Education",
        &[
            "school",
            "university",
            "library",
            "preschool",
            "primary_school",
            "secondary_school",
        ],
    ),
    (
        "Sports",
        &[
            "gym",
            "arena",
            "fitness_center",
            "golf_course",
            "ski_resort",
            "sports_club",
            "sports_complex",
            "stadium",
            "swimming_pool",
        ],
    ),
    ("Shopping", &["supermarket", "shopping_mall"]),
];

/// Place types for a category; unknown names are searched as a single type
pub fn category_types(category: &str) -> Vec<String> {
    CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, types)| types.iter().map(|t| t.to_string()).collect())
        .unwrap_or_else(|| vec![category.to_string()])
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Circle {
    pub center: LatLng,
    pub radius: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocationRestriction {
    pub circle: Circle,
}

/// Body of a `places:searchNearby` call
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRequest {
    pub included_types: Vec<String>,
    pub max_result_count: u32,
    pub location_restriction: LocationRestriction,
}

impl NearbyRequest {
    pub fn new(place_type: &str, center: LatLng, params: &NearbySearchParams) -> Self {
        Self {
            included_types: vec![place_type.to_string()],
            max_result_count: params.max_results,
            location_restriction: LocationRestriction {
                circle: Circle {
                    center,
                    radius: params.radius_meters,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct LocalizedText {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlace {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<LocalizedText>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_rating_count: Option<u32>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub location: Option<LatLng>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NearbyResponse {
    #[serde(default)]
    pub places: Option<Vec<ApiPlace>>,
}

/// Body sent to the location description generator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionRequest {
    pub address: String,
    pub nearby_places: Vec<Place>,
    pub description: String,
    pub language: String,
    pub max_length: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionResponse {
    #[serde(default)]
    pub description: Option<String>,
}
