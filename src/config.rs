use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

const DEFAULT_RADIUS_METERS: f64 = 5000.0;
const DEFAULT_MAX_RESULTS: u32 = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime settings read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the backing store, e.g. `https://xyz.supabase.co`
    pub store_url: String,
    pub store_key: String,
    /// Places enrichment is disabled when absent
    pub maps_api_key: Option<String>,
    pub places_radius_meters: f64,
    pub places_max_results: u32,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnv(key))
        };

        let store_url = required("PROPERTY_STORE_URL")?
            .trim_end_matches('/')
            .to_string();
        let store_key = required("PROPERTY_STORE_KEY")?;
        let maps_api_key = lookup("GOOGLE_MAPS_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            store_url,
            store_key,
            maps_api_key,
            places_radius_meters: parse_or(&lookup, "PLACES_RADIUS_METERS", DEFAULT_RADIUS_METERS),
            places_max_results: parse_or(&lookup, "PLACES_MAX_RESULTS", DEFAULT_MAX_RESULTS),
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                "HTTP_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )),
        })
    }
}

fn parse_or<T: FromStr + Copy>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring unparsable {}={:?}, using default", key, raw);
            default
        }),
    }
}
