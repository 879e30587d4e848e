use anyhow::Context;
use property_studio::config::AppConfig;
use property_studio::enrichment::{
    fetch_places, generate_location_description, FunctionDescriptionClient, GooglePlacesClient,
    NearbySearchParams,
};
use property_studio::form::{FieldChange, FormSession, SaveAttempt};
use property_studio::models::PropertyFormData;
use property_studio::sync::{PropertySync, RestStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🏠 Property Studio");
    info!("==================");

    let mut args = std::env::args().skip(1);
    let draft_path = args
        .next()
        .context("usage: property-studio <draft.json> [category...]")?;
    let categories: Vec<String> = args.collect();

    let config = AppConfig::from_env()?;
    let raw = tokio::fs::read_to_string(&draft_path)
        .await
        .with_context(|| format!("Failed to read {}", draft_path))?;
    let draft: PropertyFormData =
        serde_json::from_str(&raw).with_context(|| format!("Invalid draft in {}", draft_path))?;

    let sync = PropertySync::new(RestStore::new(&config)?);
    let mut session = FormSession::new(draft);
    session.mark_dirty();

    let receipt = session.save(&sync).await?;
    info!(
        "💾 Saved property {} ({})",
        receipt.property_id,
        if receipt.created { "created" } else { "updated" }
    );

    // Walk the form once, autosaving on each step change
    while !session.current_step().is_last() {
        let change = session.next(&sync).await;
        if let SaveAttempt::Failed(reason) = &change.save {
            warn!("⚠️  {} not saved: {}", change.from.title(), reason);
        }
        info!("➡️  {}", change.to.title());
    }

    if let Some(key) = &config.maps_api_key {
        if session.data().map_image.is_none() {
            if let Err(e) = session.generate_map(key) {
                warn!("Could not generate map image: {}", e);
            }
        }
    }

    match &config.maps_api_key {
        Some(key) if !categories.is_empty() => {
            let places = GooglePlacesClient::new(key.clone(), config.http_timeout)?;
            let params = NearbySearchParams {
                radius_meters: config.places_radius_meters,
                max_results: config.places_max_results,
            };
            for category in &categories {
                if let Some(found) = fetch_places(session.data(), category, &places, &params).await {
                    let added = session.merge_places(&found);
                    info!("📍 {}: {} found, {} new", category, found.len(), added);
                }
            }
        }
        Some(_) => {}
        None if !categories.is_empty() => {
            warn!("GOOGLE_MAPS_API_KEY is not set, skipping nearby places");
        }
        None => {}
    }

    if session.data().location_description.is_empty() && !session.data().address.is_empty() {
        let generator = FunctionDescriptionClient::new(&config)?;
        match generate_location_description(session.data(), &generator).await {
            Ok(text) => session.change_field(FieldChange::LocationDescription(text)),
            Err(e) => warn!("Could not generate location description: {}", e),
        }
    }

    if session.has_pending_changes() {
        session.save(&sync).await?;
    }

    let property = session.data();
    println!("{} ({})", property.title, property.price);
    println!("   {}", property.address);
    println!("   {} features, {} areas", property.features.len(), property.areas.len());
    println!(
        "   {} images, {} floorplans",
        property.images.len(),
        property.floorplans.len()
    );
    println!("   {} nearby places", property.nearby_places.len());
    if let Some(saved) = session.last_saved() {
        println!("   Last saved: {}", saved.to_rfc3339());
    }

    let json = serde_json::to_string_pretty(property)?;
    tokio::fs::write("saved_property.json", json).await?;
    info!("💾 Saved snapshot to saved_property.json");

    Ok(())
}
