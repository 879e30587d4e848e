use crate::models::{Area, City, Feature, ImageKind, Place, PropertyFormData, PropertyImage};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Row of the `properties` table as written and read by the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PropertyRow {
    #[serde(default, skip_serializing)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bedrooms: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bathrooms: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sqft: String,
    #[serde(default, rename = "livingArea", deserialize_with = "null_as_default")]
    pub living_area: String,
    #[serde(default, rename = "buildYear", deserialize_with = "null_as_default")]
    pub build_year: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub garages: String,
    #[serde(default, rename = "energyLabel", deserialize_with = "null_as_default")]
    pub energy_label: String,
    #[serde(default, rename = "hasGarden", deserialize_with = "null_as_default")]
    pub has_garden: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, rename = "shortDescription", deserialize_with = "null_as_default")]
    pub short_description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location_description: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default, rename = "virtualTourUrl", deserialize_with = "null_as_default")]
    pub virtual_tour_url: String,
    #[serde(default, rename = "youtubeUrl", deserialize_with = "null_as_default")]
    pub youtube_url: String,
    #[serde(default, rename = "floorplanEmbedScript", deserialize_with = "null_as_default")]
    pub floorplan_embed_script: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, rename = "propertyType", deserialize_with = "null_as_default")]
    pub property_type: String,
    #[serde(default)]
    pub map_image: Option<String>,
    /// Written as a JSON string or null; objects are accepted on read
    #[serde(default, rename = "generalInfo")]
    pub general_info: Value,
    /// Written as a JSON string; read back as either a string or an array
    #[serde(default)]
    pub features: Value,
    #[serde(default)]
    pub areas: Value,
    #[serde(default)]
    pub nearby_places: Value,
    #[serde(default)]
    pub nearby_cities: Value,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn stringify<T: Serialize>(items: &[T]) -> Result<Value, serde_json::Error> {
    serde_json::to_string(items).map(Value::String)
}

/// Decode a collection column, tolerating legacy shapes.
///
/// Null, malformed JSON, or a non-array value all yield an empty list.
fn parse_collection<T: DeserializeOwned>(column: &'static str, value: Value) -> Vec<T> {
    let value = match value {
        Value::Null => return Vec::new(),
        Value::String(raw) if raw.trim().is_empty() => return Vec::new(),
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Column {} holds invalid JSON, using empty list: {}", column, e);
                return Vec::new();
            }
        },
        other => other,
    };
    if !value.is_array() {
        warn!("Column {} is not an array, using empty list", column);
        return Vec::new();
    }
    serde_json::from_value(value).unwrap_or_else(|e| {
        warn!("Column {} has unexpected items, using empty list: {}", column, e);
        Vec::new()
    })
}

fn parse_object(column: &'static str, value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(raw) if raw.trim().is_empty() => None,
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Null) => None,
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Column {} holds invalid JSON, dropping it: {}", column, e);
                None
            }
        },
        other => Some(other),
    }
}

impl PropertyRow {
    /// Wire shape of the form. Derived image views are not part of it.
    pub fn from_form(form: &PropertyFormData) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: None,
            title: form.title.clone(),
            price: form.price.clone(),
            address: form.address.clone(),
            bedrooms: form.bedrooms.clone(),
            bathrooms: form.bathrooms.clone(),
            sqft: form.sqft.clone(),
            living_area: form.living_area.clone(),
            build_year: form.build_year.clone(),
            garages: form.garages.clone(),
            energy_label: form.energy_label.clone(),
            has_garden: form.has_garden,
            description: form.description.clone(),
            short_description: form.short_description.clone(),
            location_description: form.location_description.clone(),
            latitude: form.latitude,
            longitude: form.longitude,
            object_id: form.object_id.clone(),
            agent_id: form.agent_id.clone(),
            template_id: form.template_id.clone(),
            virtual_tour_url: form.virtual_tour_url.clone(),
            youtube_url: form.youtube_url.clone(),
            floorplan_embed_script: form.floorplan_embed_script.clone(),
            notes: form.notes.clone(),
            property_type: form.property_type.clone(),
            map_image: form.map_image.clone(),
            general_info: match &form.general_info {
                Some(info) => Value::String(serde_json::to_string(info)?),
                None => Value::Null,
            },
            features: stringify(&form.features)?,
            areas: stringify(&form.areas)?,
            nearby_places: stringify(&form.nearby_places)?,
            nearby_cities: stringify(&form.nearby_cities)?,
        })
    }

    /// Rebuild the form from this row plus the property's image rows.
    ///
    /// Image rows are authoritative for images and floorplans.
    pub fn into_form(self, id: &str, image_rows: Vec<ImageRow>) -> PropertyFormData {
        let mut rows = image_rows;
        rows.sort_by_key(|row| row.sort_order.unwrap_or(i32::MAX));

        let (floorplans, images): (Vec<PropertyImage>, Vec<PropertyImage>) = rows
            .into_iter()
            .filter_map(ImageRow::into_image)
            .partition(|img| img.kind == ImageKind::Floorplan);

        PropertyFormData {
            id: Some(id.to_string()),
            title: self.title,
            price: self.price,
            address: self.address,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            sqft: self.sqft,
            living_area: self.living_area,
            build_year: self.build_year,
            garages: self.garages,
            energy_label: self.energy_label,
            has_garden: self.has_garden,
            description: self.description,
            short_description: self.short_description,
            location_description: self.location_description,
            latitude: self.latitude,
            longitude: self.longitude,
            object_id: self.object_id,
            agent_id: self.agent_id,
            template_id: self.template_id,
            virtual_tour_url: self.virtual_tour_url,
            youtube_url: self.youtube_url,
            floorplan_embed_script: self.floorplan_embed_script,
            notes: self.notes,
            property_type: self.property_type,
            map_image: self.map_image,
            general_info: parse_object("generalInfo", self.general_info),
            features: parse_collection::<Feature>("features", self.features),
            areas: parse_collection::<Area>("areas", self.areas),
            images,
            floorplans,
            nearby_places: parse_collection::<Place>("nearby_places", self.nearby_places),
            nearby_cities: parse_collection::<City>("nearby_cities", self.nearby_cities),
        }
    }
}

/// Row of the `property_images` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ImageRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub property_id: String,
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_main: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_featured_image: bool,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: ImageKind,
    #[serde(default)]
    pub area: Option<String>,
}

impl ImageRow {
    /// `area` comes from the area galleries, not from `image.area`
    pub fn from_image(property_id: &str, image: &PropertyImage, area: Option<&str>) -> Self {
        Self {
            id: Some(image.id.clone()).filter(|id| !id.is_empty()),
            property_id: property_id.to_string(),
            url: image.url.clone(),
            is_main: image.is_main,
            is_featured_image: image.is_featured_image,
            sort_order: image.sort_order,
            kind: image.kind,
            area: area.map(str::to_string),
        }
    }

    /// Rows without an id cannot be addressed later and are dropped
    pub fn into_image(self) -> Option<PropertyImage> {
        let id = self.id?;
        Some(PropertyImage {
            id,
            url: self.url,
            is_main: self.is_main,
            is_featured_image: self.is_featured_image,
            sort_order: self.sort_order,
            area: self.area,
            kind: self.kind,
        })
    }
}

/// Display flag columns of an image row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFlag {
    Main,
    Featured,
}

impl ImageFlag {
    pub fn column(&self) -> &'static str {
        match self {
            ImageFlag::Main => "is_main",
            ImageFlag::Featured => "is_featured_image",
        }
    }
}

/// Columns rewritten on existing image rows during a save. A `None` area is
/// written as null and detaches the image from its area.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImagePatch {
    pub sort_order: Option<i32>,
    pub area: Option<String>,
}

/// A file picked for upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Outcome of a successful primary write
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReceipt {
    pub property_id: String,
    pub created: bool,
    /// Secondary writes that failed; the save still counts as successful
    pub secondary_failures: Vec<String>,
    /// Media ids of the snapshot mapped to the row ids the store holds, for
    /// every image or floorplan whose row id differs
    pub media_ids: HashMap<String, String>,
}

impl SaveReceipt {
    pub fn new(property_id: &str, created: bool) -> Self {
        Self {
            property_id: property_id.to_string(),
            created,
            secondary_failures: Vec::new(),
            media_ids: HashMap::new(),
        }
    }

    /// Note the row id backing a snapshot image, if it differs
    pub fn adopt(&mut self, media_id: &str, row_id: String) {
        if media_id != row_id {
            self.media_ids.insert(media_id.to_string(), row_id);
        }
    }
}
