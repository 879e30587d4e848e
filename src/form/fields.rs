use crate::error::FormError;
use crate::models::PropertyFormData;
use serde_json::Value;

/// A new value for one scalar field of the property form
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    Title(String),
    Price(String),
    Address(String),
    Bedrooms(String),
    Bathrooms(String),
    Sqft(String),
    LivingArea(String),
    BuildYear(String),
    Garages(String),
    EnergyLabel(String),
    HasGarden(bool),
    Description(String),
    ShortDescription(String),
    LocationDescription(String),
    Latitude(Option<f64>),
    Longitude(Option<f64>),
    ObjectId(Option<String>),
    AgentId(Option<String>),
    TemplateId(Option<String>),
    VirtualTourUrl(String),
    YoutubeUrl(String),
    FloorplanEmbedScript(String),
    Notes(String),
    PropertyType(String),
    MapImage(Option<String>),
    /// Opaque block edited elsewhere; stored as given
    GeneralInfo(Option<Value>),
}

impl FieldChange {
    /// Build a change from a form key as sent by the UI (`"livingArea"`, `"hasGarden"`, ...)
    pub fn from_named(name: &str, value: Value) -> Result<Self, FormError> {
        let change = match name {
            "title" => FieldChange::Title(text("title", value)?),
            "price" => FieldChange::Price(text("price", value)?),
            "address" => FieldChange::Address(text("address", value)?),
            "bedrooms" => FieldChange::Bedrooms(text("bedrooms", value)?),
            "bathrooms" => FieldChange::Bathrooms(text("bathrooms", value)?),
            "sqft" => FieldChange::Sqft(text("sqft", value)?),
            "livingArea" => FieldChange::LivingArea(text("livingArea", value)?),
            "buildYear" => FieldChange::BuildYear(text("buildYear", value)?),
            "garages" => FieldChange::Garages(text("garages", value)?),
            "energyLabel" => FieldChange::EnergyLabel(text("energyLabel", value)?),
            "hasGarden" => FieldChange::HasGarden(value.as_bool().ok_or(FormError::InvalidValue {
                field: "hasGarden",
                expected: "boolean",
            })?),
            "description" => FieldChange::Description(text("description", value)?),
            "shortDescription" => FieldChange::ShortDescription(text("shortDescription", value)?),
            "location_description" => {
                FieldChange::LocationDescription(text("location_description", value)?)
            }
            "latitude" => FieldChange::Latitude(number("latitude", value)?),
            "longitude" => FieldChange::Longitude(number("longitude", value)?),
            "object_id" => FieldChange::ObjectId(optional_text("object_id", value)?),
            "agent_id" => FieldChange::AgentId(optional_text("agent_id", value)?),
            "template_id" => FieldChange::TemplateId(optional_text("template_id", value)?),
            "virtualTourUrl" => FieldChange::VirtualTourUrl(text("virtualTourUrl", value)?),
            "youtubeUrl" => FieldChange::YoutubeUrl(text("youtubeUrl", value)?),
            "floorplanEmbedScript" => {
                FieldChange::FloorplanEmbedScript(text("floorplanEmbedScript", value)?)
            }
            "notes" => FieldChange::Notes(text("notes", value)?),
            "propertyType" => FieldChange::PropertyType(text("propertyType", value)?),
            "map_image" => FieldChange::MapImage(optional_text("map_image", value)?),
            "generalInfo" => FieldChange::GeneralInfo(Some(value).filter(|v| !v.is_null())),
            other => return Err(FormError::UnknownField(other.to_string())),
        };
        Ok(change)
    }
}

// Numbers are accepted for text fields since the UI sends numeric inputs as either.
fn text(field: &'static str, value: Value) -> Result<String, FormError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(FormError::InvalidValue {
            field,
            expected: "string",
        }),
    }
}

fn optional_text(field: &'static str, value: Value) -> Result<Option<String>, FormError> {
    match value {
        Value::Null => Ok(None),
        other => text(field, other).map(Some),
    }
}

fn number(field: &'static str, value: Value) -> Result<Option<f64>, FormError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse().map(Some).map_err(|_| FormError::InvalidValue {
            field,
            expected: "number",
        }),
        _ => Err(FormError::InvalidValue {
            field,
            expected: "number",
        }),
    }
}

/// Produce the next snapshot with one scalar field replaced.
///
/// No validation happens here; required fields are checked when saving.
pub fn set_field(state: &PropertyFormData, change: FieldChange) -> PropertyFormData {
    let mut next = state.clone();
    match change {
        FieldChange::Title(v) => next.title = v,
        FieldChange::Price(v) => next.price = v,
        FieldChange::Address(v) => next.address = v,
        FieldChange::Bedrooms(v) => next.bedrooms = v,
        FieldChange::Bathrooms(v) => next.bathrooms = v,
        FieldChange::Sqft(v) => next.sqft = v,
        FieldChange::LivingArea(v) => next.living_area = v,
        FieldChange::BuildYear(v) => next.build_year = v,
        FieldChange::Garages(v) => next.garages = v,
        FieldChange::EnergyLabel(v) => next.energy_label = v,
        FieldChange::HasGarden(v) => next.has_garden = v,
        FieldChange::Description(v) => next.description = v,
        FieldChange::ShortDescription(v) => next.short_description = v,
        FieldChange::LocationDescription(v) => next.location_description = v,
        FieldChange::Latitude(v) => next.latitude = v,
        FieldChange::Longitude(v) => next.longitude = v,
        FieldChange::ObjectId(v) => next.object_id = v,
        FieldChange::AgentId(v) => next.agent_id = v,
        FieldChange::TemplateId(v) => next.template_id = v,
        FieldChange::VirtualTourUrl(v) => next.virtual_tour_url = v,
        FieldChange::YoutubeUrl(v) => next.youtube_url = v,
        FieldChange::FloorplanEmbedScript(v) => next.floorplan_embed_script = v,
        FieldChange::Notes(v) => next.notes = v,
        FieldChange::PropertyType(v) => next.property_type = v,
        FieldChange::MapImage(v) => next.map_image = v,
        FieldChange::GeneralInfo(v) => next.general_info = v,
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_field_leaves_original_untouched() {
        let before = PropertyFormData::default();
        let after = set_field(&before, FieldChange::Title("Villa".into()));
        assert_eq!(after.title, "Villa");
        assert_eq!(before.title, "");
    }

    #[test]
    fn named_keys_map_to_fields() {
        let form = PropertyFormData::default();
        let form = set_field(&form, FieldChange::from_named("livingArea", json!("85")).unwrap());
        let form = set_field(&form, FieldChange::from_named("bedrooms", json!(3)).unwrap());
        let form = set_field(&form, FieldChange::from_named("hasGarden", json!(true)).unwrap());
        let form = set_field(&form, FieldChange::from_named("latitude", json!("52.37")).unwrap());
        let form = set_field(&form, FieldChange::from_named("agent_id", json!(null)).unwrap());

        assert_eq!(form.living_area, "85");
        assert_eq!(form.bedrooms, "3");
        assert!(form.has_garden);
        assert_eq!(form.latitude, Some(52.37));
        assert_eq!(form.agent_id, None);
    }

    #[test]
    fn general_info_is_stored_opaque() {
        let info = json!({"keyInfo": {"status": "available"}});
        let form = set_field(
            &PropertyFormData::default(),
            FieldChange::from_named("generalInfo", info.clone()).unwrap(),
        );
        assert_eq!(form.general_info, Some(info));

        let form = set_field(&form, FieldChange::from_named("generalInfo", json!(null)).unwrap());
        assert_eq!(form.general_info, None);
    }

    #[test]
    fn unknown_and_mistyped_fields_are_rejected() {
        assert_eq!(
            FieldChange::from_named("colour", json!("red")),
            Err(FormError::UnknownField("colour".into()))
        );
        assert_eq!(
            FieldChange::from_named("hasGarden", json!("yes")),
            Err(FormError::InvalidValue {
                field: "hasGarden",
                expected: "boolean"
            })
        );
    }
}
