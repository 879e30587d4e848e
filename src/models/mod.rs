use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of media row stored for a property
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    #[default]
    Image,
    Floorplan,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Image => "image",
            ImageKind::Floorplan => "floorplan",
        }
    }
}

/// A single bullet in the feature list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Feature {
    pub id: String,
    #[serde(default)]
    pub description: String,
}

/// A room or zone of the property with its own gallery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Area {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_columns")]
    pub columns: u8,
    /// Gallery of the area; see [`PropertyFormData::area_images`]
    #[serde(default, rename = "imageIds")]
    pub image_ids: Vec<String>,
}

fn default_columns() -> u8 {
    2
}

impl Default for Area {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            columns: default_columns(),
            image_ids: Vec::new(),
        }
    }
}

/// Photo or floorplan attached to a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PropertyImage {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub is_main: bool,
    #[serde(default)]
    pub is_featured_image: bool,
    #[serde(default)]
    pub sort_order: Option<i32>,
    /// Area column as last read from the store. Saves write
    /// [`PropertyFormData::area_of`] instead.
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: ImageKind,
}

/// Point of interest near the property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Place {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vicinity: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: u32,
    #[serde(default, rename = "type")]
    pub place_type: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub visible_in_webview: bool,
    /// Kilometres from the property
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct City {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub distance: Option<f64>,
}

/// Aggregate root edited by the property form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PropertyFormData {
    pub id: Option<String>,
    pub title: String,
    pub price: String,
    pub address: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub sqft: String,
    #[serde(rename = "livingArea")]
    pub living_area: String,
    #[serde(rename = "buildYear")]
    pub build_year: String,
    pub garages: String,
    #[serde(rename = "energyLabel")]
    pub energy_label: String,
    #[serde(rename = "hasGarden")]
    pub has_garden: bool,
    pub description: String,
    #[serde(rename = "shortDescription")]
    pub short_description: String,
    pub location_description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub object_id: Option<String>,
    pub agent_id: Option<String>,
    pub template_id: Option<String>,
    #[serde(rename = "virtualTourUrl")]
    pub virtual_tour_url: String,
    #[serde(rename = "youtubeUrl")]
    pub youtube_url: String,
    #[serde(rename = "floorplanEmbedScript")]
    pub floorplan_embed_script: String,
    pub notes: String,
    #[serde(rename = "propertyType")]
    pub property_type: String,
    pub map_image: Option<String>,
    /// Free-form block kept as-is between load and save
    #[serde(rename = "generalInfo", skip_serializing_if = "Option::is_none")]
    pub general_info: Option<Value>,
    pub features: Vec<Feature>,
    pub areas: Vec<Area>,
    pub images: Vec<PropertyImage>,
    pub floorplans: Vec<PropertyImage>,
    pub nearby_places: Vec<Place>,
    pub nearby_cities: Vec<City>,
}

impl PropertyFormData {
    /// URL of the image flagged as main, if any
    pub fn featured_image(&self) -> Option<&str> {
        self.images
            .iter()
            .find(|img| img.is_main)
            .map(|img| img.url.as_str())
    }

    /// URLs of all images flagged as featured, in collection order
    pub fn featured_images(&self) -> Vec<&str> {
        self.images
            .iter()
            .filter(|img| img.is_featured_image)
            .map(|img| img.url.as_str())
            .collect()
    }

    /// Featured images ordered by `sort_order` (unordered ones last)
    pub fn grid_images(&self) -> Vec<&PropertyImage> {
        let mut grid: Vec<&PropertyImage> = self
            .images
            .iter()
            .filter(|img| img.is_featured_image)
            .collect();
        grid.sort_by_key(|img| img.sort_order.unwrap_or(i32::MAX));
        grid
    }

    /// Images listed in an area's gallery, in gallery order. Ids that match no
    /// image are skipped.
    pub fn area_images(&self, area_id: &str) -> Vec<&PropertyImage> {
        let Some(area) = self.areas.iter().find(|a| a.id == area_id) else {
            return Vec::new();
        };
        area.image_ids
            .iter()
            .filter_map(|id| self.images.iter().find(|img| &img.id == id))
            .collect()
    }

    /// Area whose gallery lists the image, if any
    pub fn area_of(&self, image_id: &str) -> Option<&str> {
        self.areas
            .iter()
            .find(|a| a.image_ids.iter().any(|id| id == image_id))
            .map(|a| a.id.as_str())
    }

    /// Main image first, followed by the grid images
    pub fn cover_images(&self) -> Vec<&PropertyImage> {
        let main = self.images.iter().find(|img| img.is_main);
        main.into_iter()
            .chain(
                self.grid_images()
                    .into_iter()
                    .filter(|img| !img.is_main),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str, main: bool, featured: bool, order: Option<i32>) -> PropertyImage {
        PropertyImage {
            id: id.to_string(),
            url: format!("https://cdn.test/{id}.jpg"),
            is_main: main,
            is_featured_image: featured,
            sort_order: order,
            ..Default::default()
        }
    }

    #[test]
    fn derived_views_follow_image_flags() {
        let form = PropertyFormData {
            images: vec![
                image("a", false, true, Some(2)),
                image("b", true, true, Some(0)),
                image("c", false, false, Some(1)),
                image("d", false, true, None),
            ],
            ..Default::default()
        };

        assert_eq!(form.featured_image(), Some("https://cdn.test/b.jpg"));
        assert_eq!(form.featured_images().len(), 3);

        let grid: Vec<&str> = form.grid_images().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(grid, vec!["b", "a", "d"]);

        let cover: Vec<&str> = form.cover_images().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(cover, vec!["b", "a", "d"]);
    }

    #[test]
    fn area_galleries_resolve_against_current_images() {
        let mut form = PropertyFormData {
            images: vec![image("a", false, false, None), image("b", false, false, None)],
            areas: vec![Area {
                id: "garden".into(),
                image_ids: vec!["b".into(), "gone".into(), "a".into()],
                ..Default::default()
            }],
            ..Default::default()
        };
        form.images[1].is_featured_image = true;

        let gallery = form.area_images("garden");
        let ids: Vec<&str> = gallery.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(gallery[0].is_featured_image);
        assert!(form.area_images("attic").is_empty());
        assert_eq!(form.area_of("a"), Some("garden"));
        assert_eq!(form.area_of("gone"), Some("garden"));
        assert_eq!(form.area_of("c"), None);
    }

    #[test]
    fn draft_json_uses_wire_keys() {
        let json = r#"{
            "title": "Canal house",
            "livingArea": "120",
            "hasGarden": true,
            "generalInfo": {"keyInfo": {"status": "sold"}},
            "areas": [{"id": "k", "title": "Kitchen", "imageIds": ["x"]}]
        }"#;
        let form: PropertyFormData = serde_json::from_str(json).unwrap();
        assert_eq!(form.living_area, "120");
        assert!(form.has_garden);
        assert_eq!(form.areas[0].columns, 2);
        assert_eq!(form.areas[0].image_ids, vec!["x".to_string()]);
        assert!(form.id.is_none());
        assert_eq!(form.general_info.unwrap()["keyInfo"]["status"], "sold");
    }
}
