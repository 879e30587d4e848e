//! Add/remove/update operations over the nested collections of a property.
//!
//! Every operation takes the current snapshot and returns an [`Edit`] holding
//! the next one. Unknown identifiers never fail: the snapshot comes back
//! unchanged, the outcome names what was not found, and a warning is emitted
//! on the diagnostics target.

use crate::models::{Area, Feature, ImageKind, PropertyFormData, PropertyImage};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

pub const DIAGNOSTICS_TARGET: &str = "property_studio::diagnostics";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Features,
    Areas,
    Images,
    Floorplans,
    NearbyPlaces,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// New items were appended with these ids
    Added(Vec<String>),
    Applied,
    /// Nothing matched `id`; the snapshot is unchanged
    Missing { collection: CollectionKind, id: String },
    /// Applied, but these ids could not be resolved (dangling or left out)
    Unresolved {
        collection: CollectionKind,
        ids: Vec<String>,
    },
}

impl EditOutcome {
    /// True when the edit went through without any diagnostic
    pub fn is_clean(&self) -> bool {
        matches!(self, EditOutcome::Added(_) | EditOutcome::Applied)
    }
}

/// Result of a collection operation
#[derive(Debug, Clone)]
pub struct Edit {
    pub state: PropertyFormData,
    pub outcome: EditOutcome,
}

impl Edit {
    fn new(state: PropertyFormData, outcome: EditOutcome) -> Self {
        match &outcome {
            EditOutcome::Missing { collection, id } => {
                warn!(target: DIAGNOSTICS_TARGET, ?collection, %id, "no item with this id, edit ignored");
            }
            EditOutcome::Unresolved { collection, ids } => {
                warn!(target: DIAGNOSTICS_TARGET, ?collection, ?ids, "edit applied with unresolved ids");
            }
            _ => {}
        }
        Self { state, outcome }
    }

    fn missing(state: &PropertyFormData, collection: CollectionKind, id: &str) -> Self {
        Self::new(
            state.clone(),
            EditOutcome::Missing {
                collection,
                id: id.to_string(),
            },
        )
    }

    /// First id appended by this edit, if any
    pub fn added_id(&self) -> Option<&str> {
        match &self.outcome {
            EditOutcome::Added(ids) => ids.first().map(String::as_str),
            _ => None,
        }
    }
}

/// A nested collection of the property form that supports add/remove/update
pub trait Collection {
    type Item: Clone;
    type Field;
    const KIND: CollectionKind;

    fn items(state: &PropertyFormData) -> &Vec<Self::Item>;
    fn items_mut(state: &mut PropertyFormData) -> &mut Vec<Self::Item>;
    fn id(item: &Self::Item) -> &str;
    /// Empty item appended by `add`
    fn fresh(id: String, state: &PropertyFormData) -> Self::Item;
    fn apply(item: &mut Self::Item, field: Self::Field);
}

pub struct Features;
pub struct Areas;
pub struct Images;
pub struct Floorplans;

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureField {
    Description(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AreaField {
    Title(String),
    Description(String),
    Columns(u8),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageField {
    Url(String),
    SortOrder(Option<i32>),
}

impl Collection for Features {
    type Item = Feature;
    type Field = FeatureField;
    const KIND: CollectionKind = CollectionKind::Features;

    fn items(state: &PropertyFormData) -> &Vec<Feature> {
        &state.features
    }

    fn items_mut(state: &mut PropertyFormData) -> &mut Vec<Feature> {
        &mut state.features
    }

    fn id(item: &Feature) -> &str {
        &item.id
    }

    fn fresh(id: String, _state: &PropertyFormData) -> Feature {
        Feature {
            id,
            description: String::new(),
        }
    }

    fn apply(item: &mut Feature, field: FeatureField) {
        match field {
            FeatureField::Description(v) => item.description = v,
        }
    }
}

impl Collection for Areas {
    type Item = Area;
    type Field = AreaField;
    const KIND: CollectionKind = CollectionKind::Areas;

    fn items(state: &PropertyFormData) -> &Vec<Area> {
        &state.areas
    }

    fn items_mut(state: &mut PropertyFormData) -> &mut Vec<Area> {
        &mut state.areas
    }

    fn id(item: &Area) -> &str {
        &item.id
    }

    fn fresh(id: String, _state: &PropertyFormData) -> Area {
        Area {
            id,
            ..Area::default()
        }
    }

    fn apply(item: &mut Area, field: AreaField) {
        match field {
            AreaField::Title(v) => item.title = v,
            AreaField::Description(v) => item.description = v,
            AreaField::Columns(v) => item.columns = v,
        }
    }
}

fn fresh_image(id: String, kind: ImageKind, items: &[PropertyImage]) -> PropertyImage {
    PropertyImage {
        id,
        kind,
        sort_order: Some(next_sort_order(items)),
        ..PropertyImage::default()
    }
}

fn apply_image(item: &mut PropertyImage, field: ImageField) {
    match field {
        ImageField::Url(v) => item.url = v,
        ImageField::SortOrder(v) => item.sort_order = v,
    }
}

impl Collection for Images {
    type Item = PropertyImage;
    type Field = ImageField;
    const KIND: CollectionKind = CollectionKind::Images;

    fn items(state: &PropertyFormData) -> &Vec<PropertyImage> {
        &state.images
    }

    fn items_mut(state: &mut PropertyFormData) -> &mut Vec<PropertyImage> {
        &mut state.images
    }

    fn id(item: &PropertyImage) -> &str {
        &item.id
    }

    fn fresh(id: String, state: &PropertyFormData) -> PropertyImage {
        fresh_image(id, ImageKind::Image, &state.images)
    }

    fn apply(item: &mut PropertyImage, field: ImageField) {
        apply_image(item, field)
    }
}

impl Collection for Floorplans {
    type Item = PropertyImage;
    type Field = ImageField;
    const KIND: CollectionKind = CollectionKind::Floorplans;

    fn items(state: &PropertyFormData) -> &Vec<PropertyImage> {
        &state.floorplans
    }

    fn items_mut(state: &mut PropertyFormData) -> &mut Vec<PropertyImage> {
        &mut state.floorplans
    }

    fn id(item: &PropertyImage) -> &str {
        &item.id
    }

    fn fresh(id: String, state: &PropertyFormData) -> PropertyImage {
        fresh_image(id, ImageKind::Floorplan, &state.floorplans)
    }

    fn apply(item: &mut PropertyImage, field: ImageField) {
        apply_image(item, field)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn next_sort_order(items: &[PropertyImage]) -> i32 {
    items
        .iter()
        .filter_map(|img| img.sort_order)
        .max()
        .map_or(0, |max| max + 1)
}

/// Append an empty item with a fresh id
pub fn add<C: Collection>(state: &PropertyFormData) -> Edit {
    let id = new_id();
    let item = C::fresh(id.clone(), state);
    let mut next = state.clone();
    C::items_mut(&mut next).push(item);
    debug!(collection = ?C::KIND, %id, "item added");
    Edit::new(next, EditOutcome::Added(vec![id]))
}

pub fn remove<C: Collection>(state: &PropertyFormData, id: &str) -> Edit {
    if !C::items(state).iter().any(|item| C::id(item) == id) {
        return Edit::missing(state, C::KIND, id);
    }
    let mut next = state.clone();
    C::items_mut(&mut next).retain(|item| C::id(item) != id);
    debug!(collection = ?C::KIND, %id, "item removed");
    Edit::new(next, EditOutcome::Applied)
}

/// Replace one field of the item with the given id
pub fn update<C: Collection>(state: &PropertyFormData, id: &str, field: C::Field) -> Edit {
    let mut next = state.clone();
    match C::items_mut(&mut next).iter_mut().find(|item| C::id(item) == id) {
        Some(item) => {
            C::apply(item, field);
            Edit::new(next, EditOutcome::Applied)
        }
        None => Edit::missing(state, C::KIND, id),
    }
}

/// Remove an image and drop every area reference to it
pub fn remove_image(state: &PropertyFormData, id: &str) -> Edit {
    let edit = remove::<Images>(state, id);
    if !edit.outcome.is_clean() {
        return edit;
    }
    let mut next = edit.state;
    for area in next.areas.iter_mut() {
        area.image_ids.retain(|image_id| image_id != id);
    }
    Edit::new(next, EditOutcome::Applied)
}

/// Replace client-side media ids with the ids the store assigned, including
/// area gallery references, and align each image's area column with the galleries.
pub fn adopt_media_ids(state: &PropertyFormData, assigned: &HashMap<String, String>) -> PropertyFormData {
    let mut next = state.clone();
    for img in next.images.iter_mut().chain(next.floorplans.iter_mut()) {
        if let Some(id) = assigned.get(&img.id) {
            debug!(from = %img.id, to = %id, "media id adopted");
            img.id = id.clone();
        }
    }
    for area in next.areas.iter_mut() {
        for image_id in area.image_ids.iter_mut() {
            if let Some(id) = assigned.get(image_id.as_str()) {
                *image_id = id.clone();
            }
        }
    }
    let areas: Vec<Option<String>> = next
        .images
        .iter()
        .map(|img| next.area_of(&img.id).map(str::to_string))
        .collect();
    for (img, area) in next.images.iter_mut().zip(areas) {
        img.area = area;
    }
    next
}

/// Append uploaded files as new images or floorplans, ordered after the existing ones
pub fn attach_uploaded(state: &PropertyFormData, kind: ImageKind, urls: &[String]) -> Edit {
    let mut next = state.clone();
    let items = match kind {
        ImageKind::Image => &mut next.images,
        ImageKind::Floorplan => &mut next.floorplans,
    };
    let mut order = next_sort_order(items.as_slice());
    let mut ids = Vec::with_capacity(urls.len());
    for url in urls {
        let id = new_id();
        items.push(PropertyImage {
            id: id.clone(),
            url: url.clone(),
            sort_order: Some(order),
            kind,
            ..PropertyImage::default()
        });
        ids.push(id);
        order += 1;
    }
    debug!(kind = kind.as_str(), count = ids.len(), "uploads attached");
    Edit::new(next, EditOutcome::Added(ids))
}

/// Overwrite the selected images of one area.
///
/// The selection is replaced wholesale; callers wanting a union compute it first.
pub fn select_area_images(state: &PropertyFormData, area_id: &str, image_ids: &[String]) -> Edit {
    let mut next = state.clone();
    let dangling: Vec<String> = image_ids
        .iter()
        .filter(|id| !state.images.iter().any(|img| &img.id == *id))
        .cloned()
        .collect();

    let Some(area) = next.areas.iter_mut().find(|a| a.id == area_id) else {
        return Edit::missing(state, CollectionKind::Areas, area_id);
    };
    area.image_ids = image_ids.to_vec();

    let outcome = if dangling.is_empty() {
        EditOutcome::Applied
    } else {
        EditOutcome::Unresolved {
            collection: CollectionKind::Images,
            ids: dangling,
        }
    };
    Edit::new(next, outcome)
}

pub fn remove_area_image(state: &PropertyFormData, area_id: &str, image_id: &str) -> Edit {
    let mut next = state.clone();
    let Some(area) = next.areas.iter_mut().find(|a| a.id == area_id) else {
        return Edit::missing(state, CollectionKind::Areas, area_id);
    };
    if !area.image_ids.iter().any(|id| id == image_id) {
        return Edit::missing(state, CollectionKind::Images, image_id);
    }
    area.image_ids.retain(|id| id != image_id);
    Edit::new(next, EditOutcome::Applied)
}

/// Give listed images `sort_order` equal to their position and move them to the front.
///
/// Images left out of `ids` keep their old order value and are reported, as are
/// ids that match no image.
pub fn reorder_images(state: &PropertyFormData, ids: &[String]) -> Edit {
    let mut remaining = state.images.clone();
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut unknown = Vec::new();
    let mut seen = HashSet::new();

    for (position, id) in ids.iter().enumerate() {
        if !seen.insert(id.as_str()) {
            continue;
        }
        match remaining.iter().position(|img| &img.id == id) {
            Some(idx) => {
                let mut img = remaining.remove(idx);
                img.sort_order = Some(position as i32);
                ordered.push(img);
            }
            None => unknown.push(id.clone()),
        }
    }

    let mut unresolved: Vec<String> = remaining.iter().map(|img| img.id.clone()).collect();
    unresolved.extend(unknown);
    ordered.extend(remaining);

    let mut next = state.clone();
    next.images = ordered;
    let outcome = if unresolved.is_empty() {
        EditOutcome::Applied
    } else {
        EditOutcome::Unresolved {
            collection: CollectionKind::Images,
            ids: unresolved,
        }
    };
    Edit::new(next, outcome)
}

/// Flag exactly one image as the main image
pub fn set_main_image(state: &PropertyFormData, id: &str) -> Edit {
    if !state.images.iter().any(|img| img.id == id) {
        return Edit::missing(state, CollectionKind::Images, id);
    }
    let mut next = state.clone();
    for img in next.images.iter_mut() {
        img.is_main = img.id == id;
    }
    Edit::new(next, EditOutcome::Applied)
}

pub fn toggle_featured_image(state: &PropertyFormData, id: &str) -> Edit {
    let mut next = state.clone();
    match next.images.iter_mut().find(|img| img.id == id) {
        Some(img) => {
            img.is_featured_image = !img.is_featured_image;
            Edit::new(next, EditOutcome::Applied)
        }
        None => Edit::missing(state, CollectionKind::Images, id),
    }
}

pub fn remove_nearby_place(state: &PropertyFormData, id: &str) -> Edit {
    if !state.nearby_places.iter().any(|p| p.id == id) {
        return Edit::missing(state, CollectionKind::NearbyPlaces, id);
    }
    let mut next = state.clone();
    next.nearby_places.retain(|p| p.id != id);
    Edit::new(next, EditOutcome::Applied)
}

pub fn set_place_visibility(state: &PropertyFormData, id: &str, visible: bool) -> Edit {
    let mut next = state.clone();
    match next.nearby_places.iter_mut().find(|p| p.id == id) {
        Some(place) => {
            place.visible_in_webview = visible;
            Edit::new(next, EditOutcome::Applied)
        }
        None => Edit::missing(state, CollectionKind::NearbyPlaces, id),
    }
}
