//! In-memory store used by the tests. Records every call and can be told to
//! fail specific operations.

use crate::models::ImageKind;
use crate::sync::traits::{MediaUploader, PropertyStore};
use crate::sync::types::{ImageFlag, ImagePatch, ImageRow, PropertyRow, UploadFile};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    properties: HashMap<String, PropertyRow>,
    images: Vec<ImageRow>,
    calls: Vec<String>,
    failing: HashSet<String>,
    next_id: u32,
    /// Ignore ids sent with new image rows and generate one instead
    own_image_ids: bool,
}

impl State {
    fn enter(&mut self, op: &str) -> Result<()> {
        self.calls.push(op.to_string());
        if self.failing.contains(op) {
            bail!("{} failed (injected)", op);
        }
        Ok(())
    }

    fn generate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn fail_on(&self, op: &str) {
        self.lock().failing.insert(op.to_string());
    }

    pub fn recover(&self, op: &str) {
        self.lock().failing.remove(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Behave like a table with a generated primary key for image rows
    pub fn assign_image_ids(&self) {
        self.lock().own_image_ids = true;
    }

    pub fn seed_property(&self, row: PropertyRow) -> String {
        let mut state = self.lock();
        let id = state.generate_id("prop");
        state.properties.insert(id.clone(), row);
        id
    }

    pub fn seed_image(&self, row: ImageRow) {
        self.lock().images.push(row);
    }

    pub fn property(&self, id: &str) -> Option<PropertyRow> {
        self.lock().properties.get(id).cloned()
    }

    pub fn image_rows(&self, property_id: &str) -> Vec<ImageRow> {
        self.lock()
            .images
            .iter()
            .filter(|r| r.property_id == property_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PropertyStore for MemoryStore {
    async fn fetch_property(&self, id: &str) -> Result<Option<PropertyRow>> {
        let mut state = self.lock();
        state.enter("fetch_property")?;
        Ok(state.properties.get(id).cloned().map(|mut row| {
            row.id = Some(id.to_string());
            row
        }))
    }

    async fn insert_property(&self, row: &PropertyRow) -> Result<String> {
        let mut state = self.lock();
        state.enter("insert_property")?;
        let id = state.generate_id("prop");
        state.properties.insert(id.clone(), row.clone());
        Ok(id)
    }

    async fn update_property(&self, id: &str, row: &PropertyRow) -> Result<()> {
        let mut state = self.lock();
        state.enter("update_property")?;
        let slot = state
            .properties
            .get_mut(id)
            .ok_or_else(|| anyhow!("no property {}", id))?;
        *slot = row.clone();
        Ok(())
    }

    async fn update_property_column(&self, id: &str, column: &str, value: Value) -> Result<()> {
        let mut state = self.lock();
        state.enter("update_property_column")?;
        let slot = state
            .properties
            .get_mut(id)
            .ok_or_else(|| anyhow!("no property {}", id))?;
        let mut wire = serde_json::to_value(&*slot)?;
        wire[column] = value;
        *slot = serde_json::from_value(wire)?;
        Ok(())
    }

    async fn list_images(&self, property_id: &str, kind: Option<ImageKind>) -> Result<Vec<ImageRow>> {
        let mut state = self.lock();
        state.enter("list_images")?;
        let mut rows: Vec<ImageRow> = state
            .images
            .iter()
            .filter(|r| r.property_id == property_id)
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.sort_order.unwrap_or(i32::MAX));
        Ok(rows)
    }

    async fn insert_image(&self, row: &ImageRow) -> Result<String> {
        let mut state = self.lock();
        state.enter("insert_image")?;
        let mut row = row.clone();
        let id = match row.id.clone() {
            Some(id) if !state.own_image_ids => id,
            _ => state.generate_id("img"),
        };
        row.id = Some(id.clone());
        state.images.push(row);
        Ok(id)
    }

    async fn delete_image(&self, property_id: &str, image_id: &str) -> Result<()> {
        let mut state = self.lock();
        state.enter("delete_image")?;
        state
            .images
            .retain(|r| !(r.property_id == property_id && r.id.as_deref() == Some(image_id)));
        Ok(())
    }

    async fn reset_image_flags(&self, property_id: &str) -> Result<()> {
        let mut state = self.lock();
        state.enter("reset_image_flags")?;
        for row in state.images.iter_mut().filter(|r| r.property_id == property_id) {
            row.is_main = false;
            row.is_featured_image = false;
        }
        Ok(())
    }

    async fn set_image_flag(&self, property_id: &str, url: &str, flag: ImageFlag) -> Result<()> {
        let mut state = self.lock();
        state.enter("set_image_flag")?;
        for row in state
            .images
            .iter_mut()
            .filter(|r| r.property_id == property_id && r.url == url)
        {
            match flag {
                ImageFlag::Main => row.is_main = true,
                ImageFlag::Featured => row.is_featured_image = true,
            }
        }
        Ok(())
    }

    async fn update_image(&self, property_id: &str, image_id: &str, patch: &ImagePatch) -> Result<()> {
        let mut state = self.lock();
        state.enter("update_image")?;
        for row in state
            .images
            .iter_mut()
            .filter(|r| r.property_id == property_id && r.id.as_deref() == Some(image_id))
        {
            row.sort_order = patch.sort_order;
            row.area = patch.area.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl MediaUploader for MemoryStore {
    async fn upload(
        &self,
        property_id: Option<&str>,
        kind: ImageKind,
        files: Vec<UploadFile>,
    ) -> Result<Vec<String>> {
        let mut state = self.lock();
        state.enter("upload")?;
        Ok(files
            .iter()
            .map(|f| {
                format!(
                    "memory://{}/{}/{}",
                    property_id.unwrap_or("new"),
                    kind.as_str(),
                    f.name
                )
            })
            .collect())
    }
}
