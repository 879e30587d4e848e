use crate::models::ImageKind;
use crate::sync::types::{ImageFlag, ImagePatch, ImageRow, PropertyRow, UploadFile};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Backing datastore holding property rows and their image rows
#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn fetch_property(&self, id: &str) -> Result<Option<PropertyRow>>;

    /// Insert a new property and return its generated id
    async fn insert_property(&self, row: &PropertyRow) -> Result<String>;

    async fn update_property(&self, id: &str, row: &PropertyRow) -> Result<()>;

    /// Write a single column of one property
    async fn update_property_column(&self, id: &str, column: &str, value: Value) -> Result<()>;

    /// Image rows of a property ordered by `sort_order`, optionally of one kind
    async fn list_images(&self, property_id: &str, kind: Option<ImageKind>) -> Result<Vec<ImageRow>>;

    /// Insert an image row and return the id the store holds for it
    async fn insert_image(&self, row: &ImageRow) -> Result<String>;

    async fn delete_image(&self, property_id: &str, image_id: &str) -> Result<()>;

    /// Clear main and featured flags on every image of the property
    async fn reset_image_flags(&self, property_id: &str) -> Result<()>;

    async fn set_image_flag(&self, property_id: &str, url: &str, flag: ImageFlag) -> Result<()>;

    async fn update_image(&self, property_id: &str, image_id: &str, patch: &ImagePatch) -> Result<()>;
}

/// File storage returning one public URL per uploaded file
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(
        &self,
        property_id: Option<&str>,
        kind: ImageKind,
        files: Vec<UploadFile>,
    ) -> Result<Vec<String>>;
}
