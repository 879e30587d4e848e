use crate::error::{SyncError, ValidationIssue};
use crate::models::{PropertyFormData, PropertyImage};
use crate::sync::traits::PropertyStore;
use crate::sync::types::{ImageFlag, ImagePatch, ImageRow, PropertyRow, SaveReceipt};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Required fields for a property that has never been saved
pub fn validate_new_property(form: &PropertyFormData) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if form.title.trim().is_empty() {
        issues.push(ValidationIssue {
            field: "title",
            message: "is required",
        });
    }
    issues
}

fn existing_id(form: &PropertyFormData) -> Option<&str> {
    form.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
}

/// Writes property form snapshots to a [`PropertyStore`] and reads them back
pub struct PropertySync<S> {
    store: S,
}

impl<S: PropertyStore> PropertySync<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create or update the property row, then best-effort image writes.
    ///
    /// Only the primary write decides the result. Secondary failures are logged
    /// and listed in the receipt.
    pub async fn save(&self, form: &PropertyFormData) -> Result<SaveReceipt, SyncError> {
        if existing_id(form).is_none() {
            let issues = validate_new_property(form);
            if !issues.is_empty() {
                warn!("Refusing to create property: {} validation issue(s)", issues.len());
                return Err(SyncError::Validation(issues));
            }
        }

        let row = PropertyRow::from_form(form)?;
        debug!("Property payload: {:?}", row);

        match existing_id(form) {
            Some(id) => {
                self.store.update_property(id, &row).await?;
                info!("Updated property {}", id);
                let mut receipt = SaveReceipt::new(id, false);
                self.sync_media_after_update(form, &mut receipt).await;
                Ok(receipt)
            }
            None => {
                let id = self.store.insert_property(&row).await?;
                info!("Created property {}", id);
                let mut receipt = SaveReceipt::new(&id, true);
                self.insert_media_after_create(form, &mut receipt).await;
                Ok(receipt)
            }
        }
    }

    /// Load a property with its images and floorplans
    pub async fn load(&self, id: &str) -> Result<PropertyFormData, SyncError> {
        let row = self
            .store
            .fetch_property(id)
            .await?
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;

        let images = match self.store.list_images(id, None).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Could not load images for property {}: {:#}", id, e);
                Vec::new()
            }
        };

        info!("Loaded property {} with {} image row(s)", id, images.len());
        Ok(row.into_form(id, images))
    }

    /// Persist one column right away, outside the staged save
    pub async fn save_column(
        &self,
        form: &PropertyFormData,
        column: &str,
        value: Value,
    ) -> Result<(), SyncError> {
        let id = existing_id(form).ok_or(SyncError::MissingId)?;
        self.store.update_property_column(id, column, value).await?;
        info!("Saved {} for property {}", column, id);
        Ok(())
    }

    async fn insert_media(&self, form: &PropertyFormData, image: &PropertyImage, receipt: &mut SaveReceipt) {
        let row = ImageRow::from_image(&receipt.property_id, image, form.area_of(&image.id));
        match self.store.insert_image(&row).await {
            Ok(row_id) => receipt.adopt(&image.id, row_id),
            Err(e) => record(
                &mut receipt.secondary_failures,
                format!("insert {} {}", image.kind.as_str(), image.url),
                e,
            ),
        }
    }

    async fn insert_media_after_create(&self, form: &PropertyFormData, receipt: &mut SaveReceipt) {
        for image in form.images.iter().chain(form.floorplans.iter()) {
            if !image.url.is_empty() {
                self.insert_media(form, image, receipt).await;
            }
        }
    }

    /// Bring the image rows in line with the snapshot: flags, order and area
    /// on matching rows, new rows for new media, and deletion of rows the
    /// snapshot no longer lists.
    async fn sync_media_after_update(&self, form: &PropertyFormData, receipt: &mut SaveReceipt) {
        let id = receipt.property_id.clone();
        let failures = &mut receipt.secondary_failures;

        if let Err(e) = self.store.reset_image_flags(&id).await {
            record(failures, "reset image flags".to_string(), e);
        }
        if let Some(url) = form.featured_image() {
            if let Err(e) = self.store.set_image_flag(&id, url, ImageFlag::Main).await {
                record(failures, format!("set main image {}", url), e);
            }
        }
        for url in form.featured_images() {
            if let Err(e) = self.store.set_image_flag(&id, url, ImageFlag::Featured).await {
                record(failures, format!("set featured image {}", url), e);
            }
        }

        let existing = match self.store.list_images(&id, None).await {
            Ok(rows) => rows,
            Err(e) => {
                record(failures, "list image rows".to_string(), e);
                return;
            }
        };

        let mut claimed = vec![false; existing.len()];
        for image in form.images.iter().chain(form.floorplans.iter()) {
            let matched = (0..existing.len())
                .find(|&i| !claimed[i] && existing[i].id.as_deref() == Some(image.id.as_str()))
                .or_else(|| {
                    (0..existing.len()).find(|&i| {
                        let row = &existing[i];
                        !claimed[i] && !image.url.is_empty() && row.kind == image.kind && row.url == image.url
                    })
                });

            let row_id = match matched.and_then(|i| existing[i].id.as_deref().map(|row_id| (i, row_id))) {
                Some((i, row_id)) => {
                    claimed[i] = true;
                    row_id
                }
                None => {
                    if !image.url.is_empty() {
                        self.insert_media(form, image, receipt).await;
                    }
                    continue;
                }
            };

            let patch = ImagePatch {
                sort_order: image.sort_order,
                area: form.area_of(&image.id).map(str::to_string),
            };
            if let Err(e) = self.store.update_image(&id, row_id, &patch).await {
                record(&mut receipt.secondary_failures, format!("update image {}", row_id), e);
            }
            receipt.adopt(&image.id, row_id.to_string());
        }

        for (row, _) in existing.iter().zip(&claimed).filter(|(_, claimed)| !**claimed) {
            let Some(row_id) = row.id.as_deref() else {
                debug!("Skipping image row without id: {}", row.url);
                continue;
            };
            match self.store.delete_image(&id, row_id).await {
                Ok(()) => info!("Removed {} row {} from property {}", row.kind.as_str(), row_id, id),
                Err(e) => record(&mut receipt.secondary_failures, format!("delete image {}", row_id), e),
            }
        }
    }
}

fn record(failures: &mut Vec<String>, what: String, error: anyhow::Error) {
    warn!("Secondary write failed ({}): {:#}", what, error);
    failures.push(what);
}
