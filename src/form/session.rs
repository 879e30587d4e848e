use crate::enrichment::nearby;
use crate::error::{EnrichmentError, FormError, SyncError};
use crate::form::collections::{
    self, AreaField, Areas, Collection, EditOutcome, FeatureField, Features, Floorplans, ImageField,
    Images,
};
use crate::form::fields::{set_field, FieldChange};
use crate::form::steps::FormStep;
use crate::models::{ImageKind, Place, PropertyFormData};
use crate::sync::{MediaUploader, PropertyStore, PropertySync, SaveReceipt, UploadFile};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Whether the in-memory form has edits the store has not confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Clean,
    Dirty { since: DateTime<Utc> },
}

/// What happened to the autosave attempted before a step change
#[derive(Debug, Clone, PartialEq)]
pub enum SaveAttempt {
    /// No pending changes, or the property has never been saved
    Skipped,
    Saved,
    /// The step changed anyway; the edits stay pending
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepChange {
    pub from: FormStep,
    pub to: FormStep,
    pub save: SaveAttempt,
}

/// One editing session over a property: the current snapshot, its save state
/// and the form step being shown.
#[derive(Debug, Clone)]
pub struct FormSession {
    data: PropertyFormData,
    save_state: SaveState,
    last_saved: Option<DateTime<Utc>>,
    step: FormStep,
}

impl FormSession {
    pub fn new(data: PropertyFormData) -> Self {
        Self {
            data,
            save_state: SaveState::Clean,
            last_saved: None,
            step: FormStep::GeneralInfo,
        }
    }

    pub fn data(&self) -> &PropertyFormData {
        &self.data
    }

    pub fn save_state(&self) -> SaveState {
        self.save_state
    }

    pub fn has_pending_changes(&self) -> bool {
        matches!(self.save_state, SaveState::Dirty { .. })
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn current_step(&self) -> FormStep {
        self.step
    }

    /// Flag unsaved edits. Keeps the original timestamp if already dirty.
    pub fn mark_dirty(&mut self) {
        if self.save_state == SaveState::Clean {
            self.save_state = SaveState::Dirty { since: Utc::now() };
        }
    }

    fn mark_saved(&mut self) {
        self.save_state = SaveState::Clean;
        self.last_saved = Some(Utc::now());
    }

    fn apply(&mut self, edit: collections::Edit) -> EditOutcome {
        if !matches!(edit.outcome, EditOutcome::Missing { .. }) {
            self.data = edit.state;
            self.mark_dirty();
        }
        edit.outcome
    }

    // Field edits

    pub fn change_field(&mut self, change: FieldChange) {
        debug!("Field change: {:?}", change);
        self.data = set_field(&self.data, change);
        self.mark_dirty();
    }

    /// Apply a change keyed by its form name, as sent by the UI
    pub fn change_named_field(&mut self, name: &str, value: Value) -> Result<(), FormError> {
        let change = FieldChange::from_named(name, value)?;
        self.change_field(change);
        Ok(())
    }

    // Collection edits

    pub fn add<C: Collection>(&mut self) -> EditOutcome {
        self.apply(collections::add::<C>(&self.data))
    }

    pub fn remove<C: Collection>(&mut self, id: &str) -> EditOutcome {
        self.apply(collections::remove::<C>(&self.data, id))
    }

    pub fn update<C: Collection>(&mut self, id: &str, field: C::Field) -> EditOutcome {
        self.apply(collections::update::<C>(&self.data, id, field))
    }

    pub fn add_feature(&mut self) -> EditOutcome {
        self.add::<Features>()
    }

    pub fn remove_feature(&mut self, id: &str) -> EditOutcome {
        self.remove::<Features>(id)
    }

    pub fn update_feature(&mut self, id: &str, description: &str) -> EditOutcome {
        self.update::<Features>(id, FeatureField::Description(description.to_string()))
    }

    pub fn add_area(&mut self) -> EditOutcome {
        self.add::<Areas>()
    }

    pub fn remove_area(&mut self, id: &str) -> EditOutcome {
        self.remove::<Areas>(id)
    }

    pub fn update_area(&mut self, id: &str, field: AreaField) -> EditOutcome {
        self.update::<Areas>(id, field)
    }

    pub fn select_area_images(&mut self, area_id: &str, image_ids: &[String]) -> EditOutcome {
        self.apply(collections::select_area_images(&self.data, area_id, image_ids))
    }

    pub fn remove_area_image(&mut self, area_id: &str, image_id: &str) -> EditOutcome {
        self.apply(collections::remove_area_image(&self.data, area_id, image_id))
    }

    pub fn remove_image(&mut self, id: &str) -> EditOutcome {
        self.apply(collections::remove_image(&self.data, id))
    }

    pub fn update_image(&mut self, id: &str, field: ImageField) -> EditOutcome {
        self.update::<Images>(id, field)
    }

    pub fn reorder_images(&mut self, ids: &[String]) -> EditOutcome {
        self.apply(collections::reorder_images(&self.data, ids))
    }

    pub fn set_main_image(&mut self, id: &str) -> EditOutcome {
        self.apply(collections::set_main_image(&self.data, id))
    }

    pub fn toggle_featured_image(&mut self, id: &str) -> EditOutcome {
        self.apply(collections::toggle_featured_image(&self.data, id))
    }

    pub fn remove_floorplan(&mut self, id: &str) -> EditOutcome {
        self.remove::<Floorplans>(id)
    }

    pub fn update_floorplan(&mut self, id: &str, field: ImageField) -> EditOutcome {
        self.update::<Floorplans>(id, field)
    }

    pub fn remove_nearby_place(&mut self, id: &str) -> EditOutcome {
        self.apply(collections::remove_nearby_place(&self.data, id))
    }

    pub fn set_place_visibility(&mut self, id: &str, visible: bool) -> EditOutcome {
        self.apply(collections::set_place_visibility(&self.data, id, visible))
    }

    /// Add places not yet listed; returns how many were added
    pub fn merge_places(&mut self, incoming: &[Place]) -> usize {
        let merged = nearby::merge_places(&self.data.nearby_places, incoming);
        let added = merged.len() - self.data.nearby_places.len();
        if added > 0 {
            self.data.nearby_places = merged;
            self.mark_dirty();
        }
        info!("Merged {} new nearby place(s)", added);
        added
    }

    /// Point `map_image` at a static map of the property's coordinates
    pub fn generate_map(&mut self, api_key: &str) -> Result<(), EnrichmentError> {
        let url = nearby::property_map_url(&self.data, api_key)?;
        info!("Generated map image for property");
        self.change_field(FieldChange::MapImage(Some(url)));
        Ok(())
    }

    /// Upload files and append them as images or floorplans
    pub async fn upload_media<U: MediaUploader + ?Sized>(
        &mut self,
        uploader: &U,
        kind: ImageKind,
        files: Vec<UploadFile>,
    ) -> anyhow::Result<EditOutcome> {
        let urls = uploader.upload(self.data.id.as_deref(), kind, files).await?;
        Ok(self.apply(collections::attach_uploaded(&self.data, kind, &urls)))
    }

    // Persistence

    /// Save the current snapshot. On success the session becomes clean and
    /// adopts the id of a newly created property and the row ids of its media.
    pub async fn save<S: PropertyStore>(
        &mut self,
        sync: &PropertySync<S>,
    ) -> Result<SaveReceipt, SyncError> {
        let snapshot = self.data.clone();
        let receipt = sync.save(&snapshot).await?;
        if receipt.created {
            self.data.id = Some(receipt.property_id.clone());
        }
        self.data = collections::adopt_media_ids(&self.data, &receipt.media_ids);
        self.mark_saved();
        Ok(receipt)
    }

    pub async fn assign_object_id<S: PropertyStore>(
        &mut self,
        sync: &PropertySync<S>,
        object_id: &str,
    ) -> Result<(), SyncError> {
        sync.save_column(&self.data, "object_id", Value::from(object_id))
            .await?;
        self.data.object_id = Some(object_id.to_string());
        Ok(())
    }

    /// Assign an agent; a blank id unassigns
    pub async fn assign_agent<S: PropertyStore>(
        &mut self,
        sync: &PropertySync<S>,
        agent_id: &str,
    ) -> Result<(), SyncError> {
        let agent = Some(agent_id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let value = agent.clone().map_or(Value::Null, Value::String);
        sync.save_column(&self.data, "agent_id", value).await?;
        self.data.agent_id = agent;
        Ok(())
    }

    pub async fn assign_template<S: PropertyStore>(
        &mut self,
        sync: &PropertySync<S>,
        template_id: &str,
    ) -> Result<(), SyncError> {
        sync.save_column(&self.data, "template_id", Value::from(template_id))
            .await?;
        self.data.template_id = Some(template_id.to_string());
        Ok(())
    }

    // Step navigation

    pub async fn next<S: PropertyStore>(&mut self, sync: &PropertySync<S>) -> StepChange {
        let target = self.step.index() + 1;
        self.navigate(sync, target).await
    }

    pub async fn previous<S: PropertyStore>(&mut self, sync: &PropertySync<S>) -> StepChange {
        let target = self.step.index().saturating_sub(1);
        self.navigate(sync, target).await
    }

    pub async fn go_to<S: PropertyStore>(&mut self, sync: &PropertySync<S>, step: usize) -> StepChange {
        self.navigate(sync, step).await
    }

    /// Autosave pending edits of a saved property, then move to `target`.
    ///
    /// The step always changes, even when the save fails.
    async fn navigate<S: PropertyStore>(&mut self, sync: &PropertySync<S>, target: usize) -> StepChange {
        let from = self.step;
        let save = if self.has_pending_changes() && self.data.id.is_some() {
            match self.save(sync).await {
                Ok(_) => SaveAttempt::Saved,
                Err(e) => {
                    warn!("Changes couldn't be saved before changing step: {}", e);
                    SaveAttempt::Failed(e.to_string())
                }
            }
        } else {
            SaveAttempt::Skipped
        };

        self.step = FormStep::clamped(target);
        debug!("Step {:?} -> {:?} ({:?})", from, self.step, save);
        StepChange {
            from,
            to: self.step,
            save,
        }
    }
}
