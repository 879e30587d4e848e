use crate::config::AppConfig;
use crate::models::ImageKind;
use crate::sync::traits::{MediaUploader, PropertyStore};
use crate::sync::types::{ImageFlag, ImagePatch, ImageRow, PropertyRow, UploadFile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

const PROPERTIES: &str = "properties";
const PROPERTY_IMAGES: &str = "property_images";
const MEDIA_BUCKET: &str = "properties";

#[derive(Debug, Deserialize)]
struct Inserted {
    id: Value,
}

/// Property store backed by a PostgREST endpoint and its object storage
pub struct RestStore {
    client: Client,
    base_url: String,
}

impl RestStore {
    /// Create a client authenticated with the configured service key
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&config.store_key).context("Invalid store key")?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.store_key))
                .context("Invalid store key")?,
        );

        let client = Client::builder()
            .timeout(config.http_timeout)
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.store_url.clone(),
        })
    }

    fn table(&self, name: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, name)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to {}", what))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Store returned {} while trying to {}", status, what);
            anyhow::bail!("Failed to {}: {} {}", what, status, body);
        }
        Ok(response)
    }

    async fn insert_returning_id(&self, table: &str, body: Value, what: &str) -> Result<String> {
        let request = self
            .client
            .post(self.table(table))
            .header("Prefer", "return=representation")
            .json(&body);
        let rows: Vec<Inserted> = self
            .send(request, what)
            .await?
            .json()
            .await
            .with_context(|| format!("Unreadable response to {}", what))?;
        first_inserted_id(rows).with_context(|| format!("No usable id returned to {}", what))
    }
}

/// Id of the first returned row; numeric keys are rendered as text
fn first_inserted_id(rows: Vec<Inserted>) -> Result<String> {
    let inserted = rows.into_iter().next().context("empty representation")?;
    match inserted.id {
        Value::String(id) if !id.is_empty() => Ok(id),
        Value::Number(n) => Ok(n.to_string()),
        other => anyhow::bail!("unexpected id {}", other),
    }
}

/// Strip non-ASCII characters the storage API rejects in object keys
pub fn sanitize_file_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii()).collect()
}

/// Object key for an uploaded file: `properties/{id|new}/{images|floorplans}/{uuid}-{name}`
pub fn media_object_path(property_id: Option<&str>, kind: ImageKind, file_name: &str) -> String {
    let folder = match kind {
        ImageKind::Image => "images",
        ImageKind::Floorplan => "floorplans",
    };
    format!(
        "properties/{}/{}/{}-{}",
        property_id.unwrap_or("new"),
        folder,
        Uuid::new_v4(),
        sanitize_file_name(file_name)
    )
}

#[async_trait]
impl PropertyStore for RestStore {
    async fn fetch_property(&self, id: &str) -> Result<Option<PropertyRow>> {
        let request = self
            .client
            .get(self.table(PROPERTIES))
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())]);
        let rows: Vec<PropertyRow> = self
            .send(request, "fetch property")
            .await?
            .json()
            .await
            .context("Unreadable property row")?;
        Ok(rows.into_iter().next())
    }

    async fn insert_property(&self, row: &PropertyRow) -> Result<String> {
        let body = serde_json::to_value(row)?;
        let id = self.insert_returning_id(PROPERTIES, body, "insert property").await?;
        info!("Inserted property row {}", id);
        Ok(id)
    }

    async fn update_property(&self, id: &str, row: &PropertyRow) -> Result<()> {
        let request = self
            .client
            .patch(self.table(PROPERTIES))
            .query(&[("id", format!("eq.{}", id))])
            .json(row);
        self.send(request, "update property").await?;
        Ok(())
    }

    async fn update_property_column(&self, id: &str, column: &str, value: Value) -> Result<()> {
        let mut body = serde_json::Map::new();
        body.insert(column.to_string(), value);
        let request = self
            .client
            .patch(self.table(PROPERTIES))
            .query(&[("id", format!("eq.{}", id))])
            .json(&body);
        self.send(request, "update property column").await?;
        Ok(())
    }

    async fn list_images(&self, property_id: &str, kind: Option<ImageKind>) -> Result<Vec<ImageRow>> {
        let mut query = vec![
            ("property_id", format!("eq.{}", property_id)),
            ("order", "sort_order.asc".to_string()),
        ];
        if let Some(kind) = kind {
            query.push(("type", format!("eq.{}", kind.as_str())));
        }
        let request = self.client.get(self.table(PROPERTY_IMAGES)).query(&query);
        let rows: Vec<ImageRow> = self
            .send(request, "list images")
            .await?
            .json()
            .await
            .context("Unreadable image rows")?;
        debug!("Property {} has {} image row(s)", property_id, rows.len());
        Ok(rows)
    }

    async fn insert_image(&self, row: &ImageRow) -> Result<String> {
        let body = serde_json::to_value(row)?;
        self.insert_returning_id(PROPERTY_IMAGES, body, "insert image").await
    }

    async fn delete_image(&self, property_id: &str, image_id: &str) -> Result<()> {
        let request = self.client.delete(self.table(PROPERTY_IMAGES)).query(&[
            ("id", format!("eq.{}", image_id)),
            ("property_id", format!("eq.{}", property_id)),
        ]);
        self.send(request, "delete image").await?;
        debug!("Deleted image row {} of property {}", image_id, property_id);
        Ok(())
    }

    async fn reset_image_flags(&self, property_id: &str) -> Result<()> {
        let request = self
            .client
            .patch(self.table(PROPERTY_IMAGES))
            .query(&[("property_id", format!("eq.{}", property_id))])
            .json(&json!({ "is_main": false, "is_featured_image": false }));
        self.send(request, "reset image flags").await?;
        Ok(())
    }

    async fn set_image_flag(&self, property_id: &str, url: &str, flag: ImageFlag) -> Result<()> {
        let mut body = serde_json::Map::new();
        body.insert(flag.column().to_string(), Value::Bool(true));
        let request = self
            .client
            .patch(self.table(PROPERTY_IMAGES))
            .query(&[
                ("property_id", format!("eq.{}", property_id)),
                ("url", format!("eq.{}", url)),
            ])
            .json(&body);
        self.send(request, "set image flag").await?;
        Ok(())
    }

    async fn update_image(&self, property_id: &str, image_id: &str, patch: &ImagePatch) -> Result<()> {
        let request = self
            .client
            .patch(self.table(PROPERTY_IMAGES))
            .query(&[
                ("id", format!("eq.{}", image_id)),
                ("property_id", format!("eq.{}", property_id)),
            ])
            .json(patch);
        self.send(request, "update image").await?;
        Ok(())
    }
}

#[async_trait]
impl MediaUploader for RestStore {
    async fn upload(
        &self,
        property_id: Option<&str>,
        kind: ImageKind,
        files: Vec<UploadFile>,
    ) -> Result<Vec<String>> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            let path = media_object_path(property_id, kind, &file.name);
            let request = self
                .client
                .post(format!(
                    "{}/storage/v1/object/{}/{}",
                    self.base_url, MEDIA_BUCKET, path
                ))
                .header(CONTENT_TYPE, file.content_type.as_str())
                .body(file.bytes);
            self.send(request, "upload file").await?;

            let url = format!(
                "{}/storage/v1/object/public/{}/{}",
                self.base_url, MEDIA_BUCKET, path
            );
            debug!("Uploaded {} to {}", file.name, url);
            urls.push(url);
        }
        info!("Uploaded {} {} file(s)", urls.len(), kind.as_str());
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyFormData;

    fn inserted(body: Value) -> Result<String> {
        first_inserted_id(serde_json::from_value(body).unwrap())
    }

    #[test]
    fn inserted_ids_accept_text_and_numbers() {
        assert_eq!(inserted(json!([{"id": 5, "title": "x"}])).unwrap(), "5");
        assert_eq!(
            inserted(json!([{"id": "8f0c"}, {"id": "ignored"}])).unwrap(),
            "8f0c"
        );
        assert!(inserted(json!([])).is_err());
        assert!(inserted(json!([{"id": null}])).is_err());
        assert!(inserted(json!([{"id": ""}])).is_err());
    }

    #[test]
    fn update_body_omits_id_and_stringifies_collections() {
        let form = PropertyFormData {
            id: Some("p1".into()),
            title: "Dune house".into(),
            agent_id: Some("a1".into()),
            ..Default::default()
        };
        let body = serde_json::to_value(PropertyRow::from_form(&form).unwrap()).unwrap();
        let object = body.as_object().unwrap();

        assert!(!object.contains_key("id"));
        assert_eq!(body["title"], "Dune house");
        assert_eq!(body["agent_id"], "a1");
        assert_eq!(body["template_id"], Value::Null);
        assert_eq!(body["generalInfo"], Value::Null);
        for column in ["features", "areas", "nearby_places", "nearby_cities"] {
            assert_eq!(body[column], json!("[]"), "{column}");
        }
    }

    #[test]
    fn image_rows_serialize_kind_as_type() {
        let row = ImageRow {
            id: None,
            property_id: "p1".into(),
            url: "u".into(),
            kind: ImageKind::Floorplan,
            ..Default::default()
        };
        let body = serde_json::to_value(&row).unwrap();
        assert_eq!(body["type"], "floorplan");
        assert!(body.get("id").is_none());
        assert_eq!(body["area"], Value::Null);
    }

    #[test]
    fn object_paths_are_scoped_and_ascii() {
        let path = media_object_path(Some("p9"), ImageKind::Floorplan, "plattegrond-één.pdf");
        assert!(path.starts_with("properties/p9/floorplans/"));
        assert!(path.ends_with("-plattegrond-n.pdf"));
        assert!(path.is_ascii());

        let path = media_object_path(None, ImageKind::Image, "front.jpg");
        assert!(path.starts_with("properties/new/images/"));
    }
}
