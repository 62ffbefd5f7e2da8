//! services/api/src/web/form.rs
//!
//! An extractor for form endpoints that accept either `multipart/form-data`
//! (with optional file parts) or a flat JSON object.

use crate::error::ApiError;
use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use bytes::Bytes;
use consultancy_core::domain::Upload;
use consultancy_core::ports::FileStore;
use consultancy_core::ServiceError;
use std::collections::HashMap;

/// A file part of a multipart form.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Text fields and files of a submitted form.
#[derive(Debug, Default)]
pub struct FormInput {
    fields: HashMap<String, String>,
    files: HashMap<String, FilePart>,
}

impl FormInput {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.files.get(name)
    }

    /// Saves the file part `name`, if present, and returns its public path.
    pub async fn save_file(&self, files: &dyn FileStore, name: &str) -> Result<Option<String>, ApiError> {
        let Some(part) = self.file(name) else {
            return Ok(None);
        };
        let upload = Upload {
            file_name: part.file_name.clone(),
            content_type: part.content_type.clone(),
            bytes: part.bytes.to_vec(),
        };
        let path = files.save(&upload).await.map_err(ServiceError::from)?;
        Ok(Some(path))
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = FormInput::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart data: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(|e| {
                        ApiError::BadRequest(format!("Failed to read file bytes: {}", e))
                    })?;
                    // Browsers send an empty part when no file was chosen.
                    if !file_name.is_empty() && !bytes.is_empty() {
                        form.files.insert(
                            name,
                            FilePart {
                                file_name,
                                content_type,
                                bytes,
                            },
                        );
                    }
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        ApiError::BadRequest(format!("Failed to read field {}: {}", name, e))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    fn from_json(value: serde_json::Value) -> Result<Self, ApiError> {
        let serde_json::Value::Object(object) = value else {
            return Err(ApiError::BadRequest("Expected a JSON object".to_string()));
        };
        let fields = object
            .into_iter()
            .filter_map(|(key, value)| json_text(value).map(|text| (key, text)))
            .collect();
        Ok(FormInput {
            fields,
            files: HashMap::new(),
        })
    }
}

/// Flattens a JSON value into the string a form field would carry.
fn json_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(json_text)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

impl<S> FromRequest<S> for FormInput
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else {
            let Json(value) = Json::<serde_json::Value>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Self::from_json(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_objects_flatten_to_text_fields() {
        let form = FormInput::from_json(json!({
            "name": "Ada",
            "rating": 5,
            "tags": ["PR", "Media"],
            "notes": null
        }))
        .unwrap();
        assert_eq!(form.text("name").as_deref(), Some("Ada"));
        assert_eq!(form.text("rating").as_deref(), Some("5"));
        assert_eq!(form.text("tags").as_deref(), Some("PR,Media"));
        assert_eq!(form.text("notes"), None);
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(matches!(
            FormInput::from_json(json!(["a"])),
            Err(ApiError::BadRequest(_))
        ));
    }
}
