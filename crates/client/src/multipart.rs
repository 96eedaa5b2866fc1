//! Multipart payload preparation for image-bearing resources.
//!
//! A room update can add new photos and remove existing ones in a single
//! request, so the payload carries three part groups: scalar fields
//! serialized as strings, file attachments under the stable `images` field,
//! and the URLs to delete as one JSON-text array under `deleted_images`.
//!
//! [`UploadPayload`] itself is pure data; the only reqwest-coupled step is
//! [`UploadPayload::into_form`] at the transport edge.

use serde_json::{Map, Value};

use crate::error::ApiError;

/// Form field name every file attachment is sent under.
pub const IMAGE_FIELD: &str = "images";

/// Form field name for the JSON-encoded list of image URLs to delete.
pub const DELETED_IMAGES_FIELD: &str = "deleted_images";

/// One file staged for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Description of one multipart request, built up before any I/O happens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadPayload {
    fields: Vec<(String, String)>,
    files: Vec<FileAttachment>,
    deleted_urls: Vec<String>,
}

impl UploadPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize a domain field map into scalar form entries.
    ///
    /// Strings are taken as-is, numbers and booleans via their display
    /// form, nested objects and arrays as JSON text. `null` fields are
    /// skipped entirely.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let mut payload = Self::new();
        for (name, value) in fields {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                nested => nested.to_string(),
            };
            payload.fields.push((name.clone(), text));
        }
        payload
    }

    /// Stage a file for upload under [`IMAGE_FIELD`].
    pub fn attach(
        &mut self,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> &mut Self {
        self.files.push(FileAttachment {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        });
        self
    }

    /// Mark an existing image URL for deletion.
    pub fn mark_deleted(&mut self, url: impl Into<String>) -> &mut Self {
        self.deleted_urls.push(url.into());
        self
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn files(&self) -> &[FileAttachment] {
        &self.files
    }

    pub fn deleted_urls(&self) -> &[String] {
        &self.deleted_urls
    }

    /// The deletion list exactly as it is sent: one JSON-text form field.
    pub fn deleted_urls_json(&self) -> String {
        serde_json::to_string(&self.deleted_urls).unwrap_or_else(|_| "[]".to_string())
    }

    /// Convert into a `reqwest` multipart form.
    ///
    /// Fails with [`ApiError::Validation`] when an attachment carries a
    /// malformed MIME type, before anything is sent.
    pub fn into_form(self) -> Result<reqwest::multipart::Form, ApiError> {
        let deleted_json = (!self.deleted_urls.is_empty()).then(|| self.deleted_urls_json());

        let mut form = reqwest::multipart::Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        for file in self.files {
            let part = reqwest::multipart::Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.mime_type)
                .map_err(|e| {
                    ApiError::Validation(format!("Invalid MIME type '{}': {e}", file.mime_type))
                })?;
            form = form.part(IMAGE_FIELD, part);
        }
        if let Some(json) = deleted_json {
            form = form.text(DELETED_IMAGES_FIELD, json);
        }
        Ok(form)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
