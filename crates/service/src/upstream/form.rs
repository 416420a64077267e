use models::forms::FormSchema;
use reqwest::multipart::{Form, Part};

use crate::errors::ProxyError;

/// A file part received from the browser, held in memory until forwarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), content_type, bytes }
    }

    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }
}

/// Validated scalar fields plus an optional file, ready to go upstream as
/// one multipart body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutboundForm {
    pub fields: Vec<(&'static str, String)>,
    pub file: Option<(&'static str, UploadedFile)>,
}

impl OutboundForm {
    /// A file is attached only when the schema declares a file part and the
    /// upload is non-empty.
    pub fn from_schema<S: FormSchema>(form: &S, file: Option<UploadedFile>) -> Self {
        let file = match (S::FILE_FIELD, file) {
            (Some(field), Some(f)) if !f.is_empty() => Some((field, f)),
            _ => None,
        };
        Self { fields: form.to_fields(), file }
    }

    pub fn has_file(&self) -> bool { self.file.is_some() }

    pub fn into_multipart(self) -> Result<Form, ProxyError> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        if let Some((name, file)) = self.file {
            let mut part = Part::bytes(file.bytes).file_name(file.file_name);
            if let Some(ct) = file.content_type.as_deref() {
                part = part
                    .mime_str(ct)
                    .map_err(|e| {
                        ProxyError::Validation(format!("invalid content type {ct}: {e}"))
                    })?;
            }
            form = form.part(name, part);
        }
        Ok(form)
    }
}
