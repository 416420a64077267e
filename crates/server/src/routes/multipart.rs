use axum::extract::Multipart;
use models::forms::FieldMap;
use service::upstream::UploadedFile;

use crate::errors::JsonApiError;

/// Scalar fields plus the first non-empty file part of a multipart body.
#[derive(Debug, Default)]
pub struct ParsedForm {
    pub fields: FieldMap,
    pub file: Option<UploadedFile>,
}

pub async fn read_form(mut multipart: Multipart) -> Result<ParsedForm, JsonApiError> {
    let mut parsed = ParsedForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| JsonApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else { continue };
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        JsonApiError::bad_request(format!("unreadable file part {name}: {e}"))
                    })?;
                if !bytes.is_empty() && parsed.file.is_none() {
                    parsed.file = Some(UploadedFile::new(file_name, content_type, bytes.to_vec()));
                }
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| {
                        JsonApiError::bad_request(format!("unreadable field {name}: {e}"))
                    })?;
                parsed.fields.insert(name, text);
            }
        }
    }
    Ok(parsed)
}
