//! Turning whatever the backend stores for an image into something a page
//! can render.
//!
//! The backend hands back absolute URLs, paths relative to its own origin,
//! or a bare base64 payload, depending on how the record was created.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::upstream::UploadedFile;

const PASSTHROUGH_SCHEMES: [&str; 4] = ["http://", "https://", "data:", "blob:"];

/// Resolve a stored image reference against `asset_origin`.
pub fn resolve_image_src(raw: Option<&str>, asset_origin: &str) -> Option<String> {
    let value = raw?.trim();
    if value.is_empty() {
        return None;
    }
    let origin = asset_origin.trim_end_matches('/');
    let lower = value.to_ascii_lowercase();
    if PASSTHROUGH_SCHEMES.iter().any(|s| lower.starts_with(s)) {
        return Some(value.to_string());
    }
    if value.starts_with('/') {
        return Some(format!("{origin}{value}"));
    }
    if value.contains('.') {
        return Some(format!("{origin}/{value}"));
    }
    Some(format!("data:{};base64,{value}", sniff_mime(value)))
}

/// Guess the mime type of a base64 payload from its leading characters.
pub fn sniff_mime(b64: &str) -> &'static str {
    let s = b64.trim_start();
    if s.starts_with("iVBORw0KGgo") {
        "image/png"
    } else if s.starts_with("/9j/") {
        "image/jpeg"
    } else if s.starts_with("R0lGOD") {
        "image/gif"
    } else if s.starts_with("UklGR") {
        "image/webp"
    } else if s.starts_with("PHN2Zy") || s.starts_with("PD94bWwg") {
        "image/svg+xml"
    } else {
        "image/jpeg"
    }
}

pub fn data_url(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoded = STANDARD.encode(bytes);
    let mime = match content_type {
        Some(ct) if ct.starts_with("image/") => ct,
        _ => sniff_mime(&encoded),
    };
    format!("data:{mime};base64,{encoded}")
}

/// What a form currently shows in its image slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ImagePreview {
    #[default]
    None,
    /// Derived from the stored entity.
    Remote(String),
    /// A file picked in this session, not yet uploaded.
    Local(UploadedFile),
}

impl ImagePreview {
    pub fn from_stored(raw: Option<&str>, asset_origin: &str) -> Self {
        match resolve_image_src(raw, asset_origin) {
            Some(src) => ImagePreview::Remote(src),
            None => ImagePreview::None,
        }
    }

    pub fn src(&self) -> Option<String> {
        match self {
            ImagePreview::None => None,
            ImagePreview::Remote(src) => Some(src.clone()),
            ImagePreview::Local(file) => Some(data_url(&file.bytes, file.content_type.as_deref())),
        }
    }

    pub fn is_local(&self) -> bool { matches!(self, ImagePreview::Local(_)) }
}
