use std::{fs, io, path::Path};

use base64::{Engine, engine::general_purpose::STANDARD};
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("'{0}' is not an image; upload a PNG, JPEG, GIF, WebP or SVG file")]
    NotAnImage(String),
    #[error("the uploaded image is empty")]
    Empty,
    #[error("could not read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Binary payload with its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(media_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Reads a file and declares its media type from the extension.
pub fn read_upload(path: &Path) -> Result<ImageUpload, ImageError> {
    let bytes = fs::read(path).map_err(|source| ImageError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(ImageUpload::new(media_type_for(path), bytes))
}

/// Media type implied by a file extension.
pub fn media_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Encodes an upload as a self-contained `data:` URI.
pub fn encode_data_uri(upload: &ImageUpload) -> Result<String, ImageError> {
    if !upload.media_type.starts_with("image") {
        return Err(ImageError::NotAnImage(upload.media_type.clone()));
    }
    if upload.bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    Ok(format!(
        "data:{};base64,{}",
        upload.media_type,
        STANDARD.encode(&upload.bytes)
    ))
}

/// Returns true for `data:image/...;base64,...` URIs.
pub fn is_image_data_uri(value: &str) -> bool {
    Regex::new(r"^data:image/[A-Za-z0-9.+-]+;base64,[A-Za-z0-9+/]+=*$")
        .map(|pattern| pattern.is_match(value))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn encodes_png_payload() {
        let upload = ImageUpload::new("image/png", vec![0x89, b'P', b'N', b'G']);
        let uri = encode_data_uri(&upload).expect("encode");
        assert_eq!(uri, "data:image/png;base64,iVBORw==");
        assert!(is_image_data_uri(&uri));
    }

    #[test]
    fn rejects_non_image_media_types() {
        let upload = ImageUpload::new("text/plain", b"hello".to_vec());
        assert!(matches!(
            encode_data_uri(&upload),
            Err(ImageError::NotAnImage(kind)) if kind == "text/plain"
        ));
    }

    #[test]
    fn rejects_empty_payloads() {
        let upload = ImageUpload::new("image/jpeg", Vec::new());
        assert!(matches!(encode_data_uri(&upload), Err(ImageError::Empty)));
    }

    #[test]
    fn media_type_follows_extension() {
        assert_eq!(media_type_for(&PathBuf::from("me.JPG")), "image/jpeg");
        assert_eq!(media_type_for(&PathBuf::from("notes.txt")), "text/plain");
        assert_eq!(
            media_type_for(&PathBuf::from("archive")),
            "application/octet-stream"
        );
    }

    #[test]
    fn data_uri_check_rejects_remote_urls() {
        assert!(!is_image_data_uri("https://example.com/me.png"));
        assert!(!is_image_data_uri("data:text/html;base64,PHNjcmlwdD4="));
    }
}
