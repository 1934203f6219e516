//! Image inlining.
//!
//! Letter images are embedded into the markup as `data:` URIs so that the rendering surface
//! never has to resolve filesystem paths. A missing image is not an error: the letter is
//! still produced, just without the picture.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use url::Url;

const FILE_SCHEME: &str = "file://";

/// Media types by lower-case file extension.
const MEDIA_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
];

const DEFAULT_MEDIA_TYPE: &str = "image/png";

/// Outcome of inlining one image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlinedAsset {
    /// The image was read and encoded.
    DataUri(String),
    /// No image was referenced.
    Absent,
    /// The referenced file does not exist.
    Missing(PathBuf),
    /// The referenced file exists but could not be read.
    Unreadable { path: PathBuf, reason: String },
}

impl InlinedAsset {
    /// The value placed in the template: the data URI, or an empty string for every
    /// outcome without an image.
    pub fn as_template_value(&self) -> &str {
        match self {
            InlinedAsset::DataUri(uri) => uri,
            _ => "",
        }
    }
}

/// Inlines the image referenced by `reference`, a filesystem path or `file://` URI.
///
/// Never fails. Missing and unreadable files are logged as warnings.
pub fn inline_asset(reference: Option<&str>) -> InlinedAsset {
    let Some(reference) = reference.map(str::trim).filter(|r| !r.is_empty()) else {
        return InlinedAsset::Absent;
    };

    let path = resolve_reference(reference);
    if !path.exists() {
        tracing::warn!("image not found, rendering without it: {}", path.display());
        return InlinedAsset::Missing(path);
    }

    match std::fs::read(&path) {
        Ok(bytes) => InlinedAsset::DataUri(format!(
            "data:{};base64,{}",
            media_type_for(&path),
            STANDARD.encode(bytes)
        )),
        Err(e) => {
            tracing::warn!("image unreadable, rendering without it: {}: {}", path.display(), e);
            InlinedAsset::Unreadable {
                path,
                reason: e.to_string(),
            }
        }
    }
}

/// Infers an image media type from the file extension, defaulting to PNG.
pub fn media_type_for(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return DEFAULT_MEDIA_TYPE;
    };
    let ext = ext.to_ascii_lowercase();

    MEDIA_TYPES
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map_or(DEFAULT_MEDIA_TYPE, |(_, media_type)| *media_type)
}

/// Turns a `file://` URI into a path. Well-formed URIs are percent-decoded; anything else
/// simply has the scheme prefix removed.
fn resolve_reference(reference: &str) -> PathBuf {
    let Some(stripped) = reference.strip_prefix(FILE_SCHEME) else {
        return PathBuf::from(reference);
    };

    Url::parse(reference)
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .unwrap_or_else(|| PathBuf::from(stripped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn absent_reference_yields_empty_value() {
        assert_eq!(inline_asset(None), InlinedAsset::Absent);
        assert_eq!(inline_asset(Some("  ")), InlinedAsset::Absent);
        assert_eq!(InlinedAsset::Absent.as_template_value(), "");
    }

    #[test]
    fn missing_file_degrades_to_empty_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logo.png");

        let asset = inline_asset(path.to_str());
        assert_eq!(asset, InlinedAsset::Missing(path));
        assert_eq!(asset.as_template_value(), "");
    }

    #[test]
    fn png_is_encoded_as_data_uri() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logo.png");
        fs::write(&path, PNG_MAGIC).unwrap();

        let asset = inline_asset(path.to_str());
        assert_eq!(
            asset.as_template_value(),
            format!("data:image/png;base64,{}", STANDARD.encode(PNG_MAGIC))
        );
        assert!(matches!(asset, InlinedAsset::DataUri(_)));
    }

    #[test]
    fn file_scheme_prefix_is_stripped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sign.svg");
        fs::write(&path, "<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();

        let reference = format!("file://{}", path.display());
        let asset = inline_asset(Some(&reference));
        assert!(asset
            .as_template_value()
            .starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn media_type_follows_extension() {
        assert_eq!(media_type_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("a.gif")), "image/gif");
        assert_eq!(media_type_for(Path::new("a.webp")), "image/webp");
        assert_eq!(media_type_for(Path::new("a.bmp")), "image/png");
        assert_eq!(media_type_for(Path::new("logo")), "image/png");
    }

    #[test]
    fn unreadable_path_degrades_to_empty_value() {
        let dir = TempDir::new().unwrap();
        // A directory exists but cannot be read as a file.
        let asset = inline_asset(dir.path().to_str());
        assert!(matches!(asset, InlinedAsset::Unreadable { .. }));
        assert_eq!(asset.as_template_value(), "");
    }
}
