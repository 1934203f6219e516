//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the generator.
//! Request handling never reads environment variables.

use crate::constants::{
    DEFAULT_LOGO_PATH, DEFAULT_SENDER_NAME, DEFAULT_SENDER_TITLE, DEFAULT_SIGNATURE_PATH,
    DEFAULT_TEMPLATE_PATH,
};
use crate::renderer::ChromiumConfig;
use crate::{LetterError, LetterResult};
use std::path::{Path, PathBuf};

/// Fixed letterhead identity applied to letters produced by a service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Letterhead {
    pub logo_path: PathBuf,
    pub signature_path: PathBuf,
    pub sender_name: String,
    pub sender_title: String,
}

impl Default for Letterhead {
    fn default() -> Self {
        Self {
            logo_path: PathBuf::from(DEFAULT_LOGO_PATH),
            signature_path: PathBuf::from(DEFAULT_SIGNATURE_PATH),
            sender_name: DEFAULT_SENDER_NAME.into(),
            sender_title: DEFAULT_SENDER_TITLE.into(),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    template_path: PathBuf,
    letterhead: Letterhead,
    chromium: ChromiumConfig,
}

impl CoreConfig {
    pub fn new(template_path: PathBuf, letterhead: Letterhead, chromium: ChromiumConfig) -> Self {
        Self {
            template_path,
            letterhead,
            chromium,
        }
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn letterhead(&self) -> &Letterhead {
        &self.letterhead
    }

    pub fn chromium(&self) -> &ChromiumConfig {
        &self.chromium
    }
}

/// Resolve the letter template path without reading environment variables.
///
/// If `override_path` is provided it must be an existing file. Otherwise this looks for
/// `templates/letter.html` relative to the current working directory and then walks up
/// from `CARGO_MANIFEST_DIR`.
///
/// # Errors
///
/// Returns `LetterError::TemplateRead` if no template file can be found.
pub fn resolve_template_path(override_path: Option<PathBuf>) -> LetterResult<PathBuf> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Ok(path);
        }
        return Err(template_not_found(path));
    }

    let cwd_relative = PathBuf::from(DEFAULT_TEMPLATE_PATH);
    if cwd_relative.is_file() {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(DEFAULT_TEMPLATE_PATH);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(template_not_found(cwd_relative))
}

fn template_not_found(path: PathBuf) -> LetterError {
    LetterError::TemplateRead {
        path,
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "template file not found"),
    }
}

/// Parse a boolean switch such as `LETTERPDF_CHROME_SANDBOX`.
///
/// `None`, empty and unrecognised values yield `default`.
pub fn flag_from_env_value(value: Option<String>, default: bool) -> bool {
    match value
        .as_deref()
        .map(|v| v.trim().to_ascii_lowercase())
        .as_deref()
    {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn override_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.html");
        let err = resolve_template_path(Some(missing)).unwrap_err();
        assert!(matches!(err, LetterError::TemplateRead { .. }));

        let present = dir.path().join("letter.html");
        fs::write(&present, "<p>{{ body }}</p>").unwrap();
        assert_eq!(resolve_template_path(Some(present.clone())).unwrap(), present);
    }

    #[test]
    fn bundled_template_is_found_from_manifest_ancestors() {
        let path = resolve_template_path(None).unwrap();
        assert!(path.ends_with(DEFAULT_TEMPLATE_PATH));
    }

    #[test]
    fn flag_parsing() {
        assert!(flag_from_env_value(Some("TRUE".into()), false));
        assert!(!flag_from_env_value(Some("off".into()), true));
        assert!(flag_from_env_value(Some("maybe".into()), true));
        assert!(!flag_from_env_value(None, false));
    }
}
