//! # letterpdf Core
//!
//! Core business logic for rendering patient letters to PDF.
//!
//! This crate contains the data-to-document pipeline:
//! - Template loading and binding (`template`)
//! - Body normalisation for plain text, Markdown and HTML (`body`)
//! - Image inlining as data URIs (`assets`)
//! - Localised labels and output filename derivation (`labels`, `filename`)
//! - Page setup and the HTML to PDF renderer seam (`pdf`, `renderer`)
//! - The orchestrating [`LetterGenerator`] (`generator`)
//!
//! **No API concerns**: HTTP servers, authentication and static file serving belong in
//! `api-rest` and `api-shared`.

pub mod assets;
pub mod body;
pub mod config;
pub mod constants;
pub mod error;
pub mod filename;
pub mod generator;
pub mod labels;
pub mod pdf;
pub mod renderer;
pub mod template;

pub use config::{CoreConfig, Letterhead};
pub use constants::*;
pub use error::{ErrorKind, LetterError, LetterResult};
pub use filename::derive_filename;
pub use generator::{read_letter, LetterGenerator, RenderOptions};
pub use letterpdf_types::{BodyFormat, Language, LetterData, NonEmptyText};
pub use pdf::{PdfOptions, PdfOverrides};
pub use renderer::{ChromiumConfig, ChromiumRenderer, PdfRenderer, RenderError};
pub use template::TemplateStore;

use std::sync::Arc;

/// Builds a generator backed by headless Chrome from startup configuration.
pub fn chromium_generator(cfg: &CoreConfig) -> LetterGenerator {
    LetterGenerator::new(
        TemplateStore::new(cfg.template_path()),
        Arc::new(ChromiumRenderer::new(cfg.chromium().clone())),
    )
}
