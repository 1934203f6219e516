//! HTML to PDF rendering seam.
//!
//! The pipeline talks to the browser engine only through [`PdfRenderer`] and
//! [`RenderSurface`]. A surface is an isolated page owned by the engine; it is opened for
//! one letter, loaded with markup, printed and then released. [`print_to_pdf`] drives that
//! sequence and releases the surface on every exit path.

mod chromium;

pub use chromium::{ChromiumConfig, ChromiumRenderer};

use crate::pdf::PdfOptions;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to launch renderer: {0}")]
    Launch(String),
    #[error("failed to open rendering surface: {0}")]
    Surface(String),
    #[error("failed to load letter markup: {0}")]
    Content(String),
    #[error("failed to print PDF: {0}")]
    Print(String),
    #[error("failed to release rendering surface: {0}")]
    Release(String),
}

/// An engine able to open rendering surfaces.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Opens a fresh surface. Each call owns its surface; nothing is pooled.
    async fn open_surface(&self) -> Result<Box<dyn RenderSurface>, RenderError>;
}

/// One isolated page inside the engine.
#[async_trait]
pub trait RenderSurface: Send {
    /// Injects `html` and waits until the page has settled (all resources loaded).
    async fn load_html(&mut self, html: &str) -> Result<(), RenderError>;

    /// Prints the loaded page.
    async fn print_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>, RenderError>;

    /// Releases the surface and any engine resources behind it.
    async fn release(self: Box<Self>) -> Result<(), RenderError>;
}

/// Renders `html` to PDF bytes on a fresh surface.
///
/// The surface is released whether loading or printing succeeds or fails. When both the
/// print and the release fail, the release failure is logged and the print error returned.
pub async fn print_to_pdf(
    renderer: &dyn PdfRenderer,
    html: &str,
    options: &PdfOptions,
) -> Result<Vec<u8>, RenderError> {
    let mut surface = renderer.open_surface().await?;

    let printed = match surface.load_html(html).await {
        Ok(()) => surface.print_pdf(options).await,
        Err(e) => Err(e),
    };
    let released = surface.release().await;

    match (printed, released) {
        (Ok(bytes), Ok(())) => Ok(bytes),
        (Ok(_), Err(release_err)) => Err(release_err),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release_err)) => {
            tracing::warn!("renderer release failed after error: {}", release_err);
            Err(e)
        }
    }
}
