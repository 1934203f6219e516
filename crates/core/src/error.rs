use crate::renderer::RenderError;
use std::path::PathBuf;

/// Broad classes of failure, used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The template cannot be loaded or bound; no letter can be produced.
    ConfigurationFatal,
    /// The letter data is unreadable, unparsable or incomplete.
    InputMalformed,
    /// The renderer failed, or the produced PDF could not be written.
    RenderEngineFailure,
}

#[derive(Debug, thiserror::Error)]
pub enum LetterError {
    #[error("failed to read template {path}: {source}", path = path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to compile template: {0}")]
    TemplateCompile(#[source] minijinja::Error),
    #[error("failed to bind template: {0}")]
    TemplateRender(#[source] minijinja::Error),

    #[error("failed to read letter data {path}: {source}", path = path.display())]
    LetterDataRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse letter data: {0}")]
    LetterDataParse(#[from] serde_json::Error),
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("renderer failed: {0}")]
    Render(#[from] RenderError),
    #[error("failed to write PDF {path}: {source}", path = path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LetterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LetterError::TemplateRead { .. }
            | LetterError::TemplateCompile(_)
            | LetterError::TemplateRender(_) => ErrorKind::ConfigurationFatal,
            LetterError::LetterDataRead { .. }
            | LetterError::LetterDataParse(_)
            | LetterError::MissingFields(_) => ErrorKind::InputMalformed,
            LetterError::Render(_) | LetterError::OutputWrite { .. } => {
                ErrorKind::RenderEngineFailure
            }
        }
    }
}

pub type LetterResult<T> = std::result::Result<T, LetterError>;
