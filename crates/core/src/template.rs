//! Letter template loading and binding.
//!
//! A [`TemplateStore`] owns the path of one markup template. The template is read and
//! compiled the first time it is needed and then reused for the lifetime of the store;
//! concurrent first uses are serialised by a single-initialisation guard, so the file is
//! read once.

use crate::constants::LETTER_TEMPLATE_NAME;
use crate::{LetterError, LetterResult};
use minijinja::{Environment, Value};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Flat record bound into the template.
///
/// Values are either plain strings (escaped on output) or safe markup fragments created with
/// [`Value::from_safe_string`].
pub type TemplateRecord = BTreeMap<String, Value>;

pub struct TemplateStore {
    path: PathBuf,
    compiled: OnceCell<Environment<'static>>,
}

impl std::fmt::Debug for TemplateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateStore")
            .field("path", &self.path)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl TemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            compiled: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.compiled.get().is_some()
    }

    /// Loads and compiles the template if this has not happened yet.
    ///
    /// # Errors
    ///
    /// Returns `LetterError::TemplateRead` if the file is missing or unreadable and
    /// `LetterError::TemplateCompile` if it contains syntax errors. A failed load is not
    /// cached; the next call tries again.
    pub fn load(&self) -> LetterResult<()> {
        self.environment().map(|_| ())
    }

    /// Binds `record` into the template and returns the resulting markup.
    pub fn bind(&self, record: &TemplateRecord) -> LetterResult<String> {
        let env = self.environment()?;
        let template = env
            .get_template(LETTER_TEMPLATE_NAME)
            .map_err(LetterError::TemplateRender)?;
        template.render(record).map_err(LetterError::TemplateRender)
    }

    fn environment(&self) -> LetterResult<&Environment<'static>> {
        self.compiled.get_or_try_init(|| {
            let source =
                std::fs::read_to_string(&self.path).map_err(|source| LetterError::TemplateRead {
                    path: self.path.clone(),
                    source,
                })?;

            let mut env = Environment::new();
            env.add_template_owned(LETTER_TEMPLATE_NAME, source)
                .map_err(LetterError::TemplateCompile)?;
            tracing::debug!("compiled letter template {}", self.path.display());
            Ok(env)
        })
    }
}
