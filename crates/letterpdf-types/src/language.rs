//! Supported letter languages.

/// Language a letter is rendered in.
///
/// Only English and Spanish label sets exist. Any other code resolves to English, so this
/// conversion never fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    /// Resolves a two-letter language code, falling back to [`Language::En`].
    ///
    /// Matching ignores ASCII case and surrounding whitespace.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "es" => Language::Es,
            _ => Language::En,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
