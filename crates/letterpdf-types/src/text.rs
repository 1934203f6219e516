/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-blank content.
///
/// Leading and trailing whitespace is trimmed during construction, so a patient name of
/// `"  Jane Doe "` is stored as `"Jane Doe"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Builds a `NonEmptyText` from an optional field, treating `None` like blank text.
    pub fn from_optional(input: Option<&str>) -> Result<Self, TextError> {
        input.map_or(Err(TextError::Empty), Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let text = NonEmptyText::new("  Jane Doe \n").unwrap();
        assert_eq!(text.as_str(), "Jane Doe");
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(NonEmptyText::new("   \t\n"), Err(TextError::Empty));
        assert_eq!(NonEmptyText::from_optional(None), Err(TextError::Empty));
    }
}
