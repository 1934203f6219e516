//! Letter input record.
//!
//! `LetterData` is the JSON document a caller supplies for one letter. Required fields are
//! modelled as `Option` so that an incomplete record still deserialises; callers check
//! [`LetterData::missing_fields`] before doing any rendering work.

use crate::{Language, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared format of a letter body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BodyFormat {
    /// Plain text: blank lines separate paragraphs, single newlines become line breaks.
    #[default]
    Plain,
    /// CommonMark with GitHub-style tables, strikethrough and task lists.
    Markdown,
    /// Markup that is already safe to embed, e.g. from a rich-text editor.
    Html,
}

impl BodyFormat {
    /// Maps a format tag to a variant. Unrecognised tags map to [`BodyFormat::Plain`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => BodyFormat::Markdown,
            "html" => BodyFormat::Html,
            _ => BodyFormat::Plain,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            BodyFormat::Plain => "plain",
            BodyFormat::Markdown => "markdown",
            BodyFormat::Html => "html",
        }
    }
}

impl std::fmt::Display for BodyFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for BodyFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

impl Serialize for BodyFormat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for BodyFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// Input record describing one letter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LetterData {
    pub patient_name: Option<String>,
    #[serde(rename = "patientDOB")]
    pub patient_dob: Option<String>,
    /// Letter date, slash-delimited (e.g. `MM/DD/YYYY`).
    pub date: Option<String>,
    /// Two-letter language code.
    pub language: Option<String>,
    pub body: Option<String>,
    pub body_format: Option<BodyFormat>,
    /// Filesystem path or `file://` URI of the letterhead logo.
    pub logo_path: Option<String>,
    /// Filesystem path or `file://` URI of the signature image.
    pub signature_image_path: Option<String>,
    pub sender_name: Option<String>,
    pub sender_title: Option<String>,
    /// Additional top-level keys, made available to custom templates.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LetterData {
    /// Names (as JSON keys) of required fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("patientName", self.patient_name.as_deref()),
            ("date", self.date.as_deref()),
            ("body", self.body.as_deref()),
        ]
        .into_iter()
        .filter(|(_, value)| NonEmptyText::from_optional(*value).is_err())
        .map(|(name, _)| name)
        .collect()
    }

    /// The letter's own language, if it declares one.
    pub fn declared_language(&self) -> Option<Language> {
        self.language
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .map(Language::from_code)
    }
}
