//! # letterpdf types
//!
//! Shared input types for the letter rendering pipeline: the [`LetterData`] record, the
//! [`BodyFormat`] tag, supported [`Language`]s and the [`NonEmptyText`] validated string.

mod language;
mod letter;
mod text;

pub use language::Language;
pub use letter::{BodyFormat, LetterData};
pub use text::{NonEmptyText, TextError};
