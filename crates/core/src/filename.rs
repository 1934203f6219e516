//! Output filename derivation.

use crate::constants::{DEFAULT_FILENAME_PREFIX, FALLBACK_FILENAME, SPANISH_FILENAME_PREFIX};
use letterpdf_types::{Language, LetterData, NonEmptyText};

/// Characters that cannot appear in a filename on common platforms.
const RESERVED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Derives the canonical PDF filename for a letter.
///
/// `{PREFIX}_{NAME}_{DATE}.pdf`, where the prefix is `INFORME` for Spanish letters and
/// `REPORT` otherwise, the name is upper-cased with whitespace runs collapsed to `_`, and
/// the date has `/` replaced by `.`. Letters without a patient name or date get
/// `output.pdf`, as do names with nothing left after removing reserved characters.
pub fn derive_filename(data: &LetterData) -> String {
    let (Ok(name), Ok(date)) = (
        NonEmptyText::from_optional(data.patient_name.as_deref()),
        NonEmptyText::from_optional(data.date.as_deref()),
    ) else {
        return FALLBACK_FILENAME.into();
    };

    let name = name_part(name.as_str());
    if name.is_empty() {
        return FALLBACK_FILENAME.into();
    }

    let prefix = match data.declared_language() {
        Some(Language::Es) => SPANISH_FILENAME_PREFIX,
        _ => DEFAULT_FILENAME_PREFIX,
    };

    format!("{prefix}_{name}_{}.pdf", date_part(date.as_str()))
}

fn name_part(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| !c.is_control() && !RESERVED_CHARS.contains(c))
                .collect::<String>()
                .to_uppercase()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn date_part(date: &str) -> String {
    date.chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '/' => '.',
            c if RESERVED_CHARS.contains(&c) => '-',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(name: Option<&str>, date: Option<&str>, language: Option<&str>) -> LetterData {
        LetterData {
            patient_name: name.map(Into::into),
            date: date.map(Into::into),
            language: language.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn spanish_letters_use_informe_prefix() {
        let data = letter(Some("Jane Doe"), Some("01/02/2024"), Some("es"));
        assert_eq!(derive_filename(&data), "INFORME_JANE_DOE_01.02.2024.pdf");
    }

    #[test]
    fn letters_without_language_use_report_prefix() {
        let data = letter(Some("Jane Doe"), Some("01/02/2024"), None);
        assert_eq!(derive_filename(&data), "REPORT_JANE_DOE_01.02.2024.pdf");

        let french = letter(Some("Jane Doe"), Some("01/02/2024"), Some("fr"));
        assert_eq!(derive_filename(&french), "REPORT_JANE_DOE_01.02.2024.pdf");
    }

    #[test]
    fn incomplete_letters_fall_back() {
        assert_eq!(derive_filename(&LetterData::default()), "output.pdf");
        assert_eq!(
            derive_filename(&letter(Some("Jane"), None, None)),
            "output.pdf"
        );
        assert_eq!(
            derive_filename(&letter(Some("  "), Some("01/02/2024"), None)),
            "output.pdf"
        );
    }

    #[test]
    fn whitespace_runs_collapse_to_one_underscore() {
        let data = letter(Some(" María \t José  Pérez "), Some("12/31/2023"), None);
        assert_eq!(derive_filename(&data), "REPORT_MARÍA_JOSÉ_PÉREZ_12.31.2023.pdf");
    }

    #[test]
    fn path_separators_never_reach_the_filename() {
        let data = letter(Some("../etc/passwd"), Some("01/02/2024"), None);
        let name = derive_filename(&data);
        assert_eq!(name, "REPORT_..ETCPASSWD_01.02.2024.pdf");
        assert!(!name.contains('/'));
    }

    #[test]
    fn names_of_only_reserved_characters_fall_back() {
        let data = letter(Some("??? / *"), Some("01/02/2024"), None);
        assert_eq!(derive_filename(&data), "output.pdf");
    }
}
