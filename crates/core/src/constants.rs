//! Constants used throughout the letterpdf core crate.

/// Template location, relative to the working directory or a workspace ancestor.
pub const DEFAULT_TEMPLATE_PATH: &str = "templates/letter.html";

/// Name the compiled letter template is registered under. The `.html` suffix turns on
/// HTML auto-escaping for ordinary values.
pub const LETTER_TEMPLATE_NAME: &str = "letter.html";

/// Default letterhead logo, relative to the working directory.
pub const DEFAULT_LOGO_PATH: &str = "assets/logo.svg";

/// Default signature image, relative to the working directory.
pub const DEFAULT_SIGNATURE_PATH: &str = "assets/signature.svg";

pub const DEFAULT_SENDER_NAME: &str = "Attending Physician";

pub const DEFAULT_SENDER_TITLE: &str = "Orthopedic Surgery and Sports Medicine";

/// Filename used when a letter lacks the fields needed to derive one.
pub const FALLBACK_FILENAME: &str = "output.pdf";

/// Filename prefix for Spanish letters.
pub const SPANISH_FILENAME_PREFIX: &str = "INFORME";

/// Filename prefix for every other language.
pub const DEFAULT_FILENAME_PREFIX: &str = "REPORT";
