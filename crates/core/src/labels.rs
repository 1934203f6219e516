//! Localised template labels.

use letterpdf_types::Language;

/// Fixed label set for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub patient_name_label: &'static str,
    pub patient_dob_label: &'static str,
}

const ENGLISH: Labels = Labels {
    patient_name_label: "Patient Name",
    patient_dob_label: "Date of Birth",
};

const SPANISH: Labels = Labels {
    patient_name_label: "Nombre del Paciente",
    patient_dob_label: "Fecha de Nacimiento",
};

pub fn labels(language: Language) -> Labels {
    match language {
        Language::En => ENGLISH,
        Language::Es => SPANISH,
    }
}
