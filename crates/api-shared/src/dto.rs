//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VerifyPasswordReq {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VerifyPasswordRes {
    pub success: bool,
}

/// Letter fields accepted by the generate endpoint.
///
/// The password may be sent here or in the `x-access-password` header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratePdfReq {
    pub password: Option<String>,
    pub patient_name: Option<String>,
    #[serde(rename = "patientDOB")]
    pub patient_dob: Option<String>,
    /// Letter date, e.g. `01/02/2024`.
    pub date: Option<String>,
    /// `en` or `es`; defaults to `en`.
    pub language: Option<String>,
    /// Letter body as HTML, as produced by a rich-text editor.
    pub body: Option<String>,
    pub sender_name: Option<String>,
    pub sender_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRes {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub missing_fields: Vec<String>,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            missing_fields: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_missing_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.missing_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_uses_form_field_names() {
        let req: GeneratePdfReq = serde_json::from_str(
            r#"{"patientName":"Jane Doe","patientDOB":"03/04/1980","date":"01/02/2024","body":"<p>x</p>","password":"pw"}"#,
        )
        .unwrap();
        assert_eq!(req.patient_name.as_deref(), Some("Jane Doe"));
        assert_eq!(req.patient_dob.as_deref(), Some("03/04/1980"));
        assert_eq!(req.password.as_deref(), Some("pw"));
        assert_eq!(req.language, None);
    }

    #[test]
    fn error_body_omits_empty_parts() {
        let json = serde_json::to_value(ErrorRes::new("Invalid password")).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Invalid password" }));

        let json = serde_json::to_value(
            ErrorRes::new("Missing required fields").with_missing_fields(["date"]),
        )
        .unwrap();
        assert_eq!(json["missingFields"], serde_json::json!(["date"]));
    }
}
