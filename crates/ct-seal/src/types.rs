//! Verdict data structures.

use serde::{Deserialize, Serialize};

/// Tri-state outcome shared by signing and verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// The operation succeeded.
    Ok,
    /// Negative decision: wrong document, rejected chain, missing input.
    Failed,
    /// Infrastructural fault, distinct from a negative trust decision.
    Error,
}

/// Verdict for a single document or hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VerificationResponse {
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

/// Combined verdicts for a document and, when requested, its provenance.
///
/// The two verdicts are reported side by side and never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub resource_validation_response: VerificationResponse,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance_validation_response: Option<VerificationResponse>,
}

impl ValidationReport {
    pub fn resource_only(response: VerificationResponse) -> Self {
        Self {
            resource_validation_response: response,
            provenance_validation_response: None,
        }
    }

    /// True when every verdict present in the report is OK.
    pub fn all_ok(&self) -> bool {
        self.resource_validation_response.is_ok()
            && self
                .provenance_validation_response
                .as_ref()
                .map_or(true, VerificationResponse::is_ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response_omits_message() {
        let json = serde_json::to_string(&VerificationResponse::ok()).unwrap();
        assert_eq!(json, r#"{"status":"OK"}"#);
    }

    #[test]
    fn test_failed_response_carries_message() {
        let json = serde_json::to_string(&VerificationResponse::failed("Wrong document")).unwrap();
        assert_eq!(json, r#"{"status":"FAILED","message":"Wrong document"}"#);
    }

    #[test]
    fn test_report_field_names() {
        let report = ValidationReport {
            resource_validation_response: VerificationResponse::ok(),
            provenance_validation_response: Some(VerificationResponse::error("unreachable")),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["resourceValidationResponse"]["status"], "OK");
        assert_eq!(value["provenanceValidationResponse"]["status"], "ERROR");
        assert!(!report.all_ok());
    }

    #[test]
    fn test_resource_only_report_omits_provenance() {
        let report = ValidationReport::resource_only(VerificationResponse::ok());
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("provenanceValidationResponse").is_none());
        assert!(report.all_ok());
    }
}
