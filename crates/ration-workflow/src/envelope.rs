//! JSON result envelopes.
//!
//! Every stage entry point reports through this shape:
//! `{"success": true, "result": ...}` or
//! `{"success": false, "error": {"kind": ..., "message": ..., "stage": ...}}`.

use crate::error::{Result, WorkflowError};
use serde::Serialize;

/// Structured error body inside an envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Stable error kind tag.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    /// The stage that failed, where one applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

/// A stage result envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    /// Whether the stage succeeded.
    pub success: bool,
    /// The stage result payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    /// The structured error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T: Serialize> Envelope<T> {
    /// Wrap a successful result.
    #[must_use]
    pub fn ok(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// Wrap a workflow error.
    #[must_use]
    pub fn err(error: &WorkflowError) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(ErrorBody {
                kind: error.kind().to_string(),
                message: error.to_string(),
                stage: error.stage().map(|s| s.to_string()),
            }),
        }
    }

    /// Wrap a stage outcome either way.
    #[must_use]
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(error) => Self::err(&error),
        }
    }

    /// Serialize to a JSON value.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({
                "success": false,
                "error": { "kind": "internal", "message": "envelope serialization failed" }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use ration_ledger::LedgerError;

    #[test]
    fn success_shape() {
        let envelope = Envelope::ok(serde_json::json!({"minted": 6}));
        let value = envelope.to_value();
        assert_eq!(value["success"], true);
        assert_eq!(value["result"]["minted"], 6);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn error_shape_carries_stage_kind_message() {
        let err = WorkflowError::ledger(
            Stage::Supply,
            LedgerError::SupplyVerification {
                expected: 10,
                actual: 4,
            },
        );
        let envelope: Envelope<serde_json::Value> = Envelope::err(&err);
        let value = envelope.to_value();

        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["kind"], "supply_verification");
        assert_eq!(value["error"]["stage"], "supply");
        assert!(value["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("expected 10")));
    }

    #[test]
    fn from_result_both_ways() {
        let ok: Envelope<u32> = Envelope::from_result(Ok(7));
        assert!(ok.success);

        let err: Envelope<u32> = Envelope::from_result(Err(WorkflowError::NoActiveMint));
        assert!(!err.success);
        assert!(err.error.is_some());
    }
}
