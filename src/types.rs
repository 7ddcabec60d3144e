//! Wire types shared between the scan pipeline, the HTTP surface, and the
//! insights fan-out.
//!
//! Everything here serializes in camelCase. The audit engine's payload is
//! typed only where the service inspects it (`violations[].impact`); the
//! rest passes through untouched so the full engine output round-trips to
//! the caller and to the insights service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::aggregate::ImpactCounts;
use crate::insights::InsightsAnalysis;

/// Body accepted by `POST /scan`.
///
/// `url` stays optional at the deserialization boundary so a missing field
/// maps to the service's own 400 body rather than a framework rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub url: Option<String>,
    #[serde(default)]
    pub include_screenshot: bool,
    #[serde(default)]
    pub include_keyboard_flow: bool,
    #[serde(default)]
    pub include_ai_analysis: bool,
}

/// One heading element, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingInfo {
    /// Tag name as reported by the page (`H1`..`H6`).
    pub level: String,
    pub text: String,
}

/// One image element and whether it carries alt text.
///
/// Only presence of a non-empty `alt` is tracked; an empty attribute and a
/// missing attribute both report `hasAlt: false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub src: String,
    pub alt: String,
    pub has_alt: bool,
}

/// Structural snapshot of the rendered page at extraction time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomSummary {
    pub title: String,
    pub headings: Vec<HeadingInfo>,
    pub images: Vec<ImageInfo>,
    pub links: u64,
    pub buttons: u64,
    pub total_elements: u64,
}

/// One audit violation. `impact` is kept as the raw engine string so
/// unrecognized severities deserialize instead of failing the scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditViolation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full result of one audit-engine run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditOutcome {
    #[serde(default)]
    pub violations: Vec<AuditViolation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Keyboard-flow section of the results. Analysis is intentionally not run;
/// the section exists only when the caller asks for it, always in this
/// inert shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardFlow {
    pub total_tab_stops: u64,
    pub tab_sequence: Vec<Value>,
    pub analysis: KeyboardFlowAnalysis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardFlowAnalysis {
    pub issues: Vec<Value>,
    pub summary: String,
}

impl KeyboardFlow {
    pub fn not_run() -> Self {
        Self {
            total_tab_stops: 0,
            tab_sequence: Vec::new(),
            analysis: KeyboardFlowAnalysis {
                issues: Vec::new(),
                summary: "Not run".to_string(),
            },
        }
    }
}

/// The `results` object of a successful scan response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResults {
    pub axe_results: AuditOutcome,
    pub dom_data: DomSummary,
    /// Base64-encoded full-page capture, present only when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard_flow: Option<KeyboardFlow>,
    /// Opaque insights payload, present only when the fan-out succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<InsightsAnalysis>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_issues: u64,
    pub by_impact: ImpactCounts,
    pub ai_insights: u64,
    pub duration_ms: u64,
}

/// Top-level body returned by `POST /scan` on success.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub success: bool,
    pub url: String,
    pub scan_id: Uuid,
    pub results: ScanResults,
    pub summary: ScanSummary,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_request_defaults_optional_flags() {
        let request: ScanRequest =
            serde_json::from_str(r#"{"url": "https://example.com"}"#).unwrap();
        assert_eq!(request.url.as_deref(), Some("https://example.com"));
        assert!(!request.include_screenshot);
        assert!(!request.include_keyboard_flow);
        assert!(!request.include_ai_analysis);
    }

    #[test]
    fn scan_request_accepts_missing_url() {
        let request: ScanRequest = serde_json::from_str(r#"{"includeScreenshot": true}"#).unwrap();
        assert!(request.url.is_none());
        assert!(request.include_screenshot);
    }

    #[test]
    fn audit_outcome_round_trips_unknown_fields() {
        let raw = r#"{
            "violations": [
                {"id": "image-alt", "impact": "critical", "nodes": [{"target": ["img"]}]},
                {"id": "region", "nodes": []}
            ],
            "passes": [{"id": "document-title"}],
            "testEngine": {"name": "axe-core", "version": "4.8.0"}
        }"#;

        let outcome: AuditOutcome = serde_json::from_str(raw).unwrap();
        assert_eq!(outcome.violations.len(), 2);
        assert_eq!(outcome.violations[0].impact.as_deref(), Some("critical"));
        assert!(outcome.violations[1].impact.is_none());
        assert!(outcome.violations[0].extra.contains_key("nodes"));

        let back = serde_json::to_value(&outcome).unwrap();
        assert_eq!(back["testEngine"]["name"], "axe-core");
        assert_eq!(back["passes"][0]["id"], "document-title");
        assert_eq!(back["violations"][0]["nodes"][0]["target"][0], "img");
        // A violation without an impact must not grow one on the way out.
        assert!(back["violations"][1].get("impact").is_none());
    }

    #[test]
    fn dom_summary_serializes_camel_case() {
        let summary = DomSummary {
            title: "Example".into(),
            headings: vec![HeadingInfo {
                level: "H1".into(),
                text: "Welcome".into(),
            }],
            images: vec![ImageInfo {
                src: "https://example.com/logo.png".into(),
                alt: String::new(),
                has_alt: false,
            }],
            links: 3,
            buttons: 1,
            total_elements: 42,
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["totalElements"], 42);
        assert_eq!(value["images"][0]["hasAlt"], false);
        assert_eq!(value["headings"][0]["level"], "H1");
    }

    #[test]
    fn keyboard_flow_placeholder_shape() {
        let value = serde_json::to_value(KeyboardFlow::not_run()).unwrap();
        assert_eq!(value["totalTabStops"], 0);
        assert_eq!(value["tabSequence"], serde_json::json!([]));
        assert_eq!(value["analysis"]["issues"], serde_json::json!([]));
        assert_eq!(value["analysis"]["summary"], "Not run");
    }

    #[test]
    fn scan_results_omits_absent_sections() {
        let results = ScanResults {
            axe_results: AuditOutcome::default(),
            dom_data: DomSummary::default(),
            screenshot: None,
            keyboard_flow: None,
            ai_analysis: None,
        };

        let value = serde_json::to_value(&results).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("screenshot"));
        assert!(!object.contains_key("keyboardFlow"));
        assert!(!object.contains_key("aiAnalysis"));
        assert!(object.contains_key("axeResults"));
        assert!(object.contains_key("domData"));
    }
}
