//! Optional fan-out to the external insights service.
//!
//! The fan-out is best-effort by contract: timeout, connection error,
//! non-success status, and undecodable body all collapse to "no insights
//! available". The primary scan must never observe a failure here.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, ScanError};
use crate::types::{AuditOutcome, DomSummary};

/// Evidence shipped to `POST <base>/analyze`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsRequest<'a> {
    pub url: &'a str,
    pub scan_id: Uuid,
    pub axe_results: &'a AuditOutcome,
    pub dom_data: &'a DomSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_b64: Option<&'a str>,
}

/// Payload returned by the insights service. Typed only where the scan
/// summary needs a number; everything else passes through to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightsAnalysis {
    #[serde(default)]
    pub insights: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<InsightsSummary>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_insights: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InsightsAnalysis {
    /// Insight count reported in the scan summary: the service's own total
    /// when present, otherwise the length of the insights array.
    pub fn total(&self) -> u64 {
        self.summary
            .as_ref()
            .and_then(|summary| summary.total_insights)
            .unwrap_or(self.insights.len() as u64)
    }
}

/// Client for the insights service, with its own request budget
/// independent of the scan's global timeout.
#[derive(Debug, Clone)]
pub struct InsightsClient {
    http: Client,
    base_url: String,
}

impl InsightsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build().map_err(|err| {
            ScanError::Config(format!("Failed to build insights HTTP client: {err}"))
        })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Best-effort analysis call; any failure collapses to `None`.
    pub async fn analyze(&self, request: &InsightsRequest<'_>) -> Option<InsightsAnalysis> {
        let endpoint = format!("{}/analyze", self.base_url);

        let response = match self.http.post(&endpoint).json(request).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%endpoint, "insights request failed: {err}");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "insights service returned non-success");
            return None;
        }

        match response.json::<InsightsAnalysis>().await {
            Ok(analysis) => {
                debug!(total = analysis.total(), "insights received");
                Some(analysis)
            }
            Err(err) => {
                warn!("undecodable insights payload: {err}");
                None
            }
        }
    }
}
