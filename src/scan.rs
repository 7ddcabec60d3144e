//! Scan orchestration: the coordination core.
//!
//! One scan sequences browser launch, navigation, audit (with its single
//! retry), DOM extraction, and the optional screenshot, all raced against a
//! global wall-clock budget. The race bounds only the caller's wait: the
//! pipeline runs as its own task, and its completion - success or failure -
//! is what drives browser release. A scan that outlives the budget answers
//! the caller immediately and finishes releasing in the background.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::aggregate;
use crate::audit::{self, AuditAttempt};
use crate::browser::{BrowserSession, SessionOptions};
use crate::config::ServiceConfig;
use crate::error::{Result, ScanError};
use crate::insights::{InsightsClient, InsightsRequest};
use crate::types::{
    AuditOutcome, DomSummary, KeyboardFlow, ScanRequest, ScanResponse, ScanResults, ScanSummary,
};

/// Everything the browser-facing pipeline produces before aggregation.
#[derive(Debug)]
struct PipelineOutput {
    audit: AuditOutcome,
    audit_attempt: AuditAttempt,
    dom: DomSummary,
    screenshot: Option<String>,
}

/// Coordinates one scan per request: browser lifecycle, global timeout,
/// aggregation, and the optional insights fan-out.
#[derive(Clone)]
pub struct ScanOrchestrator {
    config: Arc<ServiceConfig>,
    insights: InsightsClient,
}

impl ScanOrchestrator {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let insights = InsightsClient::new(&config.insights_base_url, config.timeouts.insights)?;
        Ok(Self {
            config: Arc::new(config),
            insights,
        })
    }

    /// Runs one scan end to end and composes the response.
    pub async fn scan(&self, request: ScanRequest) -> Result<ScanResponse> {
        // Syntactic validation first: malformed input never reaches the
        // browser.
        let raw_url = request.url.clone().ok_or(ScanError::MissingUrl)?;
        let url = Url::parse(&raw_url)?;

        let started = Instant::now();
        let scan_id = Uuid::new_v4();
        info!(url = %raw_url, %scan_id, "scan started");

        let options = SessionOptions::from(self.config.as_ref());
        let pipeline = run_pipeline(options, url.clone(), request.include_screenshot);
        let output = with_global_timeout(pipeline, self.config.timeouts.global).await?;

        if output.audit_attempt == AuditAttempt::Retried {
            debug!(%scan_id, "audit succeeded on retry");
        }

        let by_impact = aggregate::count_by_impact(&output.audit.violations);
        let total_issues = output.audit.violations.len() as u64;

        let ai_analysis = if request.include_ai_analysis {
            self.insights
                .analyze(&InsightsRequest {
                    url: url.as_str(),
                    scan_id,
                    axe_results: &output.audit,
                    dom_data: &output.dom,
                    screenshot_b64: output.screenshot.as_deref(),
                })
                .await
        } else {
            None
        };
        let ai_insights = ai_analysis.as_ref().map(|a| a.total()).unwrap_or(0);

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(%scan_id, total_issues, duration_ms, "scan finished");

        Ok(ScanResponse {
            success: true,
            url: raw_url,
            scan_id,
            results: ScanResults {
                axe_results: output.audit,
                dom_data: output.dom,
                screenshot: output.screenshot,
                keyboard_flow: request.include_keyboard_flow.then(KeyboardFlow::not_run),
                ai_analysis,
            },
            summary: ScanSummary {
                total_issues,
                by_impact,
                ai_insights,
                duration_ms,
            },
            timestamp: Utc::now(),
        })
    }
}

/// Runs the scan steps in order against one owned browser session. The
/// session is closed on every exit path before the result propagates; a
/// launch failure has no session to release.
async fn run_pipeline(
    options: SessionOptions,
    url: Url,
    include_screenshot: bool,
) -> Result<PipelineOutput> {
    let retry_delay = options.timeouts.audit_retry_delay;
    let mut session = BrowserSession::launch(&options).await?;
    let result = drive(&mut session, &url, include_screenshot, retry_delay).await;
    session.close().await;
    result
}

async fn drive(
    session: &mut BrowserSession,
    url: &Url,
    include_screenshot: bool,
    retry_delay: Duration,
) -> Result<PipelineOutput> {
    session.navigate(url.as_str()).await?;
    let (audit, audit_attempt) = audit::run_with_retry(session, retry_delay).await?;
    let dom = session.extract_dom().await?;
    let screenshot = if include_screenshot {
        Some(session.screenshot().await?)
    } else {
        None
    };

    Ok(PipelineOutput {
        audit,
        audit_attempt,
        dom,
        screenshot,
    })
}

/// Races a pipeline against the global budget. The pipeline is spawned as
/// its own task, so elapsing the budget stops the caller's wait without
/// interrupting the browser work; the detached task keeps running until
/// its own release step completes.
async fn with_global_timeout<T, F>(pipeline: F, budget: Duration) -> Result<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    let handle = tokio::spawn(pipeline);
    match timeout(budget, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ScanError::Unknown(format!(
            "scan pipeline panicked: {join_err}"
        ))),
        Err(_) => {
            warn!(
                "scan timeout after {budget:?}; browser release continues in the background"
            );
            Err(ScanError::GlobalTimeout(budget))
        }
    }
}
