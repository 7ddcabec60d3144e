//! Web Analysis Service (WAS) Library
//!
//! A service that loads a URL in a headless browser, runs an automated
//! accessibility audit against the rendered DOM, extracts a structural page
//! summary, optionally captures a full-page screenshot, and optionally fans
//! the evidence out to an external insights service - all under a global
//! wall-clock budget.
//!
//! # Module Overview
//!
//! - [`browser`] - Headless browser automation via a Node.js driver
//! - [`audit`] - Audit invocation with a bounded retry
//! - [`aggregate`] - Impact-severity aggregation over audit violations
//! - [`scan`] - Scan orchestration, global timeout, response composition
//! - [`insights`] - Best-effort fan-out to the insights service
//! - [`server`] - HTTP surface (`GET /health`, `POST /scan`)
//! - [`config`] - Service configuration from CLI args and environment
//! - [`types`] - Wire types shared across the pipeline
//!
//! # Example
//!
//! ```no_run
//! use was_lib::{ScanOrchestrator, ScanRequest, ServiceConfig};
//!
//! # async fn example() -> was_lib::Result<()> {
//! let orchestrator = ScanOrchestrator::new(ServiceConfig::default())?;
//! let response = orchestrator
//!     .scan(ScanRequest {
//!         url: Some("https://example.com".to_string()),
//!         ..ScanRequest::default()
//!     })
//!     .await?;
//! println!("{} issues found", response.summary.total_issues);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod audit;
pub mod browser;
pub mod config;
pub mod error;
pub mod insights;
pub mod scan;
pub mod server;
pub mod types;

pub use aggregate::{count_by_impact, ImpactCounts};
pub use audit::{run_with_retry, AuditAttempt, AuditTarget};
pub use browser::{BrowserSession, SessionOptions};
pub use config::{
    CliOverrides, ScanTimeouts, ServiceConfig, Viewport, DEFAULT_HOST, DEFAULT_INSIGHTS_BASE_URL,
    DEFAULT_PORT,
};
pub use error::{Result, ScanError};
pub use insights::{InsightsAnalysis, InsightsClient, InsightsRequest, InsightsSummary};
pub use scan::ScanOrchestrator;
pub use server::{router, SERVICE_NAME};
pub use types::{
    AuditOutcome, AuditViolation, DomSummary, HeadingInfo, ImageInfo, KeyboardFlow, ScanRequest,
    ScanResponse, ScanResults, ScanSummary,
};
