//! Service configuration resolved from CLI arguments and the environment.
//!
//! Precedence: explicit CLI flag > environment variable > built-in default.

use std::time::Duration;

/// Default listening port (`PORT`).
pub const DEFAULT_PORT: u16 = 3003;

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default insights service base address (`INSIGHTS_SERVICE_URL`).
pub const DEFAULT_INSIGHTS_BASE_URL: &str = "http://localhost:3004";

/// Fixed viewport the page is rendered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

/// Time budgets for one scan.
///
/// `global` is the binding budget raced against the whole pipeline. The
/// inner navigation/readiness budgets are deliberately more generous; they
/// matter on the non-raced release path, where the detached pipeline keeps
/// running after the caller has already been answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTimeouts {
    /// Whole-pipeline budget raced against the scan.
    pub global: Duration,
    /// Page navigation budget (DOM content parsed).
    pub navigation: Duration,
    /// Budget for a visible root element after navigation.
    pub readiness: Duration,
    /// Hard deadline for any single driver command reply.
    pub command: Duration,
    /// Delay before the single audit retry.
    pub audit_retry_delay: Duration,
    /// Independent budget for the insights fan-out call.
    pub insights: Duration,
    /// Grace period for a graceful browser shutdown before the kill.
    pub close_grace: Duration,
}

impl Default for ScanTimeouts {
    fn default() -> Self {
        Self {
            global: Duration::from_secs(30),
            navigation: Duration::from_secs(45),
            readiness: Duration::from_secs(15),
            command: Duration::from_secs(60),
            audit_retry_delay: Duration::from_secs(1),
            insights: Duration::from_secs(8),
            close_grace: Duration::from_secs(5),
        }
    }
}

/// Process-wide configuration, read-only after startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub insights_base_url: String,
    /// Node.js command used to spawn the browser driver.
    pub node_command: String,
    pub viewport: Viewport,
    pub timeouts: ScanTimeouts,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            insights_base_url: DEFAULT_INSIGHTS_BASE_URL.to_string(),
            node_command: "node".to_string(),
            viewport: Viewport::default(),
            timeouts: ScanTimeouts::default(),
        }
    }
}

/// Values provided explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub insights_url: Option<String>,
    pub node_command: Option<String>,
}

impl ServiceConfig {
    /// Resolves the effective configuration from CLI flags and the process
    /// environment (`PORT`, `INSIGHTS_SERVICE_URL`).
    pub fn resolve(cli: CliOverrides) -> Self {
        Self::resolve_with(
            cli,
            std::env::var("PORT").ok(),
            std::env::var("INSIGHTS_SERVICE_URL").ok(),
        )
    }

    fn resolve_with(
        cli: CliOverrides,
        env_port: Option<String>,
        env_insights_url: Option<String>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            host: cli.host.unwrap_or(defaults.host),
            port: cli
                .port
                .or_else(|| parse_port(env_port.as_deref()))
                .unwrap_or(DEFAULT_PORT),
            insights_base_url: cli
                .insights_url
                .or(env_insights_url)
                .unwrap_or(defaults.insights_base_url),
            node_command: cli.node_command.unwrap_or(defaults.node_command),
            viewport: defaults.viewport,
            timeouts: defaults.timeouts,
        }
    }
}

fn parse_port(raw: Option<&str>) -> Option<u16> {
    raw.and_then(|value| value.trim().parse().ok())
}
