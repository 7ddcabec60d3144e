//! Browser session management.
//!
//! A [`BrowserSession`] owns one driver process (and therefore one headless
//! browser) for the lifetime of a single scan. Commands are strictly
//! sequential request/response round-trips, each under a hard deadline: a
//! missed reply means the browser is wedged, and the child is killed rather
//! than waited on.
//!
//! Release is layered. [`BrowserSession::close`] asks the driver to shut
//! the browser down gracefully and falls back to killing the process; the
//! child is additionally spawned with `kill_on_drop`, so a session that
//! goes out of scope on any other path cannot leak a browser process.

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::dom::{convert_raw_dom, RawDomSummary};
use super::puppeteer::{
    ensure_node_available, ensure_puppeteer_available, map_driver_exit, map_spawn_error,
    DriverCommand, DriverReply, DRIVER_SCRIPT,
};
use crate::config::{ScanTimeouts, ServiceConfig, Viewport};
use crate::error::{Result, ScanError};
use crate::types::{AuditOutcome, DomSummary};

/// Slack added on top of the in-page navigation budgets for the driver's
/// own round-trip overhead.
const NAVIGATION_SLACK: Duration = Duration::from_secs(5);

/// Configuration for one browser session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// The Node.js command to use (default: "node").
    pub node_command: String,
    /// Viewport dimensions for the page.
    pub viewport: Viewport,
    /// Per-step time budgets.
    pub timeouts: ScanTimeouts,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            node_command: "node".to_string(),
            viewport: Viewport::default(),
            timeouts: ScanTimeouts::default(),
        }
    }
}

impl From<&ServiceConfig> for SessionOptions {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            node_command: config.node_command.clone(),
            viewport: config.viewport,
            timeouts: config.timeouts,
        }
    }
}

/// One headless browser, owned for the duration of a scan.
pub struct BrowserSession {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    stderr_buf: Arc<Mutex<String>>,
    stderr_task: JoinHandle<()>,
    timeouts: ScanTimeouts,
}

impl BrowserSession {
    /// Spawns the driver process and launches the browser at the configured
    /// viewport. Fails if Node.js or the driver's npm packages are missing,
    /// or if the browser itself cannot start.
    pub async fn launch(options: &SessionOptions) -> Result<Self> {
        ensure_node_available(&options.node_command).await?;
        ensure_puppeteer_available(&options.node_command).await?;

        let mut cmd = Command::new(&options.node_command);
        cmd.arg("-e")
            .arg(DRIVER_SCRIPT)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|err| map_spawn_error(err, &options.node_command))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ScanError::Driver("driver stdin was not piped".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ScanError::Driver("driver stdout was not piped".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ScanError::Driver("driver stderr was not piped".to_string()))?;

        // Drain stderr continuously; the browser logs freely and a full
        // pipe would stall the driver.
        let stderr_buf = Arc::new(Mutex::new(String::new()));
        let stderr_task = tokio::spawn({
            let buf = Arc::clone(&stderr_buf);
            async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "was::driver", "{line}");
                    if let Ok(mut buf) = buf.lock() {
                        buf.push_str(&line);
                        buf.push('\n');
                    }
                }
            }
        });

        let mut session = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            stderr_buf,
            stderr_task,
            timeouts: options.timeouts,
        };

        session
            .request(
                DriverCommand::Launch {
                    width: options.viewport.width,
                    height: options.viewport.height,
                },
                options.timeouts.command,
            )
            .await?;

        Ok(session)
    }

    /// Navigates the page and waits for it to become analyzable: DOM
    /// content parsed, then a visible `body` element. Fatal on failure; no
    /// retry at this layer.
    pub async fn navigate(&mut self, url: &str) -> Result<()> {
        let deadline = self.timeouts.navigation + self.timeouts.readiness + NAVIGATION_SLACK;
        self.request(
            DriverCommand::Navigate {
                url,
                nav_timeout_ms: self.timeouts.navigation.as_millis() as u64,
                ready_timeout_ms: self.timeouts.readiness.as_millis() as u64,
            },
            deadline,
        )
        .await
        .map(|_| ())
        .map_err(|err| match err {
            ScanError::Driver(message) => ScanError::Navigation(message),
            other => other,
        })
    }

    /// Runs the audit engine once against the loaded page.
    pub async fn run_audit(&mut self) -> Result<AuditOutcome> {
        let data = self
            .request(DriverCommand::Audit, self.timeouts.command)
            .await?
            .ok_or_else(|| ScanError::Driver("audit reply carried no data".to_string()))?;
        Ok(serde_json::from_value(data)?)
    }

    /// Extracts the structural DOM summary from the loaded page.
    pub async fn extract_dom(&mut self) -> Result<DomSummary> {
        let data = self
            .request(DriverCommand::ExtractDom, self.timeouts.command)
            .await?
            .ok_or_else(|| ScanError::Driver("extract_dom reply carried no data".to_string()))?;
        let raw: RawDomSummary = serde_json::from_value(data)?;
        Ok(convert_raw_dom(raw))
    }

    /// Captures the full scrollable page, base64-encoded.
    pub async fn screenshot(&mut self) -> Result<String> {
        let data = self
            .request(DriverCommand::Screenshot, self.timeouts.command)
            .await?
            .ok_or_else(|| ScanError::Driver("screenshot reply carried no data".to_string()))?;
        Ok(serde_json::from_value(data)?)
    }

    /// Releases the browser. Asks the driver to shut down gracefully, then
    /// makes sure the process is gone. Never fails; release problems are
    /// logged and the kill fallback runs instead.
    pub async fn close(mut self) {
        match self
            .request(DriverCommand::Close, self.timeouts.close_grace)
            .await
        {
            Ok(_) => {
                if timeout(self.timeouts.close_grace, self.child.wait())
                    .await
                    .is_err()
                {
                    warn!("driver did not exit after close; killing");
                    let _ = self.child.start_kill();
                    let _ = self.child.wait().await;
                }
            }
            Err(err) => {
                warn!("graceful browser close failed, killing driver: {err}");
                let _ = self.child.start_kill();
                let _ = self.child.wait().await;
            }
        }
        self.stderr_task.abort();
    }

    /// One command round-trip. A deadline miss kills the child: the
    /// protocol is strictly request/response, so a missing reply means the
    /// browser is wedged and nothing further can be salvaged from it.
    async fn request(
        &mut self,
        command: DriverCommand<'_>,
        deadline: Duration,
    ) -> Result<Option<serde_json::Value>> {
        let op = command.op_name();
        let mut line = serde_json::to_string(&command)?;
        line.push('\n');

        if self.stdin.write_all(line.as_bytes()).await.is_err() {
            return Err(self.exit_error().await);
        }
        if self.stdin.flush().await.is_err() {
            return Err(self.exit_error().await);
        }

        let reply = match timeout(deadline, self.stdout.next_line()).await {
            Ok(Ok(Some(text))) => serde_json::from_str::<DriverReply>(&text).map_err(|err| {
                ScanError::Driver(format!(
                    "unparseable driver reply: {err} - raw: {}",
                    text.trim()
                ))
            })?,
            Ok(Ok(None)) => return Err(self.exit_error().await),
            Ok(Err(err)) => return Err(ScanError::Io(err)),
            Err(_) => {
                let _ = self.child.start_kill();
                let _ = self.child.wait().await;
                return Err(ScanError::Driver(format!(
                    "browser driver timeout after {:?} awaiting {} reply",
                    deadline, op
                )));
            }
        };

        if reply.status == "ok" {
            Ok(reply.data)
        } else {
            Err(ScanError::Driver(
                reply
                    .message
                    .unwrap_or_else(|| format!("driver returned status {}", reply.status)),
            ))
        }
    }

    /// Builds the error for a driver that died mid-protocol, folding in
    /// whatever it wrote to stderr.
    async fn exit_error(&mut self) -> ScanError {
        let status = match self.child.wait().await {
            Ok(status) => status.to_string(),
            Err(err) => format!("unknown ({err})"),
        };
        // Give the stderr reader a moment to finish draining.
        let _ = timeout(Duration::from_millis(200), &mut self.stderr_task).await;
        let stderr = self
            .stderr_buf
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default();
        map_driver_exit(status, &stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_options_default_values() {
        let opts = SessionOptions::default();
        assert_eq!(opts.node_command, "node");
        assert_eq!(opts.viewport.width, 1280);
        assert_eq!(opts.viewport.height, 800);
        assert_eq!(opts.timeouts.navigation, Duration::from_secs(45));
        assert_eq!(opts.timeouts.readiness, Duration::from_secs(15));
    }

    #[test]
    fn session_options_from_service_config() {
        let config = ServiceConfig {
            node_command: "custom-node".to_string(),
            ..ServiceConfig::default()
        };

        let opts = SessionOptions::from(&config);
        assert_eq!(opts.node_command, "custom-node");
        assert_eq!(opts.viewport, config.viewport);
        assert_eq!(opts.timeouts, config.timeouts);
    }

    #[tokio::test]
    async fn launch_fails_for_missing_binary() {
        let options = SessionOptions {
            node_command: "definitely-not-a-binary".to_string(),
            ..SessionOptions::default()
        };

        let result = BrowserSession::launch(&options).await;
        assert!(result.is_err());
        let msg = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(
            msg.contains("not found on PATH") || msg.contains("not available"),
            "expected a missing-binary hint, got: {msg}"
        );
    }
}
