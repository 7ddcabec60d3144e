//! Puppeteer integration for headless browser automation.
//!
//! This module contains the inline Node.js driver script, error mapping,
//! and availability checks for Node.js, Puppeteer, and the axe-core
//! bindings.
//!
//! The driver is a long-lived helper process speaking a JSON-lines
//! protocol: one command object per stdin line, one reply object per
//! stdout line. Commands execute strictly in order.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{Result, ScanError};

/// Driver script executed with `node -e`. Holds one browser and one page
/// for the lifetime of the process; exits when told to close or when stdin
/// reaches EOF.
pub(crate) const DRIVER_SCRIPT: &str = r#"
const readline = require('readline');
const puppeteer = require('puppeteer');
const { AxePuppeteer } = require('@axe-core/puppeteer');

let browser = null;
let page = null;

function reply(payload) {
  process.stdout.write(JSON.stringify(payload) + '\n');
}

async function handle(cmd) {
  switch (cmd.op) {
    case 'launch': {
      browser = await puppeteer.launch({
        headless: true,
        args: ['--no-sandbox', '--disable-setuid-sandbox', '--disable-dev-shm-usage'],
      });
      page = await browser.newPage();
      await page.setViewport({ width: cmd.width, height: cmd.height });
      return null;
    }
    case 'navigate': {
      await page.goto(cmd.url, { waitUntil: 'domcontentloaded', timeout: cmd.navTimeoutMs });
      await page.waitForSelector('body', { visible: true, timeout: cmd.readyTimeoutMs });
      return null;
    }
    case 'audit': {
      return await new AxePuppeteer(page).analyze();
    }
    case 'extract_dom': {
      return await page.evaluate(() => ({
        title: document.title,
        headings: Array.from(document.querySelectorAll('h1, h2, h3, h4, h5, h6')).map((h) => ({
          level: h.tagName,
          text: (h.textContent || '').trim(),
        })),
        images: Array.from(document.querySelectorAll('img')).map((img) => ({
          src: img.src,
          alt: img.alt || '',
          hasAlt: !!img.alt,
        })),
        links: document.querySelectorAll('a').length,
        buttons: document.querySelectorAll('button, input[type="button"], input[type="submit"]').length,
        totalElements: document.querySelectorAll('*').length,
      }));
    }
    case 'screenshot': {
      return await page.screenshot({ fullPage: true, encoding: 'base64' });
    }
    case 'close': {
      if (browser) {
        await browser.close();
        browser = null;
      }
      return null;
    }
    default:
      throw new Error('unknown op: ' + cmd.op);
  }
}

const rl = readline.createInterface({ input: process.stdin, terminal: false });
let queue = Promise.resolve();

rl.on('line', (line) => {
  queue = queue.then(async () => {
    let cmd;
    try {
      cmd = JSON.parse(line);
    } catch (err) {
      reply({ status: 'error', message: 'malformed command: ' + err.message });
      return;
    }
    try {
      const data = await handle(cmd);
      reply(data === null ? { status: 'ok' } : { status: 'ok', data });
      if (cmd.op === 'close') {
        rl.close();
        process.exit(0);
      }
    } catch (err) {
      reply({ status: 'error', message: err && err.message ? err.message : String(err) });
    }
  });
});

rl.on('close', () => {
  if (browser) {
    browser.close().catch(() => {}).finally(() => process.exit(0));
  }
});
"#;

/// Timeout for checking node/puppeteer availability.
pub(crate) const NODE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Script to check that Puppeteer and the axe bindings are installed.
const PUPPETEER_CHECK_SCRIPT: &str =
    "require('puppeteer'); require('@axe-core/puppeteer'); process.stdout.write('ok');";

/// One command sent to the driver. Serializes to the JSON shape the script
/// reads: `{"op": "...", ...camelCase fields}`.
#[derive(Debug, serde::Serialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub(crate) enum DriverCommand<'a> {
    Launch {
        width: u32,
        height: u32,
    },
    Navigate {
        url: &'a str,
        nav_timeout_ms: u64,
        ready_timeout_ms: u64,
    },
    Audit,
    ExtractDom,
    Screenshot,
    Close,
}

impl DriverCommand<'_> {
    pub(crate) fn op_name(&self) -> &'static str {
        match self {
            DriverCommand::Launch { .. } => "launch",
            DriverCommand::Navigate { .. } => "navigate",
            DriverCommand::Audit => "audit",
            DriverCommand::ExtractDom => "extract_dom",
            DriverCommand::Screenshot => "screenshot",
            DriverCommand::Close => "close",
        }
    }
}

/// One reply line from the driver.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct DriverReply {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Maps a spawn error to an appropriate ScanError.
pub(crate) fn map_spawn_error(err: io::Error, command: &str) -> ScanError {
    if err.kind() == io::ErrorKind::NotFound {
        ScanError::Config(format!(
            "Unable to spawn browser driver; '{}' was not found on PATH",
            command
        ))
    } else {
        ScanError::Io(err)
    }
}

/// Maps an unexpected driver exit (stderr plus exit status) to a ScanError.
pub(crate) fn map_driver_exit(status_text: impl Into<String>, stderr: &str) -> ScanError {
    let lower = stderr.to_ascii_lowercase();

    if lower.contains("cannot find module 'puppeteer'") {
        return ScanError::Config(
            "Puppeteer npm package is missing; install with `npm install puppeteer`.".to_string(),
        );
    }

    if lower.contains("cannot find module '@axe-core/puppeteer'") {
        return ScanError::Config(
            "The @axe-core/puppeteer npm package is missing; install with `npm install @axe-core/puppeteer`."
                .to_string(),
        );
    }

    if lower.contains("could not find chrome") || lower.contains("could not find expected browser")
    {
        return ScanError::Config(
            "Chromium executable is missing; run `npx puppeteer browsers install chrome` to download it."
                .to_string(),
        );
    }

    ScanError::Driver(format!(
        "browser driver exited with status {}: {}",
        status_text.into(),
        stderr.trim()
    ))
}

/// Ensures Node.js is available on the system.
pub(crate) async fn ensure_node_available(node_command: &str) -> Result<()> {
    let mut cmd = Command::new(node_command);
    cmd.arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let status = tokio::time::timeout(NODE_CHECK_TIMEOUT, cmd.status())
        .await
        .map_err(|_| {
            ScanError::Config(format!(
                "Timed out checking node availability after {:?}",
                NODE_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !status.success() {
        return Err(ScanError::Config(format!(
            "Node command {:?} is not available (exit {})",
            node_command, status
        )));
    }

    Ok(())
}

/// Ensures the Puppeteer and axe-core npm packages are installed.
pub(crate) async fn ensure_puppeteer_available(node_command: &str) -> Result<()> {
    let mut cmd = Command::new(node_command);
    cmd.arg("-e")
        .arg(PUPPETEER_CHECK_SCRIPT)
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let output = tokio::time::timeout(NODE_CHECK_TIMEOUT, cmd.output())
        .await
        .map_err(|_| {
            ScanError::Config(format!(
                "Timed out checking Puppeteer availability after {:?}",
                NODE_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(map_driver_exit(format!("{:?}", output.status), &stderr));
    }

    Ok(())
}
