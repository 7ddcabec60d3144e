//! Browser automation module for headless page analysis.
//!
//! This module drives a headless browser through a Node.js helper process
//! (Puppeteer plus the axe-core bindings) speaking a JSON-lines protocol
//! over stdio.
//!
//! # Module Structure
//!
//! - [`session`] - Browser session lifecycle and per-step commands
//! - [`puppeteer`] - Driver script, availability checks, error mapping
//! - [`dom`] - DOM summary payload conversion

mod dom;
mod puppeteer;
mod session;

pub use session::{BrowserSession, SessionOptions};
