//! Accessibility audit invocation with a bounded retry.
//!
//! The audit engine fails transiently against pages whose scripts mutate
//! the DOM mid-analysis. One delayed retry absorbs that class of failure
//! without hiding persistent ones; a second failure is fatal to the scan.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::browser::BrowserSession;
use crate::error::{Result, ScanError};
use crate::types::AuditOutcome;

/// Seam over the page the audit runs against, so the retry policy is
/// testable without a live browser.
pub trait AuditTarget {
    fn run_audit(&mut self) -> impl Future<Output = Result<AuditOutcome>> + Send;
}

impl AuditTarget for BrowserSession {
    fn run_audit(&mut self) -> impl Future<Output = Result<AuditOutcome>> + Send {
        BrowserSession::run_audit(self)
    }
}

/// How the audit outcome was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAttempt {
    /// The first invocation succeeded.
    First,
    /// The first invocation failed; the single retry succeeded.
    Retried,
}

/// Runs the audit, retrying exactly once after `delay`. Exactly one retry:
/// this bounds the component's worst-case latency to two engine runs plus
/// the delay.
pub async fn run_with_retry<T: AuditTarget>(
    target: &mut T,
    delay: Duration,
) -> Result<(AuditOutcome, AuditAttempt)> {
    match target.run_audit().await {
        Ok(outcome) => Ok((outcome, AuditAttempt::First)),
        Err(first) => {
            debug!("audit attempt failed, retrying once: {first}");
            tokio::time::sleep(delay).await;
            match target.run_audit().await {
                Ok(outcome) => Ok((outcome, AuditAttempt::Retried)),
                Err(second) => Err(ScanError::Audit(format!(
                    "audit failed after retry: {second} (first failure: {first})"
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Audit target replaying a canned sequence of results.
    struct ScriptedTarget {
        outcomes: VecDeque<Result<AuditOutcome>>,
        calls: usize,
    }

    impl ScriptedTarget {
        fn new(outcomes: Vec<Result<AuditOutcome>>) -> Self {
            Self {
                outcomes: outcomes.into(),
                calls: 0,
            }
        }
    }

    impl AuditTarget for ScriptedTarget {
        async fn run_audit(&mut self) -> Result<AuditOutcome> {
            self.calls += 1;
            self.outcomes
                .pop_front()
                .unwrap_or_else(|| Err(ScanError::Audit("script exhausted".to_string())))
        }
    }

    fn transient() -> ScanError {
        ScanError::Driver("Execution context was destroyed".to_string())
    }

    #[tokio::test]
    async fn first_success_is_tagged_first() {
        let mut target = ScriptedTarget::new(vec![Ok(AuditOutcome::default())]);

        let (_, attempt) = run_with_retry(&mut target, Duration::ZERO).await.unwrap();
        assert_eq!(attempt, AuditAttempt::First);
        assert_eq!(target.calls, 1);
    }

    #[tokio::test]
    async fn one_failure_is_masked_by_the_retry() {
        let mut target =
            ScriptedTarget::new(vec![Err(transient()), Ok(AuditOutcome::default())]);

        let (_, attempt) = run_with_retry(&mut target, Duration::ZERO).await.unwrap();
        assert_eq!(attempt, AuditAttempt::Retried);
        assert_eq!(target.calls, 2);
    }

    #[tokio::test]
    async fn two_failures_exhaust_the_retry() {
        let mut target = ScriptedTarget::new(vec![Err(transient()), Err(transient())]);

        let err = run_with_retry(&mut target, Duration::ZERO)
            .await
            .expect_err("second failure must propagate");
        assert!(matches!(err, ScanError::Audit(_)));
        assert!(err.to_string().contains("after retry"));
        assert_eq!(target.calls, 2);
    }

    #[tokio::test]
    async fn never_retries_more_than_once() {
        // Three failures scripted; only two may be consumed.
        let mut target = ScriptedTarget::new(vec![
            Err(transient()),
            Err(transient()),
            Err(transient()),
        ]);

        let _ = run_with_retry(&mut target, Duration::ZERO).await;
        assert_eq!(target.calls, 2);
        assert_eq!(target.outcomes.len(), 1);
    }
}
