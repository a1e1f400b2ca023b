use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::usage::{find_banned_opens, BannedApps, UsageLog};

/// Outcome of the banned-app check at expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verdict {
    /// No banned app was opened during the window.
    Passed,
    /// These banned apps were opened during the window.
    Failed { apps: Vec<String> },
    /// The usage log could not be queried.
    Unverified { reason: String },
}

/// How an [`Verdict::Unverified`] session is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageFailurePolicy {
    /// Record as passed.
    #[default]
    FailOpen,
    /// Record as failed.
    FailClosed,
}

impl Verdict {
    /// The `passed` flag stored for this verdict.
    pub fn passed(&self, policy: UsageFailurePolicy) -> bool {
        match self {
            Verdict::Passed => true,
            Verdict::Failed { .. } => false,
            Verdict::Unverified { .. } => policy == UsageFailurePolicy::FailOpen,
        }
    }
}

/// Query `log` for `[start_ms, end_ms]` and check the events against `banned`.
///
/// Query errors are logged and produce [`Verdict::Unverified`]; they never
/// propagate.
pub async fn evaluate_usage<L: UsageLog>(
    log: &L,
    start_ms: i64,
    end_ms: i64,
    banned: &BannedApps,
) -> Verdict {
    match log.query_events(start_ms, end_ms).await {
        Ok(events) => {
            let apps = find_banned_opens(&events, banned);
            if apps.is_empty() {
                Verdict::Passed
            } else {
                info!(?apps, "banned apps opened during session");
                Verdict::Failed { apps }
            }
        }
        Err(e) => {
            warn!(error = %e, "usage log query failed, verdict unverified");
            Verdict::Unverified {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::{MemoryUsageLog, UsageEvent, APP_OPEN_EVENT};

    fn banned() -> BannedApps {
        ["com.instagram.android"].into_iter().collect()
    }

    #[tokio::test]
    async fn clean_window_passes() {
        let log = MemoryUsageLog::new(vec![UsageEvent {
            package_name: "com.whatsapp".into(),
            event_type: APP_OPEN_EVENT,
            timestamp: 50,
        }]);
        assert_eq!(evaluate_usage(&log, 0, 100, &banned()).await, Verdict::Passed);
    }

    #[tokio::test]
    async fn banned_open_fails() {
        let log = MemoryUsageLog::new(vec![UsageEvent {
            package_name: "com.instagram.android".into(),
            event_type: APP_OPEN_EVENT,
            timestamp: 50,
        }]);
        assert_eq!(
            evaluate_usage(&log, 0, 100, &banned()).await,
            Verdict::Failed {
                apps: vec!["com.instagram.android".into()]
            }
        );
        // Outside the window it does not count.
        assert_eq!(evaluate_usage(&log, 60, 100, &banned()).await, Verdict::Passed);
    }

    #[tokio::test]
    async fn query_failure_is_unverified_and_follows_policy() {
        let log = MemoryUsageLog::unavailable("no permission");
        let verdict = evaluate_usage(&log, 0, 100, &banned()).await;
        assert!(matches!(verdict, Verdict::Unverified { .. }));
        assert!(verdict.passed(UsageFailurePolicy::FailOpen));
        assert!(!verdict.passed(UsageFailurePolicy::FailClosed));
    }
}
