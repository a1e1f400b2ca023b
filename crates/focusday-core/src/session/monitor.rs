//! Session state machine.
//!
//! Operates on tick counts, not wall-clock deltas: each [`SessionMonitor::tick`]
//! removes one second from the countdown. The caller decides the cadence.

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::breaks::{compute_breaks, BreakWindow};
use super::verdict::{UsageFailurePolicy, Verdict};
use crate::activity::Activity;
use crate::error::{Result, SessionError};
use crate::events::SessionEvent;
use crate::recurrence;
use crate::stats::{Rating, StatRecord};
use crate::storage::{KvStore, Repository};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No activity loaded yet; no timer.
    Loading,
    Running,
    /// Inside a break window. Phone use is allowed; enforcement is unchanged.
    Break,
    /// Countdown reached zero. Waiting for the verdict, then a rating.
    Expired,
    /// Rated and recorded. Terminal.
    Rated,
    /// Torn down before expiry. Terminal; nothing is recorded.
    Cancelled,
}

/// One occurrence's countdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMonitor {
    date: NaiveDate,
    state: SessionState,
    activity: Option<Activity>,
    total_secs: u64,
    time_left: u64,
    breaks: Vec<BreakWindow>,
    /// Index into `breaks` of the active break.
    active_break: Option<usize>,
    verdict: Option<Verdict>,
    policy: UsageFailurePolicy,
    record: Option<StatRecord>,
}

impl SessionMonitor {
    /// A monitor for an occurrence on `date`, in `Loading`.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            state: SessionState::Loading,
            activity: None,
            total_secs: 0,
            time_left: 0,
            breaks: Vec::new(),
            active_break: None,
            verdict: None,
            policy: UsageFailurePolicy::default(),
            record: None,
        }
    }

    pub fn with_policy(mut self, policy: UsageFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn activity(&self) -> Option<&Activity> {
        self.activity.as_ref()
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn breaks(&self) -> &[BreakWindow] {
        &self.breaks
    }

    pub fn is_on_break(&self) -> bool {
        self.state == SessionState::Break
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    /// Stored `passed` flag once the verdict is known.
    pub fn passed(&self) -> Option<bool> {
        self.verdict.as_ref().map(|v| v.passed(self.policy))
    }

    pub fn record(&self) -> Option<StatRecord> {
        self.record
    }

    /// `"12:05"` for the remaining time.
    pub fn countdown_label(&self) -> String {
        format_countdown(self.time_left)
    }

    /// Literal start and end of the occurrence as epoch milliseconds.
    pub fn query_window(&self) -> Option<(i64, i64)> {
        let (start, end) = self.activity.as_ref()?.window_on(self.date);
        Some((local_epoch_millis(start), local_epoch_millis(end)))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Fetch the activity stored at `index`. The countdown does not start.
    pub fn load<S: KvStore>(&mut self, repo: &Repository<S>, index: usize) -> Result<SessionEvent> {
        let activity = repo.activity_at(index)?;
        Ok(self.load_activity(activity)?)
    }

    /// Attach `activity` to a session that has not started yet.
    ///
    /// The activity must occur on the session date.
    pub fn load_activity(&mut self, activity: Activity) -> Result<SessionEvent, SessionError> {
        if self.state != SessionState::Loading {
            return Err(SessionError::AlreadyStarted);
        }
        if !recurrence::resolve(&activity, self.date) {
            return Err(SessionError::NotScheduled {
                name: activity.name,
                date: self.date,
            });
        }
        debug!(activity = %activity.name, "session loaded");
        let event = SessionEvent::Loaded {
            activity_id: activity.id,
            name: activity.name.clone(),
        };
        self.activity = Some(activity);
        Ok(event)
    }

    /// Start the countdown at wall-clock `now`.
    ///
    /// The countdown covers the time until the activity's end on the
    /// session date, never negative. Break windows are computed once here.
    pub fn start(&mut self, now: NaiveDateTime) -> Result<SessionEvent, SessionError> {
        if self.state != SessionState::Loading {
            return Err(SessionError::AlreadyStarted);
        }
        let activity = self.activity.as_ref().ok_or(SessionError::NotLoaded)?;
        let (_, end) = activity.window_on(self.date);
        let total = (end - now).num_seconds().max(0) as u64;

        self.total_secs = total;
        self.time_left = total;
        self.breaks = compute_breaks(total, activity.breaks_count, activity.breaks_duration);
        self.state = SessionState::Running;
        info!(
            activity = %activity.name,
            total_secs = total,
            breaks = self.breaks.len(),
            "session started"
        );
        Ok(SessionEvent::Started {
            activity_id: activity.id,
            name: activity.name.clone(),
            total_secs: total,
            breaks: self.breaks.clone(),
            at: Utc::now(),
        })
    }

    /// [`load_activity`](Self::load_activity) then [`start`](Self::start).
    pub fn begin(&mut self, activity: Activity, now: NaiveDateTime) -> Result<SessionEvent, SessionError> {
        self.load_activity(activity)?;
        self.start(now)
    }

    /// Tear the session down. No-op once expired or rated.
    pub fn cancel(&mut self) -> Option<SessionEvent> {
        match self.state {
            SessionState::Loading | SessionState::Running | SessionState::Break => {
                info!(time_left = self.time_left, "session cancelled");
                self.state = SessionState::Cancelled;
                self.active_break = None;
                Some(SessionEvent::Cancelled {
                    time_left: self.time_left,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// Advance the countdown by one second.
    ///
    /// Returns the transition this tick caused, if any. Expiry fires once,
    /// on the first tick that finds the countdown at zero.
    pub fn tick(&mut self) -> Option<SessionEvent> {
        match self.state {
            SessionState::Running | SessionState::Break => {}
            _ => return None,
        }

        if self.time_left == 0 {
            self.state = SessionState::Expired;
            self.active_break = None;
            let (window_start_ms, window_end_ms) = self.query_window()?;
            info!("session expired");
            return Some(SessionEvent::Expired {
                window_start_ms,
                window_end_ms,
                at: Utc::now(),
            });
        }

        self.time_left -= 1;
        let now_in = self.breaks.iter().position(|b| b.contains(self.time_left));
        match (self.active_break, now_in) {
            (None, Some(index)) => {
                self.active_break = Some(index);
                self.state = SessionState::Break;
                debug!(index, time_left = self.time_left, "break started");
                Some(SessionEvent::BreakStarted {
                    index,
                    time_left: self.time_left,
                    at: Utc::now(),
                })
            }
            (Some(index), None) => {
                self.active_break = None;
                self.state = SessionState::Running;
                debug!(index, time_left = self.time_left, "break ended");
                Some(SessionEvent::BreakEnded {
                    index,
                    time_left: self.time_left,
                    at: Utc::now(),
                })
            }
            (Some(previous), Some(index)) if previous != index => {
                // Adjacent windows: hand over without leaving Break.
                self.active_break = Some(index);
                Some(SessionEvent::BreakStarted {
                    index,
                    time_left: self.time_left,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// Record the usage verdict. Only valid once, after expiry.
    pub fn apply_verdict(&mut self, verdict: Verdict) -> Result<SessionEvent, SessionError> {
        match self.state {
            SessionState::Expired if self.verdict.is_none() => {}
            SessionState::Expired | SessionState::Rated => {
                return Err(SessionError::VerdictAlreadyApplied)
            }
            SessionState::Cancelled => return Err(SessionError::Cancelled),
            SessionState::Loading => return Err(SessionError::NotLoaded),
            SessionState::Running | SessionState::Break => {
                return Err(SessionError::NotExpired {
                    time_left: self.time_left,
                })
            }
        }
        let passed = verdict.passed(self.policy);
        info!(?verdict, passed, "session verdict");
        self.verdict = Some(verdict.clone());
        Ok(SessionEvent::VerdictReached {
            verdict,
            passed,
            at: Utc::now(),
        })
    }

    fn rating_record(&self, rating: Rating) -> Result<StatRecord, SessionError> {
        match self.state {
            SessionState::Expired => {}
            SessionState::Rated => return Err(SessionError::AlreadyRated),
            SessionState::Cancelled => return Err(SessionError::Cancelled),
            SessionState::Loading => return Err(SessionError::NotLoaded),
            SessionState::Running | SessionState::Break => {
                return Err(SessionError::NotExpired {
                    time_left: self.time_left,
                })
            }
        }
        let passed = self.passed().ok_or(SessionError::VerdictPending)?;
        Ok(StatRecord::new(rating, passed))
    }

    /// Accept the user's rating and end the occurrence. Nothing is stored.
    pub fn rate(&mut self, rating: Rating) -> Result<SessionEvent, SessionError> {
        let record = self.rating_record(rating)?;
        let activity_id = self
            .activity
            .as_ref()
            .map(|a| a.id)
            .ok_or(SessionError::NotLoaded)?;
        self.record = Some(record);
        self.state = SessionState::Rated;
        Ok(SessionEvent::Rated {
            activity_id,
            record,
            at: Utc::now(),
        })
    }

    /// Rate and append the record to the activity's statistics.
    ///
    /// The state only moves to `Rated` once the append succeeded, so a failed
    /// write can be retried.
    pub fn rate_and_store<S: KvStore>(
        &mut self,
        rating: Rating,
        repo: &Repository<S>,
    ) -> Result<SessionEvent> {
        let record = self.rating_record(rating)?;
        let activity_id = self
            .activity
            .as_ref()
            .map(|a| a.id)
            .ok_or(SessionError::NotLoaded)?;
        repo.append_stat(activity_id, record)?;
        Ok(self.rate(rating)?)
    }
}

/// `"M:SS"`, minutes unpadded.
pub fn format_countdown(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Epoch milliseconds of a local wall-clock time.
///
/// Ambiguous times (DST fold) take the earlier instant; nonexistent ones
/// (DST gap) fall back to reading the time as UTC.
pub fn local_epoch_millis(time: NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(&time)
        .earliest()
        .map(|t| t.timestamp_millis())
        .unwrap_or_else(|| time.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityId, Repetition};
    use crate::storage::MemoryStore;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn activity(breaks_count: u32, breaks_duration: u32) -> Activity {
        Activity {
            id: ActivityId::new(),
            name: "Teme".into(),
            start_hour: 9,
            start_minute: 0,
            end_hour: 10,
            end_minute: 0,
            breaks_count,
            breaks_duration,
            details: String::new(),
            steps: vec![],
            repetition: Repetition::Everyday,
            day: None,
            week_day: None,
            start_date: 0,
            notifications: false,
            notification_time: 5,
        }
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        date().and_hms_opt(h, m, s).unwrap()
    }

    fn run_to_expiry(monitor: &mut SessionMonitor) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while monitor.state() != SessionState::Expired {
            if let Some(e) = monitor.tick() {
                events.push(e);
            }
        }
        events
    }

    #[test]
    fn starts_in_loading_and_counts_to_end_of_window() {
        let mut monitor = SessionMonitor::new(date());
        assert_eq!(monitor.state(), SessionState::Loading);
        assert!(monitor.tick().is_none());

        monitor.begin(activity(0, 5), at(9, 50, 0)).unwrap();
        assert_eq!(monitor.state(), SessionState::Running);
        assert_eq!(monitor.time_left(), 600);
        assert_eq!(monitor.countdown_label(), "10:00");
        monitor.tick();
        assert_eq!(monitor.countdown_label(), "9:59");
    }

    #[test]
    fn late_start_clamps_to_zero_and_expires_on_first_tick() {
        let mut monitor = SessionMonitor::new(date());
        monitor.begin(activity(0, 5), at(11, 0, 0)).unwrap();
        assert_eq!(monitor.time_left(), 0);
        assert!(matches!(monitor.tick(), Some(SessionEvent::Expired { .. })));
        assert_eq!(monitor.state(), SessionState::Expired);
    }

    #[test]
    fn begin_twice_is_rejected() {
        let mut monitor = SessionMonitor::new(date());
        monitor.begin(activity(0, 5), at(9, 0, 0)).unwrap();
        assert!(monitor.begin(activity(0, 5), at(9, 0, 0)).is_err());
    }

    #[test]
    fn break_occupies_first_half_of_ten_minutes() {
        let mut monitor = SessionMonitor::new(date());
        monitor.begin(activity(1, 5), at(9, 50, 0)).unwrap();
        assert_eq!(monitor.breaks(), &[BreakWindow { start: 300, end: 600 }]);

        assert!(matches!(
            monitor.tick(),
            Some(SessionEvent::BreakStarted { index: 0, time_left: 599, .. })
        ));
        assert!(monitor.is_on_break());

        for _ in 0..299 {
            assert!(monitor.tick().is_none());
        }
        assert_eq!(monitor.time_left(), 300);
        assert!(monitor.is_on_break());

        assert!(matches!(
            monitor.tick(),
            Some(SessionEvent::BreakEnded { index: 0, time_left: 299, .. })
        ));
        assert_eq!(monitor.state(), SessionState::Running);
    }

    #[test]
    fn two_breaks_in_an_hour_follow_countdown_order() {
        let mut monitor = SessionMonitor::new(date());
        monitor.begin(activity(2, 5), at(9, 0, 0)).unwrap();
        let events = run_to_expiry(&mut monitor);
        let transitions: Vec<(String, usize, u64)> = events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::BreakStarted { index, time_left, .. } => {
                    Some(("start".into(), *index, *time_left))
                }
                SessionEvent::BreakEnded { index, time_left, .. } => {
                    Some(("end".into(), *index, *time_left))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            transitions,
            vec![
                ("start".into(), 1, 2699),
                ("end".into(), 1, 2399),
                ("start".into(), 0, 1499),
                ("end".into(), 0, 1199),
            ]
        );
    }

    #[test]
    fn expiry_fires_once() {
        let mut monitor = SessionMonitor::new(date());
        monitor.begin(activity(0, 5), at(9, 59, 58)).unwrap();
        assert!(monitor.tick().is_none());
        assert!(monitor.tick().is_none());
        assert!(matches!(monitor.tick(), Some(SessionEvent::Expired { .. })));
        assert!(monitor.tick().is_none());
        assert!(monitor.tick().is_none());
    }

    #[test]
    fn expired_event_carries_literal_window() {
        let mut monitor = SessionMonitor::new(date());
        monitor.begin(activity(0, 5), at(10, 0, 0)).unwrap();
        match monitor.tick() {
            Some(SessionEvent::Expired {
                window_start_ms,
                window_end_ms,
                ..
            }) => {
                assert_eq!(window_end_ms - window_start_ms, 3_600_000);
                assert_eq!(window_start_ms, local_epoch_millis(at(9, 0, 0)));
            }
            other => panic!("expected Expired, got {other:?}"),
        }
    }

    #[test]
    fn rating_requires_expiry_and_verdict() {
        let mut monitor = SessionMonitor::new(date());
        let rating = Rating::new(4).unwrap();
        assert_eq!(monitor.rate(rating), Err(SessionError::NotLoaded));

        monitor.begin(activity(0, 5), at(9, 59, 59)).unwrap();
        assert_eq!(monitor.rate(rating), Err(SessionError::NotExpired { time_left: 1 }));
        assert!(monitor.apply_verdict(Verdict::Passed).is_err());

        run_to_expiry(&mut monitor);
        assert_eq!(monitor.rate(rating), Err(SessionError::VerdictPending));

        monitor.apply_verdict(Verdict::Passed).unwrap();
        assert_eq!(
            monitor.apply_verdict(Verdict::Passed),
            Err(SessionError::VerdictAlreadyApplied)
        );

        let event = monitor.rate(rating).unwrap();
        assert!(matches!(event, SessionEvent::Rated { .. }));
        assert_eq!(monitor.state(), SessionState::Rated);
        assert_eq!(monitor.record(), Some(StatRecord::new(rating, true)));
        assert_eq!(monitor.rate(rating), Err(SessionError::AlreadyRated));
    }

    #[test]
    fn unverified_verdict_follows_policy() {
        let mut open = SessionMonitor::new(date());
        open.begin(activity(0, 5), at(10, 0, 0)).unwrap();
        run_to_expiry(&mut open);
        open.apply_verdict(Verdict::Unverified { reason: "x".into() }).unwrap();
        assert_eq!(open.passed(), Some(true));

        let mut closed = SessionMonitor::new(date()).with_policy(UsageFailurePolicy::FailClosed);
        closed.begin(activity(0, 5), at(10, 0, 0)).unwrap();
        run_to_expiry(&mut closed);
        closed.apply_verdict(Verdict::Unverified { reason: "x".into() }).unwrap();
        assert_eq!(closed.passed(), Some(false));
    }

    #[test]
    fn load_by_index_and_store_rating() {
        let repo = Repository::new(MemoryStore::new());
        let a = activity(0, 5);
        let id = a.id;
        repo.add_activity(a).unwrap();

        let mut monitor = SessionMonitor::new(date());
        assert!(monitor.load(&repo, 3).is_err());
        assert_eq!(monitor.state(), SessionState::Loading);
        assert_eq!(monitor.start(at(9, 0, 0)), Err(SessionError::NotLoaded));

        assert!(matches!(
            monitor.load(&repo, 0).unwrap(),
            SessionEvent::Loaded { activity_id, .. } if activity_id == id
        ));
        monitor.start(at(9, 59, 59)).unwrap();
        run_to_expiry(&mut monitor);
        monitor
            .apply_verdict(Verdict::Failed {
                apps: vec!["com.instagram.android".into()],
            })
            .unwrap();
        monitor.rate_and_store(Rating::new(2).unwrap(), &repo).unwrap();

        assert_eq!(
            repo.statistics_for(id),
            vec![StatRecord::new(Rating::new(2).unwrap(), false)]
        );
    }

    #[test]
    fn failed_store_leaves_session_rateable() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let repo = Repository::new(store.clone());
        repo.add_activity(activity(0, 5)).unwrap();

        let mut monitor = SessionMonitor::new(date());
        monitor.load(&repo, 0).unwrap();
        monitor.start(at(10, 0, 0)).unwrap();
        run_to_expiry(&mut monitor);
        monitor.apply_verdict(Verdict::Passed).unwrap();

        store.set_fail_writes(true);
        assert!(monitor.rate_and_store(Rating::new(5).unwrap(), &repo).is_err());
        assert_eq!(monitor.state(), SessionState::Expired);

        store.set_fail_writes(false);
        monitor.rate_and_store(Rating::new(5).unwrap(), &repo).unwrap();
        assert_eq!(monitor.state(), SessionState::Rated);
    }

    #[test]
    fn cancel_stops_the_countdown() {
        let mut monitor = SessionMonitor::new(date());
        monitor.begin(activity(1, 5), at(9, 50, 0)).unwrap();
        monitor.tick();
        assert!(matches!(
            monitor.cancel(),
            Some(SessionEvent::Cancelled { time_left: 599, .. })
        ));
        assert_eq!(monitor.state(), SessionState::Cancelled);
        assert!(monitor.tick().is_none());
        assert!(monitor.cancel().is_none());
        assert_eq!(monitor.rate(Rating::new(3).unwrap()), Err(SessionError::Cancelled));
    }

    #[test]
    fn activity_not_occurring_on_the_date_is_rejected() {
        let mut one_time = activity(0, 5);
        one_time.repetition = Repetition::OneTime;
        one_time.day = Some(crate::dates::long_date(date().succ_opt().unwrap()));

        let mut monitor = SessionMonitor::new(date());
        assert!(matches!(
            monitor.begin(one_time.clone(), at(9, 0, 0)),
            Err(SessionError::NotScheduled { .. })
        ));
        assert_eq!(monitor.state(), SessionState::Loading);
        assert!(monitor.activity().is_none());

        one_time.day = Some(crate::dates::long_date(date()));
        monitor.begin(one_time, at(9, 0, 0)).unwrap();
        assert_eq!(monitor.state(), SessionState::Running);
    }

    #[test]
    fn countdown_format() {
        assert_eq!(format_countdown(0), "0:00");
        assert_eq!(format_countdown(65), "1:05");
        assert_eq!(format_countdown(3600), "60:00");
    }
}
