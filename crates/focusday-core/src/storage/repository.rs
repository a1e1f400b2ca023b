//! Typed access to the stored keys.
//!
//! Reads used for display degrade to "no data" when the store fails, so one
//! broken key does not take the rest of the application down. Writes are
//! read-modify-write sequences: they hold the key's lock for the whole
//! sequence, read strictly, and abort without writing if that read fails.
//!
//! Lock order is always activities before statistics.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::{keys, KvStore};
use crate::activity::{Activity, ActivityId};
use crate::dates::journal_key;
use crate::error::{Result, SessionError, StorageError, ValidationError};
use crate::recurrence::decode_record;
use crate::stats::StatRecord;
use crate::usage::BannedApps;

/// Statistics histories keyed by activity id.
pub type StatisticsMap = HashMap<ActivityId, Vec<StatRecord>>;

#[derive(Default)]
struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    fn for_key(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(key.to_string()).or_default().clone()
    }
}

/// Typed repository over a [`KvStore`].
pub struct Repository<S> {
    store: S,
    locks: KeyLocks,
}

impl<S: KvStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: KeyLocks::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run `f` while holding the lock for `key`.
    fn with_key<T>(&self, key: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.locks.for_key(key);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        f()
    }

    fn read_strict<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.store.get(key)? {
            Some(text) => Ok(serde_json::from_str(&text)?),
            None => Ok(T::default()),
        }
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.read_strict(key) {
            Ok(value) => value,
            Err(e) => {
                error!(key, error = %e, "failed to read key, treating as empty");
                T::default()
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value).map_err(|e| StorageError::Serialize {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.store.set(key, &text).map_err(|e| {
            error!(key, error = %e, "write failed, previous value kept");
            e
        })?;
        Ok(())
    }

    // ── Activities ───────────────────────────────────────────────────

    /// Raw activity records, ids assigned where missing.
    ///
    /// Records written before ids existed, or holding an id that is not a
    /// UUID string, get a fresh one here. The list is written back so the id
    /// stays stable across loads. Caller holds the activities lock.
    fn records_with_ids(&self) -> Result<Vec<Value>> {
        let mut records: Vec<Value> = self.read_strict(keys::ACTIVITIES)?;
        let mut assigned = 0;
        for record in records.iter_mut() {
            if let Some(obj) = record.as_object_mut() {
                let has_id = obj
                    .get("id")
                    .and_then(Value::as_str)
                    .and_then(ActivityId::parse)
                    .is_some();
                if !has_id {
                    obj.insert("id".into(), Value::String(ActivityId::new().to_string()));
                    assigned += 1;
                }
            }
        }
        if assigned > 0 {
            debug!(assigned, "assigned ids to stored activities");
            if let Err(e) = self.write(keys::ACTIVITIES, &records) {
                warn!(error = %e, "could not persist assigned activity ids");
            }
        }
        Ok(records)
    }

    /// Valid activities with their stored position. Malformed records are
    /// skipped; a failed read yields an empty list.
    pub fn list_activities(&self) -> Vec<(usize, Activity)> {
        let records = self.with_key(keys::ACTIVITIES, || self.records_with_ids());
        match records {
            Ok(records) => records
                .iter()
                .enumerate()
                .filter_map(|(i, raw)| decode_record(i, raw).map(|a| (i, a)))
                .collect(),
            Err(e) => {
                error!(error = %e, "failed to load activities, treating as empty");
                Vec::new()
            }
        }
    }

    pub fn activities(&self) -> Vec<Activity> {
        self.list_activities().into_iter().map(|(_, a)| a).collect()
    }

    /// Number of stored records, malformed ones included.
    pub fn activity_count(&self) -> usize {
        self.read_or_default::<Vec<Value>>(keys::ACTIVITIES).len()
    }

    /// The activity stored at `index`.
    pub fn activity_at(&self, index: usize) -> Result<Activity> {
        let records = self.with_key(keys::ACTIVITIES, || self.records_with_ids())?;
        let raw = records.get(index).ok_or_else(|| ValidationError::OutOfBounds {
            collection: "activities".into(),
            index,
            len: records.len(),
        })?;
        decode_record(index, raw)
            .ok_or_else(|| SessionError::ActivityNotFound(format!("#{index} is malformed")).into())
    }

    pub fn activity_by_id(&self, id: ActivityId) -> Option<Activity> {
        self.activities().into_iter().find(|a| a.id == id)
    }

    /// Append a validated activity. Returns its position.
    pub fn add_activity(&self, activity: Activity) -> Result<usize> {
        activity.validate()?;
        self.with_key(keys::ACTIVITIES, || {
            let mut records = self.records_with_ids()?;
            records.push(serde_json::to_value(&activity)?);
            self.write(keys::ACTIVITIES, &records)?;
            debug!(id = %activity.id, name = %activity.name, "activity added");
            Ok(records.len() - 1)
        })
    }

    /// Replace the activity at `index`, keeping its id.
    pub fn update_activity(&self, index: usize, mut activity: Activity) -> Result<Activity> {
        activity.validate()?;
        self.with_key(keys::ACTIVITIES, || {
            let mut records = self.records_with_ids()?;
            let len = records.len();
            let slot = records.get_mut(index).ok_or(ValidationError::OutOfBounds {
                collection: "activities".into(),
                index,
                len,
            })?;
            if let Some(id) = slot
                .get("id")
                .and_then(Value::as_str)
                .and_then(ActivityId::parse)
            {
                activity.id = id;
            }
            *slot = serde_json::to_value(&activity)?;
            self.write(keys::ACTIVITIES, &records)?;
            Ok(activity)
        })
    }

    /// Remove the activity at `index` together with its statistics.
    ///
    /// Later activities shift down by one; their statistics follow them
    /// because they are keyed by id, not position.
    pub fn delete_activity(&self, index: usize) -> Result<Value> {
        self.with_key(keys::ACTIVITIES, || {
            let mut records = self.records_with_ids()?;
            if index >= records.len() {
                return Err(ValidationError::OutOfBounds {
                    collection: "activities".into(),
                    index,
                    len: records.len(),
                }
                .into());
            }
            let removed = records.remove(index);
            self.write(keys::ACTIVITIES, &records)?;

            let id = removed
                .get("id")
                .and_then(Value::as_str)
                .and_then(ActivityId::parse);
            if let Some(id) = id {
                let pruned = self.with_key(keys::STATISTICS, || {
                    let mut stats: StatisticsMap = self.read_strict(keys::STATISTICS)?;
                    if stats.remove(&id).is_some() {
                        self.write(keys::STATISTICS, &stats)?;
                    }
                    Ok(())
                });
                if let Err(e) = pruned {
                    warn!(%id, error = %e, "activity deleted but its statistics were kept");
                }
            }
            Ok(removed)
        })
    }

    /// Clear all activities and statistics.
    pub fn reset(&self) -> Result<()> {
        self.with_key(keys::ACTIVITIES, || {
            self.with_key(keys::STATISTICS, || {
                self.write(keys::ACTIVITIES, &Vec::<Value>::new())?;
                self.store.delete(keys::STATISTICS)?;
                Ok(())
            })
        })
    }

    // ── Statistics ───────────────────────────────────────────────────

    pub fn statistics(&self) -> StatisticsMap {
        self.read_or_default(keys::STATISTICS)
    }

    pub fn statistics_for(&self, id: ActivityId) -> Vec<StatRecord> {
        self.statistics().remove(&id).unwrap_or_default()
    }

    /// Histories aligned with the stored activity positions.
    ///
    /// Malformed records get an empty history.
    pub fn statistics_by_index(&self) -> Vec<Vec<StatRecord>> {
        let records: Vec<Value> = self.read_or_default(keys::ACTIVITIES);
        let mut stats = self.statistics();
        records
            .iter()
            .map(|raw| {
                raw.get("id")
                    .and_then(Value::as_str)
                    .and_then(ActivityId::parse)
                    .and_then(|id| stats.remove(&id))
                    .unwrap_or_default()
            })
            .collect()
    }

    pub fn append_stat(&self, id: ActivityId, record: StatRecord) -> Result<()> {
        self.with_key(keys::STATISTICS, || {
            let mut stats: StatisticsMap = self.read_strict(keys::STATISTICS)?;
            stats.entry(id).or_default().push(record);
            self.write(keys::STATISTICS, &stats)
        })
    }

    // ── Banned apps ──────────────────────────────────────────────────

    pub fn banned_apps(&self) -> BannedApps {
        self.read_or_default(keys::BANNED_APPS)
    }

    pub fn set_banned_apps(&self, banned: &BannedApps) -> Result<()> {
        self.with_key(keys::BANNED_APPS, || self.write(keys::BANNED_APPS, banned))
    }

    /// Returns `false` if the app was already banned.
    pub fn ban_app(&self, package: &str) -> Result<bool> {
        self.with_key(keys::BANNED_APPS, || {
            let mut banned: BannedApps = self.read_strict(keys::BANNED_APPS)?;
            let added = banned.insert(package);
            if added {
                self.write(keys::BANNED_APPS, &banned)?;
            }
            Ok(added)
        })
    }

    /// Returns `false` if the app was not banned.
    pub fn unban_app(&self, package: &str) -> Result<bool> {
        self.with_key(keys::BANNED_APPS, || {
            let mut banned: BannedApps = self.read_strict(keys::BANNED_APPS)?;
            let removed = banned.remove(package);
            if removed {
                self.write(keys::BANNED_APPS, &banned)?;
            }
            Ok(removed)
        })
    }

    // ── Journal ──────────────────────────────────────────────────────

    /// Journal text for `date`; empty when none or unreadable.
    pub fn journal_entry(&self, date: NaiveDate) -> String {
        let key = journal_key(date);
        match self.store.get(&key) {
            Ok(text) => text.unwrap_or_default(),
            Err(e) => {
                error!(key, error = %e, "failed to read journal entry");
                String::new()
            }
        }
    }

    pub fn save_journal_entry(&self, date: NaiveDate, text: &str) -> Result<()> {
        let key = journal_key(date);
        self.with_key(&key, || {
            self.store.set(&key, text).map_err(|e| {
                error!(key, error = %e, "failed to save journal entry");
                e.into()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Repetition;
    use crate::stats::Rating;
    use crate::storage::MemoryStore;

    fn activity(name: &str) -> Activity {
        Activity {
            id: ActivityId::new(),
            name: name.into(),
            start_hour: 9,
            start_minute: 0,
            end_hour: 10,
            end_minute: 0,
            breaks_count: 0,
            breaks_duration: 5,
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

    fn rec(stars: u8, passed: bool) -> StatRecord {
        StatRecord::new(Rating::new(stars).unwrap(), passed)
    }

    #[test]
    fn add_and_list_keep_order() {
        let repo = Repository::new(MemoryStore::new());
        assert_eq!(repo.add_activity(activity("a")).unwrap(), 0);
        assert_eq!(repo.add_activity(activity("b")).unwrap(), 1);
        let names: Vec<_> = repo.activities().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn invalid_activity_is_not_written() {
        let repo = Repository::new(MemoryStore::new());
        let mut bad = activity("bad");
        bad.end_hour = 8;
        assert!(repo.add_activity(bad).is_err());
        assert_eq!(repo.activity_count(), 0);
    }

    #[test]
    fn legacy_records_get_stable_ids() {
        let store = MemoryStore::new();
        store
            .set(
                keys::ACTIVITIES,
                r#"[{"name":"old","startHour":"9","startMinute":"0","endHour":"10","endMinute":"0","repetition":"everyday"}]"#,
            )
            .unwrap();
        let repo = Repository::new(store);
        let first = repo.activity_at(0).unwrap().id;
        let second = repo.activity_at(0).unwrap().id;
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_records_keep_their_position() {
        let store = MemoryStore::new();
        store
            .set(
                keys::ACTIVITIES,
                r#"[{"name":"broken"},{"name":"ok","startHour":9,"startMinute":0,"endHour":10,"endMinute":0}]"#,
            )
            .unwrap();
        let repo = Repository::new(store);
        let listed = repo.list_activities();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, 1);
        assert!(repo.activity_at(0).is_err());
        assert_eq!(repo.activity_at(1).unwrap().name, "ok");
    }

    #[test]
    fn update_keeps_id() {
        let repo = Repository::new(MemoryStore::new());
        let original = activity("a");
        let id = original.id;
        repo.add_activity(original).unwrap();
        let mut edited = activity("renamed");
        edited.start_hour = 8;
        let updated = repo.update_activity(0, edited).unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(repo.activity_at(0).unwrap().name, "renamed");
        assert!(repo.update_activity(3, activity("x")).is_err());
    }

    #[test]
    fn delete_removes_statistics_and_keeps_alignment() {
        let repo = Repository::new(MemoryStore::new());
        let a = activity("a");
        let b = activity("b");
        let c = activity("c");
        let (ida, idb, idc) = (a.id, b.id, c.id);
        for x in [a, b, c] {
            repo.add_activity(x).unwrap();
        }
        repo.append_stat(ida, rec(1, true)).unwrap();
        repo.append_stat(idb, rec(2, false)).unwrap();
        repo.append_stat(idc, rec(3, true)).unwrap();

        repo.delete_activity(1).unwrap();

        let names: Vec<_> = repo.activities().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(
            repo.statistics_by_index(),
            vec![vec![rec(1, true)], vec![rec(3, true)]]
        );
        assert!(repo.statistics_for(idb).is_empty());
        assert!(repo.delete_activity(5).is_err());
    }

    #[test]
    fn failed_reads_degrade_to_empty() {
        let store = Arc::new(MemoryStore::new());
        let repo = Repository::new(store.clone());
        repo.add_activity(activity("a")).unwrap();
        store.set_fail_reads(true);
        assert!(repo.activities().is_empty());
        assert!(repo.statistics().is_empty());
        assert!(repo.banned_apps().is_empty());
        assert_eq!(repo.journal_entry(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()), "");
    }

    #[test]
    fn failed_read_aborts_write() {
        let store = Arc::new(MemoryStore::new());
        let repo = Repository::new(store.clone());
        repo.add_activity(activity("a")).unwrap();
        store.set_fail_reads(true);
        assert!(repo.add_activity(activity("b")).is_err());
        store.set_fail_reads(false);
        assert_eq!(repo.activity_count(), 1);
    }

    #[test]
    fn failed_write_keeps_previous_state() {
        let store = Arc::new(MemoryStore::new());
        let repo = Repository::new(store.clone());
        let a = activity("a");
        let id = a.id;
        repo.add_activity(a).unwrap();
        repo.append_stat(id, rec(5, true)).unwrap();

        store.set_fail_writes(true);
        assert!(repo.append_stat(id, rec(1, false)).is_err());
        assert!(repo.delete_activity(0).is_err());
        store.set_fail_writes(false);

        assert_eq!(repo.statistics_for(id), vec![rec(5, true)]);
        assert_eq!(repo.activity_count(), 1);
    }

    #[test]
    fn banned_apps_round_trip() {
        let repo = Repository::new(MemoryStore::new());
        assert!(repo.ban_app("com.instagram.android").unwrap());
        assert!(!repo.ban_app("com.instagram.android").unwrap());
        assert!(repo.banned_apps().contains("com.instagram.android"));
        assert!(repo.unban_app("com.instagram.android").unwrap());
        assert!(!repo.unban_app("com.instagram.android").unwrap());
        assert!(repo.banned_apps().is_empty());
    }

    #[test]
    fn journal_is_keyed_by_date() {
        let repo = Repository::new(MemoryStore::new());
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        repo.save_journal_entry(day, "walked").unwrap();
        assert_eq!(repo.journal_entry(day), "walked");
        assert_eq!(repo.store().get("19.10.2026").unwrap().as_deref(), Some("walked"));
        assert_eq!(repo.journal_entry(day.succ_opt().unwrap()), "");
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        let repo = Arc::new(Repository::new(MemoryStore::new()));
        let a = activity("a");
        let id = a.id;
        repo.add_activity(a).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        repo.append_stat(id, rec(3, true)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(repo.statistics_for(id).len(), 80);
    }

    #[test]
    fn reset_clears_everything() {
        let repo = Repository::new(MemoryStore::new());
        let a = activity("a");
        let id = a.id;
        repo.add_activity(a).unwrap();
        repo.append_stat(id, rec(4, true)).unwrap();
        repo.reset().unwrap();
        assert_eq!(repo.activity_count(), 0);
        assert!(repo.statistics().is_empty());
    }
}
