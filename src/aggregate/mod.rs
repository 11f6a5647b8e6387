//! Per-group and global tally computation.
//!
//! Group tallies are cached keyed by normalized group name and recomputed
//! lazily; the global total sums only non-excluded groups, computing a
//! group from scratch only when its cache slot is empty. Threshold changes
//! invalidate everything; exclusion toggles touch no group-local state.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::app::Result;
use crate::classifier;
use crate::domain::{normalize_group_name, GroupSnapshot, ItemId, ItemStatus, SubmissionMeta};
use crate::store::Store;

/// Overall status tally for one group. Every item lands in exactly one of
/// the three status buckets; unresolved items count as unattended until
/// their lookup settles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupCounts {
    pub total: usize,
    pub solved: usize,
    pub wrong: usize,
    pub unattended: usize,
}

/// Tally recomputed under the active threshold. An item solved before the
/// cutoff moves to `unattended` here, never to `wrong`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilteredCounts {
    pub solved: usize,
    pub wrong: usize,
    pub unattended: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupTally {
    pub overall: GroupCounts,
    pub filtered: FilteredCounts,
}

impl GroupTally {
    fn add(&mut self, other: &GroupTally) {
        self.overall.total += other.overall.total;
        self.overall.solved += other.overall.solved;
        self.overall.wrong += other.overall.wrong;
        self.overall.unattended += other.overall.unattended;
        self.filtered.solved += other.filtered.solved;
        self.filtered.wrong += other.filtered.wrong;
        self.filtered.unattended += other.filtered.unattended;
    }
}

/// Result of one tally pass over a group: the counts plus the ids that still
/// need a remote lookup before they settle.
#[derive(Debug, Clone, Default)]
pub struct TallyOutcome {
    pub tally: GroupTally,
    /// Unsolved items with no cache row; classification is pending on these.
    pub pending: Vec<ItemId>,
    /// Solved items with no cache row while a past-day threshold is active;
    /// filtering needs their submission time.
    pub unfiltered_solved: Vec<ItemId>,
}

pub struct Aggregator {
    store: Arc<dyn Store + Send + Sync>,
    tallies: Mutex<HashMap<String, GroupTally>>,
    excluded: Mutex<HashSet<String>>,
    threshold: Mutex<Option<NaiveDate>>,
}

impl Aggregator {
    /// Loads the persisted threshold and exclusion set.
    pub fn new(store: Arc<dyn Store + Send + Sync>) -> Result<Self> {
        let threshold = store.threshold()?;
        let excluded = store
            .excluded_groups()?
            .iter()
            .map(|name| normalize_group_name(name))
            .collect();

        Ok(Self {
            store,
            tallies: Mutex::new(HashMap::new()),
            excluded: Mutex::new(excluded),
            threshold: Mutex::new(threshold),
        })
    }

    pub fn threshold(&self) -> Option<NaiveDate> {
        *self.threshold.lock().expect("threshold lock poisoned")
    }

    /// Persist a new cutoff and drop every cached tally, since filtered
    /// counts depend on it.
    pub fn set_threshold(&self, threshold: Option<NaiveDate>) -> Result<()> {
        self.store.set_threshold(threshold)?;
        *self.threshold.lock().expect("threshold lock poisoned") = threshold;
        self.invalidate_all();
        Ok(())
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded
            .lock()
            .expect("exclusion lock poisoned")
            .contains(&normalize_group_name(name))
    }

    /// Toggle a group in or out of the global tally. Group-local counts are
    /// untouched; only the next total() reflects the change. The set is
    /// persisted under the normalized name so it survives reloads
    /// independent of the live list order.
    pub fn set_excluded(&self, name: &str, excluded: bool) -> Result<()> {
        let key = normalize_group_name(name);
        let names = {
            let mut set = self.excluded.lock().expect("exclusion lock poisoned");
            if excluded {
                set.insert(key);
            } else {
                set.remove(&key);
            }
            let mut names: Vec<String> = set.iter().cloned().collect();
            names.sort();
            names
        };
        self.store.set_excluded_groups(&names)
    }

    pub fn invalidate_group(&self, name: &str) {
        self.tallies
            .lock()
            .expect("tally lock poisoned")
            .remove(&normalize_group_name(name));
    }

    pub fn invalidate_all(&self) {
        self.tallies.lock().expect("tally lock poisoned").clear();
    }

    /// Tally for one group, recomputed only when the cache slot is empty.
    /// A cached tally reports no pending ids; groups with unresolved items
    /// are invalidated once their lookups land, so the next call recounts.
    pub fn group_tally(&self, group: &GroupSnapshot, today: NaiveDate) -> Result<TallyOutcome> {
        let key = normalize_group_name(&group.name);
        if let Some(tally) = self.tallies.lock().expect("tally lock poisoned").get(&key) {
            return Ok(TallyOutcome {
                tally: *tally,
                ..TallyOutcome::default()
            });
        }

        let outcome = self.compute_group(group, today)?;
        self.tallies
            .lock()
            .expect("tally lock poisoned")
            .insert(key, outcome.tally);
        Ok(outcome)
    }

    /// Global tally over the non-excluded groups.
    pub fn total(&self, groups: &[GroupSnapshot], today: NaiveDate) -> Result<GroupTally> {
        let mut total = GroupTally::default();
        for group in groups {
            if self.is_excluded(&group.name) {
                continue;
            }
            let outcome = self.group_tally(group, today)?;
            total.add(&outcome.tally);
        }
        Ok(total)
    }

    fn compute_group(&self, group: &GroupSnapshot, today: NaiveDate) -> Result<TallyOutcome> {
        let threshold = self.threshold();
        let needs_meta = matches!(threshold, Some(cutoff) if cutoff != today);
        let mut out = TallyOutcome::default();

        for item in &group.items {
            let cached = match &item.id {
                Some(id) => self.store.get_cached(id)?,
                None => None,
            };
            let status = classifier::classify(item.id.as_ref(), &item.marker, cached.as_ref());

            out.tally.overall.total += 1;
            match status {
                ItemStatus::Solved => {
                    out.tally.overall.solved += 1;
                    let meta = cached
                        .map(|entry| entry.meta())
                        .unwrap_or_else(SubmissionMeta::unknown);
                    if classifier::is_visible(&meta, threshold, today) {
                        out.tally.filtered.solved += 1;
                    } else {
                        out.tally.filtered.unattended += 1;
                    }
                    if needs_meta && cached.is_none() {
                        if let Some(id) = &item.id {
                            out.unfiltered_solved.push(id.clone());
                        }
                    }
                }
                ItemStatus::WrongAttempted => {
                    out.tally.overall.wrong += 1;
                    out.tally.filtered.wrong += 1;
                }
                ItemStatus::Unattended => {
                    out.tally.overall.unattended += 1;
                    out.tally.filtered.unattended += 1;
                }
                ItemStatus::Pending => {
                    out.tally.overall.unattended += 1;
                    out.tally.filtered.unattended += 1;
                    if let Some(id) = &item.id {
                        out.pending.push(id.clone());
                    }
                }
            }
        }

        Ok(out)
    }
}
