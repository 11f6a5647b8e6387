//! Engine tying the roster, resolver, aggregator, and the two lookup
//! queues together. Lookups for threshold filtering and for classification
//! run on independent queues with independent concurrency limits; both
//! write through the same cache, so either side benefits from the other's
//! results. Updates are eventually consistent: a refresh settles every
//! scheduled lookup before recounting.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::aggregate::{Aggregator, GroupTally};
use crate::app::Result;
use crate::domain::{GroupSnapshot, ItemId};
use crate::fetcher::scheduler::{BACKGROUND_WORKERS, FILTER_WORKERS};
use crate::fetcher::FetchScheduler;
use crate::resolver::SubmissionResolver;
use crate::roster::{MarkerChange, MarkerSource};

/// One group's row in a status report.
#[derive(Debug, Clone)]
pub struct GroupReport {
    pub name: String,
    pub excluded: bool,
    pub tally: GroupTally,
}

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub groups: Vec<GroupReport>,
    pub total: GroupTally,
    /// Items still awaiting a remote lookup after this pass.
    pub pending: usize,
}

pub struct Tracker {
    roster: Arc<dyn MarkerSource + Send + Sync>,
    resolver: Arc<SubmissionResolver>,
    aggregator: Arc<Aggregator>,
    filter_queue: FetchScheduler,
    background_queue: FetchScheduler,
}

impl Tracker {
    pub fn new(
        roster: Arc<dyn MarkerSource + Send + Sync>,
        resolver: Arc<SubmissionResolver>,
        aggregator: Arc<Aggregator>,
    ) -> Self {
        Self::with_workers(roster, resolver, aggregator, FILTER_WORKERS, BACKGROUND_WORKERS)
    }

    pub fn with_workers(
        roster: Arc<dyn MarkerSource + Send + Sync>,
        resolver: Arc<SubmissionResolver>,
        aggregator: Arc<Aggregator>,
        filter_workers: usize,
        background_workers: usize,
    ) -> Self {
        Self {
            roster,
            resolver,
            aggregator,
            filter_queue: FetchScheduler::new(filter_workers),
            background_queue: FetchScheduler::new(background_workers),
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// An item's observed marker transitioned: the containing group's tally
    /// is stale. The next refresh recounts it.
    pub fn note_marker_change(&self, change: &MarkerChange) {
        tracing::debug!("marker changed in {}: {:?}", change.group, change.id);
        self.aggregator.invalidate_group(&change.group);
    }

    /// Force-refresh one item's cached lookup. Every group tally may
    /// reference the item, so all of them are recounted on next access.
    pub async fn force_refresh(&self, id: &ItemId) -> Result<()> {
        self.resolver.force_refresh(id).await?;
        self.aggregator.invalidate_all();
        Ok(())
    }

    /// Run a full pass: tally every group, schedule the lookups each tally
    /// still needs (submission times for threshold filtering, classification
    /// for unknown items), wait for the queues to settle, and recount.
    ///
    /// With `fetch` false the pass is cache-only and unresolved items simply
    /// stay in the pending count.
    pub async fn refresh(&self, today: NaiveDate, fetch: bool) -> Result<StatusReport> {
        let groups = self.roster.list_groups()?;

        if fetch {
            let mut touched = HashSet::new();
            for group in &groups {
                let outcome = self.aggregator.group_tally(group, today)?;
                for id in outcome.unfiltered_solved {
                    self.schedule(&self.filter_queue, id);
                    touched.insert(group.name.clone());
                }
                for id in outcome.pending {
                    self.schedule(&self.background_queue, id);
                    touched.insert(group.name.clone());
                }
            }

            if !touched.is_empty() {
                self.filter_queue.drain().await;
                self.background_queue.drain().await;
                for name in &touched {
                    self.aggregator.invalidate_group(name);
                }
            }
        }

        let mut reports = Vec::with_capacity(groups.len());
        let mut pending = 0;
        for group in &groups {
            let outcome = self.aggregator.group_tally(group, today)?;
            pending += outcome.pending.len();
            reports.push(GroupReport {
                name: group.name.clone(),
                excluded: self.aggregator.is_excluded(&group.name),
                tally: outcome.tally,
            });
        }
        let total = self.aggregator.total(&groups, today)?;

        Ok(StatusReport {
            groups: reports,
            total,
            pending,
        })
    }

    pub fn list_groups(&self) -> Result<Vec<GroupSnapshot>> {
        self.roster.list_groups()
    }

    fn schedule(&self, queue: &FetchScheduler, id: ItemId) {
        let resolver = self.resolver.clone();
        queue.push(async move { resolver.resolve(&id).await.map(|_| ()) });
    }
}
