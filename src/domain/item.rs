use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Stored sentinel meaning "a lookup ran and found no submissions".
const EMPTY_SENTINEL: &str = "NONE";

/// Format used for timestamps persisted in the cache.
const STORED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Stable identifier for a trackable problem, parsed from its link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Extract the id from a problem link following the `{base}/{id}/` path
    /// convention. Returns `None` when the link has no usable path segment,
    /// in which case the item cannot be tracked.
    pub fn from_link(link: &str) -> Option<Self> {
        let url = url::Url::parse(link).ok()?;
        let id = url
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .next_back()?;
        Some(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-item flags observed directly on the tracking surface. These require
/// no network lookup to interpret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservedMarker {
    /// The item currently shows as solved.
    pub solved_now: bool,
    /// An unambiguous "attempted and failed" signal.
    pub wrong_immediate: bool,
}

/// Outcome of a submission lookup. `timestamp` is the most recent
/// submission's instant in judge-local time; `attempted` is true whenever a
/// submission exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionMeta {
    pub timestamp: Option<NaiveDateTime>,
    pub attempted: bool,
}

impl SubmissionMeta {
    /// No submission known: either never resolved or confirmed absent.
    pub fn unknown() -> Self {
        Self {
            timestamp: None,
            attempted: false,
        }
    }

    pub fn submitted(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp: Some(timestamp),
            attempted: true,
        }
    }
}

/// Cached lookup result for one item. Absence of an entry means the item was
/// never resolved; once written, an entry only changes through an explicit
/// invalidation (forced refresh or a version purge).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEntry {
    /// A submission exists; the most recent one landed at this local instant.
    Resolved(NaiveDateTime),
    /// A lookup ran and found no submissions at all.
    ConfirmedEmpty,
}

impl CacheEntry {
    pub fn to_stored(&self) -> String {
        match self {
            CacheEntry::Resolved(ts) => ts.format(STORED_FORMAT).to_string(),
            CacheEntry::ConfirmedEmpty => EMPTY_SENTINEL.to_string(),
        }
    }

    /// Parse a stored value. Unparseable values read back as `None`, so a
    /// corrupt row behaves like a cache miss and triggers a fresh lookup.
    pub fn from_stored(raw: &str) -> Option<Self> {
        if raw == EMPTY_SENTINEL {
            return Some(CacheEntry::ConfirmedEmpty);
        }
        NaiveDateTime::parse_from_str(raw, STORED_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
            .ok()
            .map(CacheEntry::Resolved)
    }

    pub fn meta(&self) -> SubmissionMeta {
        match self {
            CacheEntry::Resolved(ts) => SubmissionMeta::submitted(*ts),
            CacheEntry::ConfirmedEmpty => SubmissionMeta::unknown(),
        }
    }
}

/// Derived status of one item after merging the observed marker with the
/// cached lookup state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Solved,
    WrongAttempted,
    Unattended,
    /// Cannot be decided without a remote lookup.
    Pending,
}
