//! Pure status derivation: merging observed markers with cached lookup
//! state, and deciding visibility under the solved-before cutoff.

use chrono::{NaiveDate, NaiveTime};

use crate::domain::{CacheEntry, ItemId, ItemStatus, ObservedMarker, SubmissionMeta};

/// Merge the observed marker with the cached lookup result.
///
/// Precedence is fixed: an untrackable item is unattended no matter what,
/// live marker signals beat cached state, cached state beats absence. A
/// stale cache row claiming a submission therefore still wins over "no
/// information", while a live marker always wins over the cache.
///
/// `cached` must come from a cache peek only; this function performs no I/O.
pub fn classify(
    id: Option<&ItemId>,
    marker: &ObservedMarker,
    cached: Option<&CacheEntry>,
) -> ItemStatus {
    if id.is_none() {
        return ItemStatus::Unattended;
    }
    if marker.solved_now {
        return ItemStatus::Solved;
    }
    if marker.wrong_immediate {
        return ItemStatus::WrongAttempted;
    }
    match cached {
        Some(CacheEntry::ConfirmedEmpty) => ItemStatus::Unattended,
        Some(CacheEntry::Resolved(_)) => ItemStatus::WrongAttempted,
        None => ItemStatus::Pending,
    }
}

/// Whether a solved item still shows as solved under the cutoff.
///
/// A threshold set to the current day hides nothing, so items solved earlier
/// today never vanish the moment the list refreshes. Otherwise an item hides
/// exactly when its last submission is known and strictly precedes the
/// cutoff midnight.
pub fn is_visible(meta: &SubmissionMeta, threshold: Option<NaiveDate>, today: NaiveDate) -> bool {
    let Some(cutoff) = threshold else {
        return true;
    };
    if cutoff == today {
        return true;
    }
    match meta.timestamp {
        None => true,
        Some(ts) => ts >= cutoff.and_time(NaiveTime::MIN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn id() -> ItemId {
        ItemId::new("1068")
    }

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_untrackable_item_is_unattended() {
        let marker = ObservedMarker {
            solved_now: true,
            wrong_immediate: false,
        };
        assert_eq!(classify(None, &marker, None), ItemStatus::Unattended);
    }

    #[test]
    fn test_solved_marker_wins_over_cache() {
        let marker = ObservedMarker {
            solved_now: true,
            wrong_immediate: false,
        };
        let cached = CacheEntry::Resolved(ts("2024-05-17 19:23:01"));
        assert_eq!(
            classify(Some(&id()), &marker, Some(&cached)),
            ItemStatus::Solved
        );
    }

    #[test]
    fn test_wrong_immediate_without_cache_is_never_pending() {
        let marker = ObservedMarker {
            solved_now: false,
            wrong_immediate: true,
        };
        assert_eq!(
            classify(Some(&id()), &marker, None),
            ItemStatus::WrongAttempted
        );
    }

    #[test]
    fn test_confirmed_empty_is_unattended() {
        let marker = ObservedMarker::default();
        assert_eq!(
            classify(Some(&id()), &marker, Some(&CacheEntry::ConfirmedEmpty)),
            ItemStatus::Unattended
        );
    }

    #[test]
    fn test_cached_timestamp_means_wrong_attempted() {
        let marker = ObservedMarker::default();
        let cached = CacheEntry::Resolved(ts("2024-05-17 19:23:01"));
        assert_eq!(
            classify(Some(&id()), &marker, Some(&cached)),
            ItemStatus::WrongAttempted
        );
    }

    #[test]
    fn test_no_signals_is_pending() {
        let marker = ObservedMarker::default();
        assert_eq!(classify(Some(&id()), &marker, None), ItemStatus::Pending);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let marker = ObservedMarker::default();
        let cached = CacheEntry::Resolved(ts("2024-05-17 19:23:01"));
        let first = classify(Some(&id()), &marker, Some(&cached));
        let second = classify(Some(&id()), &marker, Some(&cached));
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_threshold_everything_visible() {
        let meta = SubmissionMeta::submitted(ts("2000-01-01 00:00:00"));
        assert!(is_visible(&meta, None, date("2024-06-02")));
    }

    #[test]
    fn test_today_threshold_hides_nothing() {
        let today = date("2024-06-02");
        let meta = SubmissionMeta::submitted(ts("2024-06-01 09:00:00"));
        assert!(is_visible(&meta, Some(today), today));
    }

    #[test]
    fn test_earlier_submission_is_hidden() {
        let meta = SubmissionMeta::submitted(ts("2024-05-17 19:23:01"));
        assert!(!is_visible(
            &meta,
            Some(date("2024-06-01")),
            date("2024-06-15")
        ));
    }

    #[test]
    fn test_later_submission_stays_visible() {
        let meta = SubmissionMeta::submitted(ts("2024-06-02 00:00:00"));
        assert!(is_visible(
            &meta,
            Some(date("2024-06-01")),
            date("2024-06-15")
        ));
    }

    #[test]
    fn test_unknown_timestamp_stays_visible() {
        let meta = SubmissionMeta::unknown();
        assert!(is_visible(
            &meta,
            Some(date("2024-06-01")),
            date("2024-06-15")
        ));
    }
}
