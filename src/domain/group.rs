use crate::domain::{ItemId, ObservedMarker};

/// Snapshot of one roster group as observed by the marker source.
#[derive(Debug, Clone)]
pub struct GroupSnapshot {
    pub name: String,
    pub items: Vec<ItemSnapshot>,
}

/// One item as observed: its parsed id (if any) and the current marker.
#[derive(Debug, Clone)]
pub struct ItemSnapshot {
    pub id: Option<ItemId>,
    pub marker: ObservedMarker,
}

/// Normalize a display name for persistence: strip a trailing `[…]` badge
/// (the tally suffix appended to group titles) and lowercase the rest.
/// Exclusion state is keyed by this form so it survives reloads and
/// reordering of the live list.
pub fn normalize_group_name(name: &str) -> String {
    let mut base = name.trim();
    if base.ends_with(']') {
        if let Some(idx) = base.rfind('[') {
            base = base[..idx].trim_end();
        }
    }
    base.to_lowercase()
}
