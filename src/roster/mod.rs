//! Read side of the external tracking surface: the current groups with
//! their observed markers, plus change notification. The core never polls
//! the surface itself; it consumes snapshots and subscribes to changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Deserialize;

use crate::app::{Result, ScorelineError};
use crate::domain::{GroupSnapshot, ItemId, ItemSnapshot, ObservedMarker};

pub type MarkerCallback = Box<dyn Fn(&MarkerChange) + Send + Sync>;

/// Fired when an item's observed marker transitions.
#[derive(Debug, Clone)]
pub struct MarkerChange {
    pub group: String,
    pub id: Option<ItemId>,
    pub marker: ObservedMarker,
}

pub trait MarkerSource {
    fn list_groups(&self) -> Result<Vec<GroupSnapshot>>;
    fn subscribe(&self, callback: MarkerCallback);
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default, rename = "group")]
    groups: Vec<RosterGroup>,
}

#[derive(Debug, Deserialize)]
struct RosterGroup {
    name: String,
    #[serde(default, rename = "item")]
    items: Vec<RosterItem>,
}

#[derive(Debug, Deserialize)]
struct RosterItem {
    link: Option<String>,
    #[serde(default)]
    solved: bool,
    #[serde(default)]
    wrong: bool,
}

/// Roster file on disk: named groups of problem links with their locally
/// observed markers. `reload()` re-reads the file, diffs markers against the
/// previous snapshot, and notifies subscribers — the file-based equivalent
/// of watching the live list mutate.
pub struct TomlRoster {
    path: PathBuf,
    snapshot: Mutex<Vec<GroupSnapshot>>,
    callbacks: Mutex<Vec<MarkerCallback>>,
}

impl TomlRoster {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = Self::parse(&path)?;
        Ok(Self {
            path,
            snapshot: Mutex::new(snapshot),
            callbacks: Mutex::new(Vec::new()),
        })
    }

    fn parse(path: &Path) -> Result<Vec<GroupSnapshot>> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScorelineError::Roster(format!("cannot read {}: {}", path.display(), e))
        })?;
        let file: RosterFile = toml::from_str(&content).map_err(|e| {
            ScorelineError::Roster(format!("cannot parse {}: {}", path.display(), e))
        })?;

        Ok(file
            .groups
            .into_iter()
            .map(|group| GroupSnapshot {
                name: group.name,
                items: group
                    .items
                    .into_iter()
                    .map(|item| ItemSnapshot {
                        id: item.link.as_deref().and_then(ItemId::from_link),
                        marker: ObservedMarker {
                            solved_now: item.solved,
                            wrong_immediate: item.wrong,
                        },
                    })
                    .collect(),
            })
            .collect())
    }

    /// Re-read the roster and notify subscribers about every item whose
    /// marker changed (or that newly appeared with a non-default marker).
    pub fn reload(&self) -> Result<()> {
        let fresh = Self::parse(&self.path)?;

        let changes = {
            let mut snapshot = self.snapshot.lock().expect("snapshot lock poisoned");
            let previous = marker_index(&snapshot);
            let mut changes = Vec::new();
            for group in &fresh {
                for item in &group.items {
                    let Some(id) = &item.id else { continue };
                    let known = previous.get(&(group.name.clone(), id.clone()));
                    if known != Some(&item.marker) {
                        changes.push(MarkerChange {
                            group: group.name.clone(),
                            id: Some(id.clone()),
                            marker: item.marker,
                        });
                    }
                }
            }
            *snapshot = fresh;
            changes
        };

        let callbacks = self.callbacks.lock().expect("callback lock poisoned");
        for change in &changes {
            for callback in callbacks.iter() {
                callback(change);
            }
        }
        Ok(())
    }
}

fn marker_index(groups: &[GroupSnapshot]) -> HashMap<(String, ItemId), ObservedMarker> {
    let mut index = HashMap::new();
    for group in groups {
        for item in &group.items {
            if let Some(id) = &item.id {
                index.insert((group.name.clone(), id.clone()), item.marker);
            }
        }
    }
    index
}

impl MarkerSource for TomlRoster {
    fn list_groups(&self) -> Result<Vec<GroupSnapshot>> {
        Ok(self.snapshot.lock().expect("snapshot lock poisoned").clone())
    }

    fn subscribe(&self, callback: MarkerCallback) {
        self.callbacks
            .lock()
            .expect("callback lock poisoned")
            .push(callback);
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Fixed in-memory marker source for tests; `set_marker` mutates an item
    /// and fires the subscribed callbacks like a live surface would.
    pub struct StaticRoster {
        groups: Mutex<Vec<GroupSnapshot>>,
        callbacks: Mutex<Vec<MarkerCallback>>,
    }

    impl StaticRoster {
        pub fn new(groups: Vec<GroupSnapshot>) -> Self {
            Self {
                groups: Mutex::new(groups),
                callbacks: Mutex::new(Vec::new()),
            }
        }

        pub fn set_marker(&self, group: &str, id: &ItemId, marker: ObservedMarker) {
            {
                let mut groups = self.groups.lock().unwrap();
                for g in groups.iter_mut() {
                    if g.name != group {
                        continue;
                    }
                    for item in g.items.iter_mut() {
                        if item.id.as_ref() == Some(id) {
                            item.marker = marker;
                        }
                    }
                }
            }
            let change = MarkerChange {
                group: group.to_string(),
                id: Some(id.clone()),
                marker,
            };
            for callback in self.callbacks.lock().unwrap().iter() {
                callback(&change);
            }
        }
    }

    impl MarkerSource for StaticRoster {
        fn list_groups(&self) -> Result<Vec<GroupSnapshot>> {
            Ok(self.groups.lock().unwrap().clone())
        }

        fn subscribe(&self, callback: MarkerCallback) {
            self.callbacks.lock().unwrap().push(callback);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const ROSTER: &str = r#"
[[group]]
name = "Graph Theory"

[[group.item]]
link = "https://judge.example.com/problem/1068/"
solved = true

[[group.item]]
link = "https://judge.example.com/problem/2000/"
wrong = true

[[group]]
name = "DP"

[[group.item]]
link = "https://judge.example.com/problem/3000/"
"#;

    fn write_roster(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_roster() {
        let file = write_roster(ROSTER);
        let roster = TomlRoster::load(file.path()).unwrap();
        let groups = roster.list_groups().unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Graph Theory");
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[0].items[0].id, Some(ItemId::new("1068")));
        assert!(groups[0].items[0].marker.solved_now);
        assert!(groups[0].items[1].marker.wrong_immediate);
        assert_eq!(groups[1].items[0].marker, ObservedMarker::default());
    }

    #[test]
    fn test_item_without_link_has_no_id() {
        let file = write_roster(
            r#"
[[group]]
name = "G"

[[group.item]]
solved = true
"#,
        );
        let roster = TomlRoster::load(file.path()).unwrap();
        let groups = roster.list_groups().unwrap();
        assert_eq!(groups[0].items[0].id, None);
    }

    #[test]
    fn test_unreadable_roster_is_an_error() {
        assert!(TomlRoster::load("/nonexistent/roster.toml").is_err());
    }

    #[test]
    fn test_reload_fires_callbacks_on_marker_change() {
        let file = write_roster(ROSTER);
        let roster = TomlRoster::load(file.path()).unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let fired_in_cb = fired.clone();
        roster.subscribe(Box::new(move |change| {
            assert_eq!(change.group, "DP");
            assert_eq!(change.id, Some(ItemId::new("3000")));
            assert!(change.marker.solved_now);
            fired_in_cb.fetch_add(1, Ordering::SeqCst);
        }));

        // Same content: no change, no callback.
        roster.reload().unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        let updated = ROSTER.replace(
            "link = \"https://judge.example.com/problem/3000/\"",
            "link = \"https://judge.example.com/problem/3000/\"\nsolved = true",
        );
        std::fs::write(file.path(), updated).unwrap();
        roster.reload().unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
