use std::collections::BTreeMap;

use serde::Serialize;

use crate::details::{DetailSet, FileDetail};

/// One relative path as seen from both trees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffRecord {
    pub ending: String,
    pub in_home: bool,
    pub in_dest: bool,
    pub is_dir: bool,
    pub is_file: bool,
    /// Home copy modified strictly after the destination copy.
    pub is_newer: bool,
    /// Home copy modified strictly before the destination copy.
    pub is_older: bool,
}

impl DiffRecord {
    fn from_sides(ending: &str, home: Option<&FileDetail>, dest: Option<&FileDetail>) -> Self {
        let either =
            |flag: fn(&FileDetail) -> bool| home.is_some_and(flag) || dest.is_some_and(flag);
        let (is_newer, is_older) = match (
            home.and_then(|detail| detail.modified),
            dest.and_then(|detail| detail.modified),
        ) {
            (Some(home), Some(dest)) => (home > dest, home < dest),
            _ => (false, false),
        };
        Self {
            ending: ending.to_string(),
            in_home: home.is_some(),
            in_dest: dest.is_some(),
            is_dir: either(|detail| detail.is_dir),
            is_file: either(|detail| detail.is_file),
            is_newer,
            is_older,
        }
    }
}

/// Records keyed by ending, with the two roots they are relative to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSet {
    pub home_root: String,
    pub dest_root: String,
    pub records: BTreeMap<String, DiffRecord>,
}

impl DiffSet {
    pub fn new(home_root: impl Into<String>, dest_root: impl Into<String>) -> Self {
        Self {
            home_root: home_root.into(),
            dest_root: dest_root.into(),
            records: BTreeMap::new(),
        }
    }

    /// Adds records on top of the current ones; an incoming record replaces any existing
    /// record with the same ending.
    pub fn overlay(&mut self, records: impl IntoIterator<Item = DiffRecord>) {
        for record in records {
            self.records.insert(record.ending.clone(), record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Full outer join of both detail sets on ending.
pub fn join(home: &DetailSet, dest: &DetailSet) -> DiffSet {
    let mut joined = DiffSet::new(home.root.clone(), dest.root.clone());
    let endings = home
        .entries
        .keys()
        .chain(dest.entries.keys())
        .filter(|ending| !ending.is_empty());
    for ending in endings {
        if joined.records.contains_key(ending) {
            continue;
        }
        let record = DiffRecord::from_sides(
            ending,
            home.entries.get(ending),
            dest.entries.get(ending),
        );
        joined.records.insert(ending.clone(), record);
    }
    joined
}
