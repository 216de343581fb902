use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::time::SystemTime;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use tracing::debug;

use crate::paths::{ending_under, normalize};

/// Live metadata for one path under a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDetail {
    pub full: String,
    pub ending: String,
    pub is_dir: bool,
    pub is_file: bool,
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

impl FileDetail {
    fn root_anchor(root: &str) -> Self {
        Self {
            full: root.to_string(),
            ending: String::new(),
            is_dir: true,
            is_file: false,
            size: None,
            modified: None,
        }
    }

    fn stat(full: String, ending: String) -> Result<Self> {
        let metadata = match fs::metadata(&full) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(Self {
                    full,
                    ending,
                    is_dir: false,
                    is_file: false,
                    size: None,
                    modified: None,
                });
            }
            Err(err) => return Err(err).with_context(|| format!("reading metadata for {full}")),
        };

        let is_file = metadata.is_file();
        let modified = if is_file {
            Some(
                metadata
                    .modified()
                    .with_context(|| format!("reading modification time for {full}"))?,
            )
        } else {
            None
        };
        Ok(Self {
            is_dir: metadata.is_dir(),
            is_file,
            size: is_file.then(|| metadata.len()),
            modified,
            full,
            ending,
        })
    }

    fn vanished(&self) -> bool {
        !self.is_dir && !self.is_file
    }
}

/// Details for one root keyed by ending. Holds the `""` anchor row when nothing was found.
#[derive(Debug, Clone)]
pub struct DetailSet {
    pub root: String,
    pub entries: BTreeMap<String, FileDetail>,
}

pub struct EntryFilter {
    size_limit: Option<u64>,
    keep_hidden: bool,
    hidden: Regex,
    temporary: Regex,
}

impl EntryFilter {
    pub fn new(size_limit: Option<u64>, keep_hidden: bool) -> Result<Self> {
        Ok(Self {
            size_limit,
            keep_hidden,
            hidden: segment_pattern(r"\.")?,
            temporary: segment_pattern("~")?,
        })
    }

    fn keeps(&self, detail: &FileDetail) -> bool {
        if detail.ending.trim_matches([' ', '/', '\\', '.']).is_empty() || detail.vanished() {
            return false;
        }
        if self.temporary.is_match(&detail.ending) {
            return false;
        }
        if !self.keep_hidden && self.hidden.is_match(&detail.ending) {
            return false;
        }
        match (self.size_limit, detail.size) {
            (Some(limit), Some(size)) if detail.is_file => size <= limit,
            _ => true,
        }
    }
}

fn segment_pattern(prefix: &str) -> Result<Regex> {
    Regex::new(&format!("(^|/){prefix}"))
        .map_err(|err| anyhow!("invalid segment pattern '{prefix}': {err}"))
}

pub fn build_details(paths: &[String], root: &str, filter: &EntryFilter) -> Result<DetailSet> {
    let root = normalize(root);
    let mut under: Vec<(String, String)> = paths
        .iter()
        .map(|path| normalize(path))
        .filter_map(|full| {
            let ending = ending_under(&full, &root)?.to_string();
            Some((full, ending))
        })
        .collect();
    under.sort();
    under.dedup();

    let mut entries = BTreeMap::new();
    if under.is_empty() {
        entries.insert(String::new(), FileDetail::root_anchor(&root));
        return Ok(DetailSet { root, entries });
    }

    let total = under.len();
    for (full, ending) in under {
        let detail = FileDetail::stat(full, ending)?;
        if detail.vanished() {
            debug!(path = %detail.full, "entry vanished before stat");
        }
        if filter.keeps(&detail) {
            entries.insert(detail.ending.clone(), detail);
        }
    }
    debug!(root = %root, total, kept = entries.len(), "built entry details");
    Ok(DetailSet { root, entries })
}
