use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;

use anyhow::{Context, Result};
use tracing::debug;

use crate::join::DiffRecord;
use crate::paths::{ending_under, normalize, under_root};
use crate::scan::scan;

#[derive(Debug, Clone, Copy, Default)]
struct Presence {
    is_dir: bool,
    is_file: bool,
}

impl Presence {
    fn of(path: &str) -> Result<Self> {
        match fs::metadata(path) {
            Ok(metadata) => Ok(Self {
                is_dir: metadata.is_dir(),
                is_file: metadata.is_file(),
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err).with_context(|| format!("reading metadata for {path}")),
        }
    }

    fn exists(self) -> bool {
        self.is_dir || self.is_file
    }
}

/// Records for subtrees that always copy from home. Timestamps are not consulted: every
/// home file is marked newer, nothing is ever older.
pub fn resolve_forced(
    forced_paths: &[String],
    home_root: &str,
    dest_root: &str,
) -> Result<Vec<DiffRecord>> {
    let home_root = normalize(home_root);
    let dest_root = normalize(dest_root);

    let scan_endings: Vec<String> = forced_paths
        .iter()
        .filter_map(|path| ending_under(&normalize(path), &home_root).map(str::to_string))
        .collect();
    if scan_endings.is_empty() {
        return Ok(Vec::new());
    }

    let home_found = scan(scan_endings.iter().map(|ending| under_root(&home_root, ending)))?;
    let dest_found = scan(scan_endings.iter().map(|ending| under_root(&dest_root, ending)))?;
    let endings: BTreeSet<&str> = home_found
        .iter()
        .filter_map(|path| ending_under(path, &home_root))
        .chain(
            dest_found
                .iter()
                .filter_map(|path| ending_under(path, &dest_root)),
        )
        .filter(|ending| !ending.is_empty())
        .collect();

    let mut records = Vec::with_capacity(endings.len());
    for ending in endings {
        let home = Presence::of(&under_root(&home_root, ending))?;
        let dest = Presence::of(&under_root(&dest_root, ending))?;
        records.push(DiffRecord {
            ending: ending.to_string(),
            in_home: home.exists(),
            in_dest: dest.exists(),
            is_dir: home.is_dir,
            is_file: home.is_file,
            is_newer: home.is_file,
            is_older: false,
        });
    }
    debug!(
        forced = scan_endings.len(),
        records = records.len(),
        "resolved forced entries"
    );
    Ok(records)
}
