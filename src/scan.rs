use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::WalkDir;

use crate::paths::normalize;

/// Sorted, deduplicated absolute paths (files and directories) found under a set of roots.
pub type ScanResult = BTreeSet<String>;

/// Walks every root recursively. Roots that do not exist contribute nothing; a root that
/// exists is listed itself alongside its contents.
pub fn scan<I, S>(roots: I) -> Result<ScanResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut found = ScanResult::new();
    for root in roots {
        let root = normalize(root.as_ref());
        walk_root(&root, &mut found).with_context(|| format!("scanning {root}"))?;
    }
    Ok(found)
}

fn walk_root(root: &str, acc: &mut ScanResult) -> Result<()> {
    // An empty normalized root is the filesystem root `/`.
    let start = if root.is_empty() { "/" } else { root };
    let present = Path::new(start)
        .try_exists()
        .with_context(|| format!("checking scan root {start}"))?;
    if !present {
        debug!(root, "scan root missing; skipping");
        return Ok(());
    }

    let before = acc.len();
    for entry in WalkDir::new(start).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.io_error().map(|io| io.kind()) == Some(ErrorKind::NotFound) => {
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        acc.insert(normalize(&entry.path().to_string_lossy()));
    }
    debug!(root, added = acc.len() - before, "scanned root");
    Ok(())
}
