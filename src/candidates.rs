use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::paths::{ending_under, normalize, under_root};
use crate::scan::ScanResult;

/// Reduces skip entries to home-relative endings; entries outside home are kept verbatim.
pub fn skip_endings(skip: &[String], home_root: &str) -> Vec<String> {
    skip.iter()
        .map(|item| {
            let item = normalize(item);
            ending_under(&item, home_root)
                .map(str::to_string)
                .unwrap_or(item)
        })
        .collect()
}

/// Maps every observed absolute path to its root-relative ending, regardless of which tree
/// it was seen in, and drops anything under a skipped ending.
pub fn resolve(
    observed: &ScanResult,
    home_root: &str,
    dest_root: &str,
    skip: &[String],
) -> Vec<String> {
    let home_root = normalize(home_root);
    let dest_root = normalize(dest_root);
    let skipped = skip_endings(skip, &home_root);

    let mut endings = BTreeSet::new();
    for path in observed {
        let ending = match (
            ending_under(path, &home_root),
            ending_under(path, &dest_root),
        ) {
            // Nested roots: the longer root is the one the path really lives in.
            (Some(home), Some(dest)) => match home_root.len().cmp(&dest_root.len()) {
                std::cmp::Ordering::Greater => home,
                std::cmp::Ordering::Less => dest,
                std::cmp::Ordering::Equal => continue,
            },
            (Some(home), None) => home,
            (None, Some(dest)) => dest,
            (None, None) => continue,
        };
        if ending.is_empty() {
            continue;
        }
        if skipped.iter().any(|skip| ending.starts_with(skip.as_str())) {
            continue;
        }
        endings.insert(ending.to_string());
    }

    debug!(
        observed = observed.len(),
        candidates = endings.len(),
        "resolved candidate endings"
    );
    endings.into_iter().collect()
}

/// Candidate endings rendered under each root, keeping only the ones present on that side.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Located {
    pub home: Vec<String>,
    pub dest: Vec<String>,
}

pub fn locate(endings: &[String], home_root: &str, dest_root: &str) -> Result<Located> {
    let mut located = Located::default();
    for ending in endings {
        let home = under_root(home_root, ending);
        if exists(&home)? {
            located.home.push(home);
        }
        let dest = under_root(dest_root, ending);
        if exists(&dest)? {
            located.dest.push(dest);
        }
    }
    Ok(located)
}

fn exists(path: &str) -> Result<bool> {
    Path::new(path)
        .try_exists()
        .with_context(|| format!("checking {path}"))
}
