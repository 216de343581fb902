use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::paths::normalize;

/// Reads a one-path-per-line list. A missing file is an empty list.
pub fn read_list(path: &Path) -> Result<Vec<String>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "list file missing; treating as empty");
            return Ok(Vec::new());
        }
        Err(err) => return Err(err).with_context(|| format!("reading list {}", path.display())),
    };
    Ok(parse_list(&text))
}

fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(normalize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_list_is_empty() {
        let temp = tempdir().expect("temp dir");
        let list = read_list(&temp.path().join("to_include.txt")).expect("list");
        assert!(list.is_empty());
    }

    #[test]
    fn entries_are_normalized_and_blank_lines_dropped() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("to_exclude.txt");
        fs::write(&path, "/data/a/\r\n\nC:\\Users\\x\\\n   \n/data/b\n").expect("write");
        let list = read_list(&path).expect("list");
        assert_eq!(list, vec!["/data/a", "C:/Users/x", "/data/b"]);
    }
}
