use serde::Serialize;
use tracing::warn;

use crate::plan::CommandPlan;

const MASS_DELETION_WARNING: &str = "Commands will delete a large portion of files in destination. \
Make sure the home and destination directories are not mixed up.";
const DEST_NEWER_WARNING: &str = "There are more new files in destination than old files in source. \
Make sure the home and destination directories are not mixed up.";
const FIRST_RUN_NOTE: &str = "All contents of source will be copied to destination, meaning that this is \
the first time this program has been run and the destination directory does not yet exist. If that is \
not true, then cancel the program now.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SafetyReport {
    pub summary: Vec<String>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub warned: bool,
}

impl SafetyReport {
    /// Summary, notes, and the warning banner in display order.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.summary.clone();
        lines.push(String::new());
        if !self.notes.is_empty() {
            lines.push("Notes:".to_string());
            lines.extend(self.notes.iter().cloned());
            lines.push(String::new());
        }
        if self.warned {
            lines.push("WARNINGS FOUND. SEE OUTPUT MESSAGES.".to_string());
            lines.extend(self.warnings.iter().cloned());
            lines.push(String::new());
        }
        lines
    }
}

/// Flags plans that look like the home and destination roots were swapped.
pub fn check(plan: &CommandPlan) -> SafetyReport {
    let counts = &plan.counts;
    let mut report = SafetyReport {
        summary: vec![
            "Summary of commands:".to_string(),
            format!(
                "{} files and {} folders detected between home and destination.",
                counts.files, counts.folders
            ),
            format!(
                "{} newer files in home, {} newer files in destination.",
                counts.newer, counts.older
            ),
            format!("{} total commands.", plan.commands.len()),
            format!(
                "{} creations, {} deletions, {} overwrites.",
                counts.creations, counts.deletions, counts.overwrites
            ),
        ],
        ..SafetyReport::default()
    };

    let entries = counts.files + counts.folders;
    if entries > 0 && entries == counts.creations {
        report.notes.push(FIRST_RUN_NOTE.to_string());
    }
    if counts.files > 0 && counts.deletions as f64 / counts.files as f64 > 0.5 {
        report.warnings.push(MASS_DELETION_WARNING.to_string());
    }
    if counts.older > counts.newer {
        report.warnings.push(DEST_NEWER_WARNING.to_string());
    }
    for message in &report.warnings {
        warn!("{message}");
    }
    report.warned = !report.warnings.is_empty();
    report
}
