use serde::Serialize;
use tracing::{debug, warn};

use crate::dialect::{CommandDialect, lookup};
use crate::join::{DiffRecord, DiffSet};
use crate::paths::{normalize, under_root};

/// One filesystem step. Variants are declared in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedAction {
    RemoveFile { dest: String },
    RemoveDirectory { dest: String },
    MakeDirectory { dest: String },
    CopyFile { source: String, dest: String },
    OverwriteFile { source: String, dest: String },
}

impl PlannedAction {
    pub fn render(&self, dialect: &dyn CommandDialect) -> String {
        match self {
            PlannedAction::RemoveFile { dest } => dialect.remove_file(dest),
            PlannedAction::RemoveDirectory { dest } => dialect.remove_directory(dest),
            PlannedAction::MakeDirectory { dest } => dialect.make_directory(dest),
            PlannedAction::CopyFile { source, dest } => dialect.copy_file(source, dest),
            PlannedAction::OverwriteFile { source, dest } => dialect.overwrite_file(source, dest),
        }
    }

    pub fn is_creation(&self) -> bool {
        matches!(
            self,
            PlannedAction::MakeDirectory { .. } | PlannedAction::CopyFile { .. }
        )
    }

    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            PlannedAction::RemoveFile { .. } | PlannedAction::RemoveDirectory { .. }
        )
    }

    pub fn is_overwrite(&self) -> bool {
        matches!(self, PlannedAction::OverwriteFile { .. })
    }

    fn rank(&self) -> u8 {
        match self {
            PlannedAction::RemoveFile { .. } => 0,
            PlannedAction::RemoveDirectory { .. } => 1,
            PlannedAction::MakeDirectory { .. } => 2,
            PlannedAction::CopyFile { .. } => 3,
            PlannedAction::OverwriteFile { .. } => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlanOptions {
    pub suppress_deletion: bool,
    pub overwrite_any_direction: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanCounts {
    pub files: usize,
    pub folders: usize,
    pub older: usize,
    pub newer: usize,
    pub creations: usize,
    pub deletions: usize,
    pub overwrites: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandPlan {
    pub dialect: Option<String>,
    pub actions: Vec<PlannedAction>,
    pub commands: Vec<String>,
    pub counts: PlanCounts,
}

impl CommandPlan {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn actions_for(record: &DiffRecord, set: &DiffSet, options: PlanOptions) -> Vec<PlannedAction> {
    let source = || normalize(&under_root(&set.home_root, &record.ending));
    let dest = || normalize(&under_root(&set.dest_root, &record.ending));
    let only_home = record.in_home && !record.in_dest;
    let only_dest = record.in_dest && !record.in_home;
    let mut actions = Vec::new();

    if record.is_dir && only_home {
        actions.push(PlannedAction::MakeDirectory { dest: dest() });
    }
    if record.is_file && only_home {
        actions.push(PlannedAction::CopyFile {
            source: source(),
            dest: dest(),
        });
    }
    if !options.suppress_deletion {
        if record.is_dir && only_dest {
            actions.push(PlannedAction::RemoveDirectory { dest: dest() });
        }
        if record.is_file && only_dest {
            actions.push(PlannedAction::RemoveFile { dest: dest() });
        }
    }
    let differs = if options.overwrite_any_direction {
        record.is_newer || record.is_older
    } else {
        record.is_newer
    };
    if record.is_file && record.in_home && record.in_dest && differs {
        actions.push(PlannedAction::OverwriteFile {
            source: source(),
            dest: dest(),
        });
    }
    actions
}

/// Turns diff and forced records into ordered commands for the dialect named by `tag`.
/// An unrecognized tag produces an empty plan.
pub fn plan(set: &DiffSet, tag: &str, options: PlanOptions) -> CommandPlan {
    let Some(dialect) = lookup(tag) else {
        warn!(dialect = tag, "unrecognized command dialect; no commands generated");
        return CommandPlan::default();
    };

    let mut actions: Vec<PlannedAction> = set
        .records
        .values()
        .flat_map(|record| actions_for(record, set, options))
        .collect();
    // Records iterate in ending order, so a stable sort by kind keeps parents first.
    actions.sort_by_key(PlannedAction::rank);

    let records = set.records.values();
    let counts = PlanCounts {
        files: records.clone().filter(|r| r.is_file).count(),
        folders: records.clone().filter(|r| r.is_dir).count(),
        older: records.clone().filter(|r| r.is_older).count(),
        newer: records.filter(|r| r.is_newer).count(),
        creations: actions.iter().filter(|a| a.is_creation()).count(),
        deletions: actions.iter().filter(|a| a.is_deletion()).count(),
        overwrites: actions.iter().filter(|a| a.is_overwrite()).count(),
    };
    let commands = actions.iter().map(|action| action.render(dialect)).collect();
    debug!(dialect = dialect.name(), ?counts, "planned commands");

    CommandPlan {
        dialect: Some(dialect.name().to_string()),
        actions,
        commands,
        counts,
    }
}
