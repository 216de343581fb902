use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::candidates::{locate, resolve};
use crate::config::DEFAULT_SIZE_LIMIT;
use crate::details::{EntryFilter, build_details};
use crate::dialect;
use crate::forced::resolve_forced;
use crate::join::{DiffSet, join};
use crate::paths::normalize;
use crate::plan::{CommandPlan, PlanOptions, plan};
use crate::safety::{SafetyReport, check};
use crate::scan::scan;

/// Everything one planning run needs. Built once, then read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub home_root: String,
    pub dest_root: String,
    /// Roots scanned on the home side; empty means the whole home root.
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub force: Vec<String>,
    pub size_limit: Option<u64>,
    pub keep_hidden: bool,
    pub suppress_deletion: bool,
    pub overwrite_any_direction: bool,
    pub dialect: String,
}

impl SyncConfig {
    pub fn new(home_root: &str, dest_root: &str) -> Self {
        Self {
            home_root: normalize(home_root),
            dest_root: normalize(dest_root),
            include: Vec::new(),
            exclude: Vec::new(),
            force: Vec::new(),
            size_limit: Some(DEFAULT_SIZE_LIMIT),
            keep_hidden: true,
            suppress_deletion: false,
            overwrite_any_direction: false,
            dialect: dialect::host_default().to_string(),
        }
    }

    fn include_roots(&self) -> Vec<String> {
        if self.include.is_empty() {
            vec![self.home_root.clone()]
        } else {
            self.include.clone()
        }
    }

    fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            suppress_deletion: self.suppress_deletion,
            overwrite_any_direction: self.overwrite_any_direction,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    #[serde(skip)]
    pub diff: DiffSet,
    pub plan: CommandPlan,
    pub report: SafetyReport,
}

/// Scans both trees, reconciles them, and produces the command plan with its safety report.
pub fn build_plan(config: &SyncConfig) -> Result<PlanOutcome> {
    let home_root = normalize(&config.home_root);
    let dest_root = normalize(&config.dest_root);

    let mut observed = scan(config.include_roots())?;
    observed.extend(scan([dest_root.as_str()])?);

    let skip: Vec<String> = config
        .exclude
        .iter()
        .chain(config.force.iter())
        .cloned()
        .collect();
    let endings = resolve(&observed, &home_root, &dest_root, &skip);
    let located = locate(&endings, &home_root, &dest_root)?;

    let filter = EntryFilter::new(config.size_limit, config.keep_hidden)?;
    let home_details = build_details(&located.home, &home_root, &filter)?;
    let dest_details = build_details(&located.dest, &dest_root, &filter)?;

    let mut diff = join(&home_details, &dest_details);
    diff.overlay(resolve_forced(&config.force, &home_root, &dest_root)?);

    let plan = plan(&diff, &config.dialect, config.plan_options());
    let report = check(&plan);
    info!(
        home = %home_root,
        destination = %dest_root,
        records = diff.len(),
        commands = plan.commands.len(),
        warned = report.warned,
        "plan built"
    );
    Ok(PlanOutcome { diff, plan, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{PlanCounts, PlannedAction};
    use std::fs::{self, File};
    use std::path::Path;
    use std::time::{Duration, SystemTime};
    use tempfile::{TempDir, tempdir};

    struct Trees {
        _temp: TempDir,
        home: String,
        dest: String,
    }

    fn trees() -> Trees {
        let temp = tempdir().expect("temp dir");
        let home = temp.path().join("home");
        let dest = temp.path().join("dest");
        fs::create_dir_all(&home).expect("home");
        fs::create_dir_all(&dest).expect("dest");
        Trees {
            home: normalize(&home.to_string_lossy()),
            dest: normalize(&dest.to_string_lossy()),
            _temp: temp,
        }
    }

    fn write_at(path: &str, secs: u64) {
        let path = Path::new(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent");
        }
        fs::write(path, "data").expect("write");
        let file = File::options().write(true).open(path).expect("open");
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .expect("mtime");
    }

    fn bash_config(trees: &Trees) -> SyncConfig {
        SyncConfig {
            dialect: "bash".to_string(),
            ..SyncConfig::new(&trees.home, &trees.dest)
        }
    }

    /// Carries out a plan with plain filesystem calls, standing in for the shell.
    fn apply(actions: &[PlannedAction]) {
        for action in actions {
            match action {
                PlannedAction::RemoveFile { dest } => fs::remove_file(dest).expect("rm"),
                PlannedAction::RemoveDirectory { dest } => {
                    if Path::new(dest).exists() {
                        fs::remove_dir_all(dest).expect("rmdir");
                    }
                }
                PlannedAction::MakeDirectory { dest } => fs::create_dir_all(dest).expect("mkdir"),
                PlannedAction::CopyFile { source, dest }
                | PlannedAction::OverwriteFile { source, dest } => {
                    fs::copy(source, dest).expect("copy");
                }
            }
        }
    }

    #[test]
    fn first_run_creates_everything() {
        let trees = trees();
        write_at(&format!("{}/a/f1", trees.home), 2_000);

        let outcome = build_plan(&bash_config(&trees)).expect("plan");
        assert_eq!(
            outcome.plan.actions,
            vec![
                PlannedAction::MakeDirectory {
                    dest: format!("{}/a", trees.dest)
                },
                PlannedAction::CopyFile {
                    source: format!("{}/a/f1", trees.home),
                    dest: format!("{}/a/f1", trees.dest),
                },
            ]
        );
        assert_eq!(outcome.plan.counts.creations, 2);
        assert_eq!(outcome.plan.counts.deletions, 0);
        assert!(!outcome.report.warned);
        assert_eq!(outcome.report.notes.len(), 1);
    }

    #[test]
    fn older_home_file_overwrites_only_in_any_direction_mode() {
        let trees = trees();
        write_at(&format!("{}/a/f1", trees.home), 1_000);
        write_at(&format!("{}/a/f1", trees.dest), 5_000);

        let outcome = build_plan(&bash_config(&trees)).expect("plan");
        assert!(!outcome.plan.actions.iter().any(PlannedAction::is_overwrite));
        assert!(outcome.diff.records["/a/f1"].is_older);
        assert!(outcome.report.warned);

        let any = SyncConfig {
            overwrite_any_direction: true,
            ..bash_config(&trees)
        };
        let outcome = build_plan(&any).expect("plan");
        assert_eq!(
            outcome.plan.commands,
            vec![format!(
                "cp -Rf '{home}/a/f1' '{dest}/a/f1'",
                home = trees.home,
                dest = trees.dest
            )]
        );
    }

    #[test]
    fn destination_only_files_are_removed_unless_suppressed() {
        let trees = trees();
        write_at(&format!("{}/keep", trees.home), 1_000);
        write_at(&format!("{}/keep", trees.dest), 1_000);
        write_at(&format!("{}/b/f2", trees.dest), 1_000);

        let outcome = build_plan(&bash_config(&trees)).expect("plan");
        assert!(outcome.plan.actions.contains(&PlannedAction::RemoveFile {
            dest: format!("{}/b/f2", trees.dest)
        }));
        assert!(outcome.plan.actions.contains(&PlannedAction::RemoveDirectory {
            dest: format!("{}/b", trees.dest)
        }));

        let keep = SyncConfig {
            suppress_deletion: true,
            ..bash_config(&trees)
        };
        let outcome = build_plan(&keep).expect("plan");
        assert!(outcome.plan.is_empty());
        assert_eq!(outcome.plan.counts.deletions, 0);
    }

    #[test]
    fn forced_subtree_copies_then_only_overwrites() {
        let trees = trees();
        write_at(&format!("{}/c/f", trees.home), 1_000);
        let config = SyncConfig {
            force: vec![format!("{}/c", trees.home)],
            ..bash_config(&trees)
        };

        let first = build_plan(&config).expect("plan");
        assert_eq!(
            first.plan.actions,
            vec![
                PlannedAction::MakeDirectory {
                    dest: format!("{}/c", trees.dest)
                },
                PlannedAction::CopyFile {
                    source: format!("{}/c/f", trees.home),
                    dest: format!("{}/c/f", trees.dest),
                },
            ]
        );
        apply(&first.plan.actions);

        // Make the destination copy newer; forced entries ignore that.
        write_at(&format!("{}/c/f", trees.dest), 9_000);
        let second = build_plan(&config).expect("plan");
        assert_eq!(second.plan.counts.creations, 0);
        assert_eq!(
            second.plan.actions,
            vec![PlannedAction::OverwriteFile {
                source: format!("{}/c/f", trees.home),
                dest: format!("{}/c/f", trees.dest),
            }]
        );
    }

    #[test]
    fn excluded_and_hidden_entries_stay_out_of_the_plan() {
        let trees = trees();
        write_at(&format!("{}/docs/a.txt", trees.home), 1_000);
        write_at(&format!("{}/cache/blob", trees.home), 1_000);
        write_at(&format!("{}/.secret/key", trees.home), 1_000);
        write_at(&format!("{}/docs/~draft.txt", trees.home), 1_000);
        let config = SyncConfig {
            exclude: vec![format!("{}/cache", trees.home)],
            keep_hidden: false,
            ..bash_config(&trees)
        };

        let outcome = build_plan(&config).expect("plan");
        let endings: Vec<&str> = outcome.diff.records.keys().map(String::as_str).collect();
        assert_eq!(endings, vec!["/docs", "/docs/a.txt"]);
    }

    #[test]
    fn synced_trees_produce_no_commands() {
        let trees = trees();
        write_at(&format!("{}/a/f1", trees.home), 1_000);
        let config = bash_config(&trees);
        apply(&build_plan(&config).expect("plan").plan.actions);
        write_at(&format!("{}/a/f1", trees.dest), 1_000);

        let outcome = build_plan(&config).expect("plan");
        assert!(outcome.plan.is_empty());
        assert_eq!(outcome.plan.counts.files, 1);
        assert_eq!(outcome.plan.counts.folders, 1);
    }

    #[test]
    fn unknown_dialect_plans_nothing() {
        let trees = trees();
        write_at(&format!("{}/a/f1", trees.home), 1_000);
        let config = SyncConfig {
            dialect: "zsh-but-weird".to_string(),
            ..bash_config(&trees)
        };
        let outcome = build_plan(&config).expect("plan");
        assert!(outcome.plan.is_empty());
        assert_eq!(outcome.plan.counts, PlanCounts::default());
        assert!(outcome.report.notes.is_empty());
    }
}
