use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use tracing::warn;

mod candidates;
mod config;
mod details;
mod dialect;
mod forced;
mod join;
mod lists;
mod logging;
mod paths;
mod pipeline;
mod plan;
mod safety;
mod scan;
mod script;
use config::{ListFiles, RunOptions, SettingsFile, load_settings};
use lists::read_list;
use pipeline::{PlanOutcome, SyncConfig, build_plan};
use script::{CHECK_SCRIPT_STEM, RUN_SCRIPT_STEM, ScriptJob, ScriptOutcome, run_script};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init()?;
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Plan(cmd) => handle_plan(cmd)?,
        Command::Run(cmd) => handle_run(cmd)?,
    }

    Ok(())
}

fn handle_plan(cmd: PlanCommand) -> Result<()> {
    let (config, _) = resolve_config(&cmd.common)?;
    let outcome = build_plan(&config)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    print_run_summary(&config, &cmd.common);
    if outcome.diff.is_empty() {
        println!("nothing found under either root");
    } else {
        println!("{} entries compared", outcome.diff.len());
    }
    print_commands(&outcome);
    print_report(&outcome);
    Ok(())
}

fn handle_run(cmd: RunCommand) -> Result<()> {
    let (config, settings) = resolve_config(&cmd.common)?;
    let options = run_options(&cmd, &settings);
    print_run_summary(&config, &cmd.common);

    let outcome = build_plan(&config)?;
    print_report(&outcome);

    let Some(dialect) = dialect::lookup(&config.dialect) else {
        println!("No commands were run.");
        return Ok(());
    };
    let script_dir = env::current_dir().context("resolving working directory")?;

    if options.stop_if_warned && outcome.report.warned {
        println!("Halting commands and saving execution script for review as {CHECK_SCRIPT_STEM}.");
        run_script(&ScriptJob {
            dir: &script_dir,
            stem: CHECK_SCRIPT_STEM,
            commands: &outcome.plan.commands,
            dialect,
            pause: false,
            execute: false,
            keep: true,
        })?;
        return Ok(());
    }

    let result = run_script(&ScriptJob {
        dir: &script_dir,
        stem: RUN_SCRIPT_STEM,
        commands: &outcome.plan.commands,
        dialect,
        pause: options.pause_for_confirmation,
        execute: !options.script_only,
        keep: options.script_only || options.keep_script,
    })?;

    match &result {
        ScriptOutcome::Written(path) => println!("script saved to {}", path.display()),
        ScriptOutcome::Declined => println!("stopping after user request."),
        ScriptOutcome::Executed | ScriptOutcome::Empty => {}
    }
    let lines = outcome.report.lines();
    if let Some(log) = record_run(&result, Path::new(&config.dest_root), &lines)? {
        println!("run log written to {}", log.display());
    }
    Ok(())
}

/// Stamps the destination after a completed run, including one that found nothing to do.
fn record_run(
    result: &ScriptOutcome,
    dest_root: &Path,
    lines: &[String],
) -> Result<Option<PathBuf>> {
    match result {
        ScriptOutcome::Executed | ScriptOutcome::Empty => {}
        ScriptOutcome::Written(_) | ScriptOutcome::Declined => return Ok(None),
    }
    if !dest_root.is_dir() {
        warn!(destination = %dest_root.display(), "destination missing; no run log written");
        return Ok(None);
    }
    logging::write_run_log(dest_root, lines).map(Some)
}

fn resolve_config(common: &CommonArgs) -> Result<(SyncConfig, SettingsFile)> {
    let settings = match &common.config {
        Some(path) => load_settings(path)?,
        None => SettingsFile::default(),
    };

    let Some(home) = common.home.clone().or_else(|| settings.home.clone()) else {
        bail!("no home directory given; pass HOME or set `home` in --config");
    };
    let Some(destination) = common
        .destination
        .clone()
        .or_else(|| settings.destination.clone())
    else {
        bail!("no destination directory given; pass DEST or set `destination` in --config");
    };

    let lists = merge_list_files(common, &settings);
    let mut config = SyncConfig::new(&home, &destination);
    config.include = read_list(&lists.include)?;
    config.exclude = read_list(&lists.exclude)?;
    config.force = read_list(&lists.force)?;

    if let Some(limit) = settings.size_limit {
        config.size_limit = Some(limit);
    }
    if settings.no_size_limit.unwrap_or(false) {
        config.size_limit = None;
    }
    if let Some(limit) = common.size_limit {
        config.size_limit = Some(limit);
    }
    if common.no_size_limit {
        config.size_limit = None;
    }

    config.keep_hidden = settings.keep_hidden.unwrap_or(true) && !common.skip_hidden;
    config.suppress_deletion = settings.suppress_deletion.unwrap_or(false) || common.no_delete;
    config.overwrite_any_direction =
        settings.overwrite_any_direction.unwrap_or(false) || common.overwrite_any;
    if let Some(tag) = common.dialect.clone().or_else(|| settings.dialect.clone()) {
        config.dialect = tag;
    }
    if dialect::lookup(&config.dialect).is_none() {
        warn!(
            dialect = %config.dialect,
            "unknown dialect; the plan will contain no commands"
        );
    }

    Ok((config, settings))
}

fn merge_list_files(common: &CommonArgs, settings: &SettingsFile) -> ListFiles {
    let mut lists = ListFiles::default();
    if let Some(path) = common.include_file.clone().or_else(|| settings.include_file.clone()) {
        lists.include = path;
    }
    if let Some(path) = common.exclude_file.clone().or_else(|| settings.exclude_file.clone()) {
        lists.exclude = path;
    }
    if let Some(path) = common.force_file.clone().or_else(|| settings.force_file.clone()) {
        lists.force = path;
    }
    lists
}

fn run_options(cmd: &RunCommand, settings: &SettingsFile) -> RunOptions {
    let mut options = RunOptions::default().merge(settings);
    if cmd.no_pause {
        options.pause_for_confirmation = false;
    }
    if cmd.script_only {
        options.script_only = true;
    }
    if cmd.keep_script {
        options.keep_script = true;
    }
    if cmd.ignore_warnings {
        options.stop_if_warned = false;
    }
    options
}

fn print_run_summary(config: &SyncConfig, common: &CommonArgs) {
    println!(
        "Backing up files from {} to {}",
        config.home_root, config.dest_root
    );
    if config.include.is_empty() {
        println!("including: (whole home directory)");
    } else {
        println!("including ({}):", config.include.len());
        for root in &config.include {
            println!("  - {root}");
        }
    }
    if !config.exclude.is_empty() {
        println!("excluding: {:?}", config.exclude);
    }
    if !config.force.is_empty() {
        println!("always copying: {:?}", config.force);
    }
    match config.size_limit {
        Some(limit) => println!("ignoring files over {limit} bytes"),
        None => println!("no file size limit"),
    }
    println!(
        "{} hidden files",
        if config.keep_hidden {
            "keeping"
        } else {
            "ignoring"
        }
    );
    if config.suppress_deletion {
        println!("deletions disabled");
    }
    if config.overwrite_any_direction {
        println!("overwriting files that differ in either direction");
    }
    println!("using {}-style commands", config.dialect);
    if let Some(path) = &common.config {
        println!("settings: {}", path.display());
    }
    println!("---");
}

fn print_commands(outcome: &PlanOutcome) {
    if outcome.plan.is_empty() {
        println!("(no commands)");
    }
    for command in &outcome.plan.commands {
        println!("{command}");
    }
    println!("---");
}

fn print_report(outcome: &PlanOutcome) {
    for line in outcome.report.lines() {
        println!("{line}");
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "selfbackup",
    version,
    about = "Plan and run a one-way backup from a home tree to a destination tree"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the commands that would bring the destination in line with home.
    Plan(PlanCommand),
    /// Build the plan and execute it through the platform shell.
    Run(RunCommand),
}

#[derive(Debug, Clone, Args)]
struct CommonArgs {
    #[arg(value_name = "HOME", value_hint = ValueHint::DirPath)]
    home: Option<String>,
    #[arg(value_name = "DEST", value_hint = ValueHint::DirPath)]
    destination: Option<String>,
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
    #[arg(long = "include-file", value_name = "FILE", value_hint = ValueHint::FilePath)]
    include_file: Option<PathBuf>,
    #[arg(long = "exclude-file", value_name = "FILE", value_hint = ValueHint::FilePath)]
    exclude_file: Option<PathBuf>,
    #[arg(long = "force-file", value_name = "FILE", value_hint = ValueHint::FilePath)]
    force_file: Option<PathBuf>,
    #[arg(long = "size-limit", value_name = "BYTES", conflicts_with = "no_size_limit")]
    size_limit: Option<u64>,
    #[arg(long = "no-size-limit", action = ArgAction::SetTrue)]
    no_size_limit: bool,
    #[arg(long = "skip-hidden", action = ArgAction::SetTrue)]
    skip_hidden: bool,
    #[arg(long = "no-delete", action = ArgAction::SetTrue)]
    no_delete: bool,
    #[arg(long = "overwrite-any", action = ArgAction::SetTrue)]
    overwrite_any: bool,
    #[arg(long, value_name = "DIALECT")]
    dialect: Option<String>,
}

#[derive(Debug, Args)]
struct PlanCommand {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, Args)]
struct RunCommand {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long = "no-pause", action = ArgAction::SetTrue)]
    no_pause: bool,
    #[arg(long = "script-only", action = ArgAction::SetTrue)]
    script_only: bool,
    #[arg(long = "keep-script", action = ArgAction::SetTrue)]
    keep_script: bool,
    #[arg(long = "ignore-warnings", action = ArgAction::SetTrue)]
    ignore_warnings: bool,
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::parse_from([
            "selfbackup",
            "run",
            "/h",
            "/d",
            "--no-delete",
            "--no-size-limit",
            "--dialect",
            "dos",
            "--include-file",
            "/nonexistent/include.txt",
            "--no-pause",
        ]);
        let Command::Run(cmd) = cli.command else {
            panic!("expected run");
        };
        let settings = SettingsFile {
            size_limit: Some(5),
            dialect: Some("bash".into()),
            keep_hidden: Some(false),
            stop_if_warned: Some(false),
            ..SettingsFile::default()
        };
        let lists = merge_list_files(&cmd.common, &settings);
        assert_eq!(lists.include, PathBuf::from("/nonexistent/include.txt"));
        assert_eq!(lists.force, PathBuf::from(config::DEFAULT_FORCE_FILE));

        let options = run_options(&cmd, &settings);
        assert!(!options.pause_for_confirmation);
        assert!(!options.stop_if_warned);
    }

    #[test]
    fn settings_file_supplies_roots() {
        let temp = tempfile::tempdir().expect("temp dir");
        let settings = temp.path().join("backup.yaml");
        let missing = temp.path().join("missing.txt");
        std::fs::write(
            &settings,
            format!(
                "home: /h\ndestination: /d/\nkeep_hidden: false\ninclude_file: {0}\nexclude_file: {0}\nforce_file: {0}\n",
                missing.display()
            ),
        )
        .expect("write");
        let cli = Cli::parse_from([
            "selfbackup".to_string(),
            "plan".to_string(),
            "--config".to_string(),
            settings.display().to_string(),
            "--no-delete".to_string(),
        ]);
        let Command::Plan(cmd) = cli.command else {
            panic!("expected plan");
        };
        let (config, _) = resolve_config(&cmd.common).expect("config");
        assert_eq!(config.home_root, "/h");
        assert_eq!(config.dest_root, "/d");
        assert!(!config.keep_hidden);
        assert!(config.suppress_deletion);
        assert!(config.include.is_empty());
        assert_eq!(config.size_limit, Some(config::DEFAULT_SIZE_LIMIT));
    }

    #[test]
    fn in_sync_runs_still_leave_a_run_log() {
        let temp = tempfile::tempdir().expect("temp dir");
        let lines = vec!["0 total commands.".to_string()];
        let log = record_run(&ScriptOutcome::Empty, temp.path(), &lines)
            .expect("record")
            .expect("log written");
        assert!(log.starts_with(temp.path()));
        let text = std::fs::read_to_string(&log).expect("read");
        assert!(text.ends_with("0 total commands."));
    }

    #[test]
    fn unexecuted_runs_leave_no_run_log() {
        let temp = tempfile::tempdir().expect("temp dir");
        let script = temp.path().join("kept.sh");
        for result in [ScriptOutcome::Declined, ScriptOutcome::Written(script)] {
            assert_eq!(record_run(&result, temp.path(), &[]).expect("record"), None);
        }
        assert_eq!(std::fs::read_dir(temp.path()).expect("dir").count(), 0);
    }

    #[test]
    fn missing_destination_is_refused() {
        let cli = Cli::parse_from(["selfbackup", "plan", "/h", "--force-file", "/nope"]);
        let Command::Plan(cmd) = cli.command else {
            panic!("expected plan");
        };
        assert!(resolve_config(&cmd.common).is_err());
    }
}
