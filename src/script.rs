use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use is_terminal::IsTerminal;
use tracing::{debug, info};

use crate::dialect::CommandDialect;

pub const RUN_SCRIPT_STEM: &str = "~run_self_backup";
pub const CHECK_SCRIPT_STEM: &str = "~check_self_backup";

pub struct ScriptJob<'a> {
    pub dir: &'a Path,
    pub stem: &'a str,
    pub commands: &'a [String],
    pub dialect: &'a dyn CommandDialect,
    pub pause: bool,
    pub execute: bool,
    pub keep: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// Nothing to do; no file was written.
    Empty,
    /// Script left on disk without running it.
    Written(PathBuf),
    Declined,
    Executed,
}

pub fn run_script(job: &ScriptJob<'_>) -> Result<ScriptOutcome> {
    if job.commands.is_empty() {
        println!("No commands were run.");
        return Ok(ScriptOutcome::Empty);
    }

    let path = write_script(job)?;
    if !job.execute {
        info!(script = %path.display(), "script written; not executing");
        return Ok(ScriptOutcome::Written(path));
    }

    if job.pause && !confirm()? {
        cleanup(&path, job.keep)?;
        return Ok(ScriptOutcome::Declined);
    }

    info!(script = %path.display(), commands = job.commands.len(), "running script");
    let status = job
        .dialect
        .launcher(&path)
        .status()
        .with_context(|| format!("launching {}", path.display()));
    cleanup(&path, job.keep)?;
    let status = status?;
    if !status.success() {
        bail!("script {} exited with {status}", path.display());
    }
    Ok(ScriptOutcome::Executed)
}

fn write_script(job: &ScriptJob<'_>) -> Result<PathBuf> {
    let path = job
        .dir
        .join(format!("{}.{}", job.stem, job.dialect.script_extension()));
    let mut body = job.commands.join("\n");
    body.push('\n');
    fs::write(&path, body).with_context(|| format!("writing script {}", path.display()))?;
    make_executable(&path)?;
    debug!(script = %path.display(), "script written");
    Ok(path)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("marking {} executable", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn cleanup(path: &Path, keep: bool) -> Result<()> {
    if keep {
        return Ok(());
    }
    fs::remove_file(path).with_context(|| format!("removing script {}", path.display()))
}

fn confirm() -> Result<bool> {
    if !io::stdin().is_terminal() {
        bail!("confirmation requested but stdin is not a terminal; rerun with --no-pause");
    }
    print!("Press Enter to continue, or type q to cancel: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(!matches!(
        input.trim().to_lowercase().as_str(),
        "q" | "quit" | "n" | "no"
    ))
}
