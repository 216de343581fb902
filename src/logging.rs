use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const RUN_LOG_PREFIX: &str = "Updated-";

/// Installs the stderr subscriber. `RUST_LOG` wins over the default `info` level.
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| anyhow!("invalid log filter: {err}"))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()
        .map_err(|err| anyhow!("installing log subscriber: {err}"))
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn run_log_name(at: OffsetDateTime) -> Result<String> {
    let stamp = at
        .format(format_description!(
            "[year]-[month]-[day]-[hour][minute][second]"
        ))
        .context("formatting run log name")?;
    Ok(format!("{RUN_LOG_PREFIX}{stamp}.txt"))
}

/// Leaves `Updated-<timestamp>.txt` in `dir`: the timestamp, then `lines`.
pub fn write_run_log(dir: &Path, lines: &[String]) -> Result<PathBuf> {
    write_run_log_at(dir, lines, now())
}

fn write_run_log_at(dir: &Path, lines: &[String], at: OffsetDateTime) -> Result<PathBuf> {
    let path = dir.join(run_log_name(at)?);
    let timestamp = at.format(&Rfc3339).unwrap_or_else(|_| "unknown".into());
    let mut contents = vec![timestamp];
    contents.extend(lines.iter().cloned());
    fs::write(&path, contents.join("\n"))
        .with_context(|| format!("writing run log {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use time::macros::datetime;

    #[test]
    fn run_log_is_named_by_timestamp() {
        let temp = tempdir().expect("temp dir");
        let at = datetime!(2024-03-05 07:08:09 UTC);
        let path = write_run_log_at(temp.path(), &["3 total commands.".to_string()], at)
            .expect("log");
        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some("Updated-2024-03-05-070809.txt")
        );
        let text = fs::read_to_string(&path).expect("read");
        assert_eq!(text, "2024-03-05T07:08:09Z\n3 total commands.");
    }

    #[test]
    fn second_init_reports_error() {
        let _ = init();
        assert!(init().is_err());
    }
}
