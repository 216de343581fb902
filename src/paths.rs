use std::env;
use std::sync::OnceLock;

/// Resolved home directory plus the shorthand that stands for it on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeDir {
    shorthand: &'static str,
    path: String,
}

impl HomeDir {
    pub fn from_env() -> Option<Self> {
        Self::from_vars(
            env::var("HOME").ok(),
            env::var("HOMEDRIVE").ok(),
            env::var("HOMEPATH").ok(),
        )
    }

    fn from_vars(
        home: Option<String>,
        drive: Option<String>,
        home_path: Option<String>,
    ) -> Option<Self> {
        if let Some(home) = home {
            return Some(Self {
                shorthand: "~",
                path: home.replace('\\', "/"),
            });
        }
        match (drive, home_path) {
            (Some(drive), Some(home_path)) => Some(Self {
                shorthand: "%HOMEPATH%",
                path: format!("{drive}{home_path}").replace('\\', "/"),
            }),
            _ => None,
        }
    }

    fn expand(&self, path: &str) -> Option<String> {
        let rest = path.strip_prefix(self.shorthand)?;
        // `~user` is not ours to expand; `%HOMEPATH%` is always a whole token.
        if self.shorthand == "~" && !(rest.is_empty() || rest.starts_with(['/', '\\'])) {
            return None;
        }
        Some(format!("{}{rest}", self.path))
    }
}

fn process_home() -> Option<&'static HomeDir> {
    static HOME: OnceLock<Option<HomeDir>> = OnceLock::new();
    HOME.get_or_init(HomeDir::from_env).as_ref()
}

/// Canonical form used for every path the planner stores: home shorthand expanded,
/// forward slashes only, no trailing slash.
pub fn normalize(path: &str) -> String {
    normalize_with(path, process_home())
}

pub fn normalize_with(path: &str, home: Option<&HomeDir>) -> String {
    let expanded = home
        .and_then(|home| home.expand(path))
        .unwrap_or_else(|| path.to_string());
    let mut slashed = expanded.replace('\\', "/");
    while slashed.ends_with('/') {
        slashed.pop();
    }
    slashed
}

/// Suffix of `path` below `root`, or `None` when `path` is not inside `root`.
/// The root itself yields `Some("")`; every other ending starts with `/`.
pub fn ending_under<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(root)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

pub fn under_root(root: &str, ending: &str) -> String {
    format!("{root}{ending}")
}
