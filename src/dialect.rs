use std::path::Path;
use std::process::Command;

/// Text templates for one shell syntax. Operands arrive as normalized (forward-slash) paths.
pub trait CommandDialect: Sync {
    fn name(&self) -> &'static str;
    fn script_extension(&self) -> &'static str;
    /// Process that executes a script written in this dialect.
    fn launcher(&self, script: &Path) -> Command;

    fn remove_file(&self, dest: &str) -> String;
    fn remove_directory(&self, dest: &str) -> String;
    fn make_directory(&self, dest: &str) -> String;
    fn copy_file(&self, source: &str, dest: &str) -> String;
    fn overwrite_file(&self, source: &str, dest: &str) -> String;
}

pub struct Bash;

impl CommandDialect for Bash {
    fn name(&self) -> &'static str {
        "bash"
    }

    fn script_extension(&self) -> &'static str {
        "sh"
    }

    fn launcher(&self, script: &Path) -> Command {
        let mut command = Command::new("bash");
        command.arg(script);
        command
    }

    fn remove_file(&self, dest: &str) -> String {
        format!("rm -f {}", single_quoted(dest))
    }

    fn remove_directory(&self, dest: &str) -> String {
        format!("rm -rf {}", single_quoted(dest))
    }

    fn make_directory(&self, dest: &str) -> String {
        format!("mkdir -p {}", single_quoted(dest))
    }

    fn copy_file(&self, source: &str, dest: &str) -> String {
        format!("cp -R {} {}", single_quoted(source), single_quoted(dest))
    }

    fn overwrite_file(&self, source: &str, dest: &str) -> String {
        format!("cp -Rf {} {}", single_quoted(source), single_quoted(dest))
    }
}

/// Single quotes disable every expansion in bash; an embedded `'` is closed, escaped, reopened.
fn single_quoted(path: &str) -> String {
    format!("'{}'", path.replace('\'', r"'\''"))
}

pub struct Dos;

/// Backslash separators, with `%` doubled so batch files do not expand variables.
fn backslashed(path: &str) -> String {
    path.replace('/', "\\").replace('%', "%%")
}

impl CommandDialect for Dos {
    fn name(&self) -> &'static str {
        "dos"
    }

    fn script_extension(&self) -> &'static str {
        "bat"
    }

    fn launcher(&self, script: &Path) -> Command {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(script);
        command
    }

    fn remove_file(&self, dest: &str) -> String {
        format!("del \"{}\"", backslashed(dest))
    }

    fn remove_directory(&self, dest: &str) -> String {
        format!("rmdir /s /q \"{}\"", backslashed(dest))
    }

    fn make_directory(&self, dest: &str) -> String {
        format!("mkdir \"{}\"", backslashed(dest))
    }

    // Trailing `*` answers xcopy's "file or directory?" question with "file".
    fn copy_file(&self, source: &str, dest: &str) -> String {
        format!(
            "xcopy /h /q \"{}\" \"{}*\"",
            backslashed(source),
            backslashed(dest)
        )
    }

    fn overwrite_file(&self, source: &str, dest: &str) -> String {
        format!(
            "xcopy /h /q /y \"{}\" \"{}\"",
            backslashed(source),
            backslashed(dest)
        )
    }
}

static BASH: Bash = Bash;
static DOS: Dos = Dos;

/// Resolves a dialect tag. Unknown tags yield `None`, which the planner turns into an
/// empty plan.
pub fn lookup(tag: &str) -> Option<&'static dyn CommandDialect> {
    match tag.trim().to_ascii_lowercase().as_str() {
        "bash" | "sh" | "posix" => Some(&BASH),
        "dos" | "cmd" | "batch" => Some(&DOS),
        _ => None,
    }
}

pub fn host_default() -> &'static str {
    if cfg!(windows) { DOS.name() } else { BASH.name() }
}
