// src/reload.rs

//! The reload collaborator.
//!
//! Reloading a module in place is done by something outside this crate (an
//! embedded interpreter, a dev server, a helper process). It is modelled as
//! the [`Reloader`] trait; the binary ships a command based implementation.

use std::fmt::Debug;
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::locate::is_valid_module_ref;

/// Placeholder replaced by the dotted module name in command templates.
pub const MODULE_PLACEHOLDER: &str = "{module}";

/// What the placeholder becomes in the `sh -c` script.
const SHELL_MODULE_ARG: &str = "\"$1\"";

/// `$0` of the reload script.
const SHELL_ARG0: &str = "hotreload";

/// Reloads an already imported module in place.
pub trait Reloader: Send + Debug {
    /// Returns whether anything actually changed. An error means the module
    /// was left as it was (a syntax error in the edited file, say).
    fn reload(&mut self, module: &str) -> Result<bool>;
}

/// Reloader that only records the request. Useful with `--dry-run` style
/// setups and when no reload backend is configured.
#[derive(Debug, Default)]
pub struct LoggingReloader;

impl Reloader for LoggingReloader {
    fn reload(&mut self, module: &str) -> Result<bool> {
        info!(module, "reload requested (no reload command configured)");
        Ok(true)
    }
}

/// Runs a shell command per reload, e.g. `python -m devtools.reload {module}`.
///
/// On Unix the module name never becomes part of the script text: the
/// placeholder is rewritten to `"$1"` and the name is passed as the first
/// positional argument of `sh -c`. A zero exit status means the module
/// changed. A non-zero status is an error carrying the command's stderr.
#[derive(Debug, Clone)]
pub struct CommandReloader {
    template: String,
}

impl CommandReloader {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The command line for `module`, for display and for `cmd /C`. If the
    /// template has no placeholder, the module name is appended as the last
    /// argument.
    pub fn render(&self, module: &str) -> String {
        self.substitute(module)
    }

    /// Script handed to `sh -c`; the module arrives as `$1`.
    fn script(&self) -> String {
        self.substitute(SHELL_MODULE_ARG)
    }

    fn substitute(&self, value: &str) -> String {
        if self.template.contains(MODULE_PLACEHOLDER) {
            self.template.replace(MODULE_PLACEHOLDER, value)
        } else {
            format!("{} {value}", self.template)
        }
    }

    fn command(&self, module: &str) -> Command {
        if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(self.render(module));
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(self.script()).arg(SHELL_ARG0).arg(module);
            c
        }
    }
}

impl Reloader for CommandReloader {
    fn reload(&mut self, module: &str) -> Result<bool> {
        if !is_valid_module_ref(module) {
            bail!("refusing to run reload command for '{module}': not a dotted module name");
        }
        debug!(module, cmd = %self.render(module), "running reload command");

        let output = self
            .command(module)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("spawning reload command for '{module}'"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            bail!("reload command exited with {code}: {}", stderr.trim());
        }
        Ok(true)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_substituted() {
        let r = CommandReloader::new("reload --name {module} --quiet");
        assert_eq!(r.render("pkg.mod"), "reload --name pkg.mod --quiet");
    }

    #[test]
    fn module_is_appended_without_placeholder() {
        let r = CommandReloader::new("reload");
        assert_eq!(r.render("pkg.mod"), "reload pkg.mod");
    }

    #[test]
    fn script_refers_to_positional_argument() {
        let r = CommandReloader::new("reload --name {module}");
        assert_eq!(r.script(), "reload --name \"$1\"");
        assert_eq!(CommandReloader::new("reload").script(), "reload \"$1\"");
    }

    #[test]
    fn successful_command_reports_changed() {
        let mut r = CommandReloader::new("test {module} = pkg.mod");
        assert!(r.reload("pkg.mod").unwrap());
    }

    #[test]
    fn failing_command_is_an_error_with_stderr() {
        let mut r = CommandReloader::new("echo \"SyntaxError in $1\" >&2; exit 3");
        let err = r.reload("pkg.bad").unwrap_err().to_string();
        assert!(err.contains("exited with 3"), "{err}");
        assert!(err.contains("SyntaxError in pkg.bad"), "{err}");
    }

    #[test]
    fn shell_metacharacters_in_module_never_run() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let module = format!("pkg.$(touch {})", marker.display());

        let mut r = CommandReloader::new("true {module}");
        assert!(r.reload(&module).is_err());
        assert!(!marker.exists());

        // Even when spawned directly, the name is an argument, not script.
        let status = r.command(&module).status().unwrap();
        assert!(status.success());
        assert!(!marker.exists());
    }

    #[test]
    fn module_is_passed_as_data() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut r = CommandReloader::new(format!("printf %s {{module}} > '{}'", out.display()));

        assert!(r.reload("pkg.sub_2").unwrap());
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "pkg.sub_2");
    }
}
