//! Type-safe step and command contracts.
//!
//! Two traits live here:
//!
//! - [`CommandLine`]: a typed shell invocation. Instead of formatting raw
//!   strings at every call site, each command is a struct whose fields map
//!   onto the flags of `aws`, `kubectl`, `psql` or `mysql`.
//! - [`MaintenanceStep`]: one unit of the runbook. It decides whether it has
//!   work, builds its commands and writes them to its numbered file.
//!
//! # Design Goals
//!
//! 1. **Flag names in one place**: `--desired-count` vs `--desired_count`
//!    mistakes live in exactly one struct, not in every step.
//! 2. **Reviewable output**: rendered commands are shell-quoted so an operator
//!    can paste any line as-is.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::writer;

/// Trait for typed command lines.
///
/// # Contract
///
/// - `program()`: the executable (`aws`, `kubectl`, ...).
/// - `to_cli_args()`: arguments exactly as the executable expects them.
/// - `redirect()`: optional file the command's stdout is redirected to.
///
/// # Example
///
/// ```
/// use cloudmaint::step_traits::CommandLine;
/// use cloudmaint::steps::container::ForceNewDeploymentCommand;
///
/// let cmd = ForceNewDeploymentCommand {
///     profile: None,
///     region: "ap-east-1".to_string(),
///     cluster: "web".to_string(),
///     service: "api".to_string(),
/// };
/// assert_eq!(
///     cmd.render(),
///     "aws ecs update-service --region ap-east-1 --cluster web --service api --force-new-deployment"
/// );
/// ```
pub trait CommandLine {
    /// Executable name.
    fn program(&self) -> &'static str;

    /// Arguments, unquoted.
    fn to_cli_args(&self) -> Vec<String>;

    /// File that stdout is redirected to, if any.
    fn redirect(&self) -> Option<String> {
        None
    }

    /// One shell line: program, quoted arguments and redirect.
    fn render(&self) -> String {
        let mut line = self.program().to_string();
        for arg in self.to_cli_args() {
            line.push(' ');
            line.push_str(&shell_quote(&arg));
        }
        if let Some(target) = self.redirect() {
            line.push_str(" > ");
            line.push_str(&shell_quote(&target));
        }
        line
    }
}

/// Render a batch of typed commands.
pub fn render_all<C: CommandLine>(commands: impl IntoIterator<Item = C>) -> Vec<String> {
    commands.into_iter().map(|c| c.render()).collect()
}

/// Quote a word for POSIX shells, leaving plain words untouched.
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,@%+".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Trait for runbook steps.
///
/// # Invariants
///
/// - `eligible()` is a pure function of the operator's topology.
/// - `generate_commands()` is deterministic and empty when not eligible.
/// - `write_file()` always writes, even an empty file; numbering is the
///   pipeline's business, not the step's.
pub trait MaintenanceStep {
    /// Number this step was constructed with.
    fn step_no(&self) -> u32;

    /// Human-readable description, also the source of the file slug.
    fn description(&self) -> &str;

    /// Directory the command file is written into.
    fn output_dir(&self) -> &Path;

    /// Whether there is at least one in-scope resource to act on.
    fn eligible(&self) -> bool;

    /// Commands in resource order.
    fn generate_commands(&self) -> Result<Vec<String>>;

    /// Write the commands (possibly none) to `<output_dir>/<step_no>-<slug>`.
    fn write_file(&self) -> Result<PathBuf> {
        let commands = self.generate_commands()?;
        writer::write(self.output_dir(), self.step_no(), self.description(), &commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(Vec<&'static str>);

    impl CommandLine for Echo {
        fn program(&self) -> &'static str {
            "echo"
        }

        fn to_cli_args(&self) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("deployment/web"), "deployment/web");
        assert_eq!(shell_quote("--replicas=3"), "--replicas=3");
        assert_eq!(shell_quote("two words"), "'two words'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_render_quotes_arguments() {
        let cmd = Echo(vec!["hello", "big world"]);
        assert_eq!(cmd.render(), "echo hello 'big world'");
    }

    #[test]
    fn test_render_all_keeps_order() {
        let lines = render_all(vec![Echo(vec!["1"]), Echo(vec!["2"])]);
        assert_eq!(lines, vec!["echo 1", "echo 2"]);
    }
}
