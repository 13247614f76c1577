//! Command File Writer
//!
//! Persists one step's commands to `<output_dir>/<step_no>-<slug>`.
//!
//! # File Contract
//!
//! - One command per line, each terminated by `\n`, UTF-8
//! - No trailing blank line; zero commands produce an empty file
//! - Existing files are overwritten without warning
//!
//! # Slots
//!
//! A numeric prefix is a slot. Several ineligible steps can share a number
//! before an eligible step claims it; the pipeline clears the slot before
//! each write with [`clear_slot`] so only the last writer's file survives,
//! and removes stale slots past the last realized number with
//! [`clear_slots_from`]. Only files named after a runbook description
//! ([`StepFiles`]) are ever removed.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MaintenanceError, Result};

/// Normalize a description into a file-name slug.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `-` and trims separators from both ends.
///
/// ```
/// use cloudmaint::writer::slugify;
///
/// assert_eq!(
///     slugify("generate commands for updating ecs task count to 0"),
///     "generate-commands-for-updating-ecs-task-count-to-0"
/// );
/// assert_eq!(slugify("  Dump: MySQL / table status!! "), "dump-mysql-table-status");
/// ```
pub fn slugify(description: &str) -> String {
    let mut slug = String::with_capacity(description.len());
    let mut pending_separator = false;

    for c in description.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        slug.push_str("step");
    }
    slug
}

/// File name for a step number and description.
pub fn file_name(step_no: u32, description: &str) -> String {
    format!("{}-{}", step_no, slugify(description))
}

/// Render commands in the on-disk format.
pub fn render(commands: &[String]) -> String {
    let mut content = String::new();
    for command in commands {
        content.push_str(command);
        content.push('\n');
    }
    content
}

/// Write a step's commands to `<output_dir>/<step_no>-<slug>`.
///
/// Returns the path written.
pub fn write(output_dir: &Path, step_no: u32, description: &str, commands: &[String]) -> Result<PathBuf> {
    let path = output_dir.join(file_name(step_no, description));
    fs::write(&path, render(commands)).map_err(|e| MaintenanceError::io(&path, e))?;
    debug!("Wrote {} command(s) to {}", commands.len(), path.display());
    Ok(path)
}

/// The file names a runbook can produce, recognized by slug.
///
/// Slot cleanup only ever removes these; anything else an operator keeps in
/// the directory (`1-notes.md`, a README) is left alone.
#[derive(Debug, Clone, Default)]
pub struct StepFiles {
    slugs: BTreeSet<String>,
}

impl StepFiles {
    pub fn new<'a>(descriptions: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            slugs: descriptions.into_iter().map(slugify).collect(),
        }
    }

    /// Whether `file_name` is `<n>-<slug>` for one of the known descriptions.
    pub fn owns(&self, file_name: &str) -> bool {
        match (slot_of(file_name), file_name.split_once('-')) {
            (Some(_), Some((_, slug))) => self.slugs.contains(slug),
            _ => false,
        }
    }
}

/// Remove the step files in slot `step_no`, except `keep` when given.
///
/// Returns the number of files removed.
pub fn clear_slot(output_dir: &Path, step_no: u32, keep: Option<&str>, owned: &StepFiles) -> Result<usize> {
    remove_step_files(output_dir, owned, |slot, name| slot == step_no && keep != Some(name))
}

/// Remove the step files in every slot from `first` on.
///
/// Clears what an earlier, longer run left behind.
pub fn clear_slots_from(output_dir: &Path, first: u32, owned: &StepFiles) -> Result<usize> {
    remove_step_files(output_dir, owned, |slot, _| slot >= first)
}

fn remove_step_files<F>(output_dir: &Path, owned: &StepFiles, doomed: F) -> Result<usize>
where
    F: Fn(u32, &str) -> bool,
{
    let entries = fs::read_dir(output_dir).map_err(|e| MaintenanceError::io(output_dir, e))?;
    let mut removed = 0;

    for entry in entries {
        let entry = entry.map_err(|e| MaintenanceError::io(output_dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(slot) = slot_of(name) else {
            continue;
        };
        if !owned.owns(name) || !doomed(slot, name) {
            continue;
        }
        let path = entry.path();
        if path.is_file() {
            fs::remove_file(&path).map_err(|e| MaintenanceError::io(&path, e))?;
            debug!("Removed superseded {}", path.display());
            removed += 1;
        }
    }

    Ok(removed)
}

/// Step number encoded in a file name, if it follows the `<n>-<slug>` shape.
pub fn slot_of(file_name: &str) -> Option<u32> {
    let (number, slug) = file_name.split_once('-')?;
    if slug.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    number.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_slugify_collapses_runs() {
        assert_eq!(slugify("a  --  b"), "a-b");
        assert_eq!(slugify("---"), "step");
        assert_eq!(slugify("ECS Task Count"), "ecs-task-count");
    }

    #[test]
    fn test_render_has_no_trailing_blank_line() {
        assert_eq!(render(&commands(&["a", "b"])), "a\nb\n");
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn test_slot_of() {
        assert_eq!(slot_of("12-restart-ecs-service"), Some(12));
        assert_eq!(slot_of("restart-ecs"), None);
        assert_eq!(slot_of("3-"), None);
        assert_eq!(slot_of("notes.txt"), None);
    }

    #[test]
    fn test_write_empty_commands_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), 1, "query ecs task status", &[]).unwrap();
        assert_eq!(path, dir.path().join("1-query-ecs-task-status"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), 2, "restart", &commands(&["old", "older"])).unwrap();
        let path = write(dir.path(), 2, "restart", &commands(&["new"])).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "new\n");
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_step_files_owns_only_known_slugs() {
        let owned = StepFiles::new(["restart ecs service", "query ecs task status"]);
        assert!(owned.owns("4-restart-ecs-service"));
        assert!(owned.owns("12-query-ecs-task-status"));
        assert!(!owned.owns("restart-ecs-service"));
        assert!(!owned.owns("1-notes-md"));
        assert!(!owned.owns("1-notes.md"));
    }

    #[test]
    fn test_clear_slot_keeps_claimant() {
        let dir = tempfile::tempdir().unwrap();
        let owned = StepFiles::new(["first ineligible", "second ineligible", "eligible", "other slot"]);
        write(dir.path(), 2, "first ineligible", &[]).unwrap();
        write(dir.path(), 2, "second ineligible", &[]).unwrap();
        write(dir.path(), 3, "other slot", &[]).unwrap();
        fs::write(dir.path().join("README"), "keep me").unwrap();

        let claimant = file_name(2, "eligible");
        assert_eq!(clear_slot(dir.path(), 2, Some(&claimant), &owned).unwrap(), 2);
        write(dir.path(), 2, "eligible", &commands(&["echo hi"])).unwrap();

        assert_eq!(names(dir.path()), vec!["2-eligible", "3-other-slot", "README"]);
    }

    #[test]
    fn test_clear_slots_from_removes_stale_tail() {
        let dir = tempfile::tempdir().unwrap();
        let owned = StepFiles::new(["zero", "restore", "query"]);
        write(dir.path(), 1, "zero", &[]).unwrap();
        write(dir.path(), 2, "restore", &[]).unwrap();
        write(dir.path(), 3, "query", &[]).unwrap();
        write(dir.path(), 7, "query", &[]).unwrap();

        assert_eq!(clear_slots_from(dir.path(), 2, &owned).unwrap(), 3);
        assert_eq!(names(dir.path()), vec!["1-zero"]);
    }

    #[test]
    fn test_cleanup_leaves_operator_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let owned = StepFiles::new(["zero"]);
        fs::write(dir.path().join("1-notes.md"), "checked with DBA").unwrap();
        fs::write(dir.path().join("5-handover"), "").unwrap();

        assert_eq!(clear_slot(dir.path(), 1, None, &owned).unwrap(), 0);
        assert_eq!(clear_slots_from(dir.path(), 1, &owned).unwrap(), 0);
        assert_eq!(names(dir.path()), vec!["1-notes.md", "5-handover"]);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let result = write(&missing, 1, "anything", &[]);
        assert!(matches!(result, Err(MaintenanceError::Io { .. })));
    }
}
