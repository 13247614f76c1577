//! Pipeline Controller
//!
//! Drives the runbook in order and assigns realized step numbers.
//!
//! # Numbering
//!
//! | Entry       | Writes file? | Counter |
//! |-------------|--------------|---------|
//! | eligible    | yes          | advances |
//! | ineligible  | yes (empty)  | unchanged, the next entry reuses the number |
//!
//! The declared runbook order is fixed and comprehensive; the realized
//! numbering is dense and starts at 1 for every maintenance, whatever
//! resource categories are present. Each slot is cleared of other runbook
//! files before it is written, and every slot past the last realized number
//! is cleared at the end, so the directory holds exactly one runbook file per
//! eligible entry even when an earlier run realized more steps.
//!
//! # Failures
//!
//! Any error (command generation or filesystem) aborts the run. Files already
//! written stay on disk; nothing is rolled back.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::catalog::CatalogEntry;
use crate::config::MaintenanceConfig;
use crate::error::Result;
use crate::operator::OperatorContext;
use crate::step_traits::MaintenanceStep;
use crate::steps::Step;
use crate::types::{CountMode, StepKind};
use crate::writer::{self, StepFiles};

/// Outcome of one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealizedStep {
    pub kind: StepKind,
    pub mode: Option<CountMode>,
    pub description: String,
    /// Realized number, `None` when the entry had no work
    pub step_no: Option<u32>,
    /// File holding the commands, `None` for ineligible entries and dry runs
    pub path: Option<PathBuf>,
    pub commands: Vec<String>,
}

impl RealizedStep {
    pub fn is_realized(&self) -> bool {
        self.step_no.is_some()
    }
}

impl fmt::Display for RealizedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step_no {
            Some(n) => write!(f, "{:>3}. {} ({} commands)", n, self.description, self.commands.len()),
            None => write!(f, "   -  {} (skipped)", self.description),
        }
    }
}

/// Result of running the runbook for one operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub operator_id: String,
    pub output_dir: PathBuf,
    pub entries: Vec<RealizedStep>,
}

impl PipelineReport {
    /// Entries that received a number, in order.
    pub fn realized(&self) -> impl Iterator<Item = &RealizedStep> {
        self.entries.iter().filter(|e| e.is_realized())
    }

    pub fn realized_count(&self) -> usize {
        self.realized().count()
    }

    /// Returns a summary of the run for logging/display.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Runbook for operator {}", self.operator_id),
            format!("  Output: {}", self.output_dir.display()),
            format!("  Steps ({} of {}):", self.realized_count(), self.entries.len()),
        ];
        for entry in &self.entries {
            lines.push(format!("    {}", entry));
        }
        lines.join("\n")
    }
}

/// Run the runbook, writing one file per step into the operator's directory.
///
/// For each entry, in order: build the step with the current counter, write
/// its file, then advance the counter only if the step was eligible.
pub fn run_pipeline(
    catalog: &[CatalogEntry],
    context: &OperatorContext,
    config: &MaintenanceConfig,
) -> Result<PipelineReport> {
    let mut step_no = 1;
    let mut entries = Vec::with_capacity(catalog.len());
    let owned = StepFiles::new(catalog.iter().map(|e| e.description));

    for entry in catalog {
        let step = Step::new(entry.kind, entry.mode, entry.description, step_no, context, config);
        let claimant = writer::file_name(step_no, entry.description);
        writer::clear_slot(step.output_dir(), step_no, Some(&claimant), &owned)?;
        let path = step.write_file()?;

        if step.eligible() {
            info!("Step {}: {}", step_no, entry.description);
            entries.push(RealizedStep {
                kind: step.kind(),
                mode: entry.mode,
                description: entry.description.to_string(),
                step_no: Some(step_no),
                path: Some(path),
                commands: step.generate_commands()?,
            });
            step_no += 1;
        } else {
            debug!("No work for '{}', slot {} stays open", entry.description, step_no);
            entries.push(skipped(entry));
        }
    }

    // The open slot, plus anything a longer earlier run left behind
    let removed = writer::clear_slots_from(&context.output_dir, step_no, &owned)?;
    if removed > 0 {
        debug!("Cleared {} stale file(s) from slot {} on", removed, step_no);
    }

    Ok(PipelineReport {
        operator_id: context.operator_id.clone(),
        output_dir: context.output_dir.clone(),
        entries,
    })
}

/// Compute the same report as [`run_pipeline`] without touching the filesystem.
pub fn plan_pipeline(
    catalog: &[CatalogEntry],
    context: &OperatorContext,
    config: &MaintenanceConfig,
) -> Result<PipelineReport> {
    let mut step_no = 1;
    let mut entries = Vec::with_capacity(catalog.len());

    for entry in catalog {
        let step = Step::new(entry.kind, entry.mode, entry.description, step_no, context, config);
        if step.eligible() {
            entries.push(RealizedStep {
                kind: step.kind(),
                mode: entry.mode,
                description: entry.description.to_string(),
                step_no: Some(step_no),
                path: None,
                commands: step.generate_commands()?,
            });
            step_no += 1;
        } else {
            entries.push(skipped(entry));
        }
    }

    Ok(PipelineReport {
        operator_id: context.operator_id.clone(),
        output_dir: context.output_dir.clone(),
        entries,
    })
}

fn skipped(entry: &CatalogEntry) -> RealizedStep {
    RealizedStep {
        kind: entry.kind,
        mode: entry.mode,
        description: entry.description.to_string(),
        step_no: None,
        path: None,
        commands: Vec::new(),
    }
}
