//! Operator Context
//!
//! Binds an operator to their output directory and the topology they see.
//! Creating the output directory here is the only filesystem side effect
//! outside the command file writer.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{MaintenanceError, Result};
use crate::loader::{ResourceDataLoader, Snapshot};
use crate::topology::Topology;

/// An operator's view of one maintenance.
#[derive(Debug, Clone)]
pub struct OperatorContext {
    pub operator_id: String,
    pub output_dir: PathBuf,
    pub topology: Topology,
}

impl OperatorContext {
    /// Load the operator's topology from a snapshot file and ensure
    /// `<output_root>/<operator_id>` exists.
    ///
    /// The snapshot is loaded before anything touches the filesystem, so a
    /// load failure leaves no directory behind.
    pub fn resolve(
        operator_id: &str,
        snapshot_path: &Path,
        maintenance_id: &str,
        output_root: &Path,
    ) -> Result<Self> {
        let snapshot = Snapshot::read_from_file(snapshot_path)?;
        Self::resolve_from_snapshot(operator_id, &snapshot, maintenance_id, output_root)
    }

    /// Same as [`OperatorContext::resolve`] for an already parsed snapshot.
    pub fn resolve_from_snapshot(
        operator_id: &str,
        snapshot: &Snapshot,
        maintenance_id: &str,
        output_root: &Path,
    ) -> Result<Self> {
        let context = Self::load(operator_id, snapshot, maintenance_id, output_root)?;
        fs::create_dir_all(&context.output_dir)
            .map_err(|e| MaintenanceError::io(&context.output_dir, e))?;
        debug!("Output directory ready: {}", context.output_dir.display());
        Ok(context)
    }

    /// Build the context without creating the output directory (dry runs).
    pub fn load(
        operator_id: &str,
        snapshot: &Snapshot,
        maintenance_id: &str,
        output_root: &Path,
    ) -> Result<Self> {
        validate_operator_id(operator_id)?;
        let topology = ResourceDataLoader::build(snapshot, maintenance_id, Some(operator_id))?;
        if topology.is_empty() {
            warn!(
                "Operator {} has no resources assigned in maintenance {}",
                operator_id, maintenance_id
            );
        }
        Ok(Self {
            operator_id: operator_id.to_string(),
            output_dir: output_root.join(operator_id),
            topology,
        })
    }
}

/// The operator id becomes a directory name, so it must be a single path component.
fn validate_operator_id(operator_id: &str) -> Result<()> {
    let trimmed = operator_id.trim();
    if trimmed.is_empty() {
        return Err(MaintenanceError::config("operator id must not be empty"));
    }
    if trimmed != operator_id
        || operator_id.contains(&['/', '\\'][..])
        || operator_id == "."
        || operator_id == ".."
    {
        return Err(MaintenanceError::config(format!(
            "operator id '{}' is not a valid directory name",
            operator_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{ "regions": [ { "name": "ap-east-1", "ecs_clusters": [
        { "name": "web", "services": [
            { "name": "api", "desired_count": 3, "maintenance_id": "MNT-1" } ] } ] } ] }"#;

    #[test]
    fn test_resolve_creates_output_directory() {
        let root = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::from_json(SNAPSHOT).unwrap();
        let nested = root.path().join("dist");

        let context =
            OperatorContext::resolve_from_snapshot("alice", &snapshot, "MNT-1", &nested).unwrap();
        assert_eq!(context.output_dir, nested.join("alice"));
        assert!(context.output_dir.is_dir());
        assert_eq!(context.topology.resource_count(), 1);
    }

    #[test]
    fn test_load_failure_leaves_no_directory() {
        let root = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::from_json(SNAPSHOT).unwrap();
        let result = OperatorContext::resolve_from_snapshot("alice", &snapshot, "MNT-9", root.path());
        assert!(matches!(result, Err(MaintenanceError::UnknownMaintenanceId(_))));
        assert!(!root.path().join("alice").exists());
    }

    #[test]
    fn test_load_does_not_touch_filesystem() {
        let root = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::from_json(SNAPSHOT).unwrap();
        let context = OperatorContext::load("bob", &snapshot, "MNT-1", root.path()).unwrap();
        assert!(!context.output_dir.exists());
    }

    #[test]
    fn test_operator_id_validation() {
        assert!(validate_operator_id("alice").is_ok());
        assert!(validate_operator_id("").is_err());
        assert!(validate_operator_id("../etc").is_err());
        assert!(validate_operator_id("..").is_err());
        assert!(validate_operator_id(" alice").is_err());
    }
}
