//! Tests for the runbook pipeline
//!
//! These tests verify:
//! - Dense numbering: one file per eligible entry, numbered 1..=n
//! - Re-runs produce byte-identical output
//! - Restore steps return resources to their own baseline
//! - Out-of-scope resources never leak into any command
//! - Load, generation and filesystem failures are fatal

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use cloudmaint::writer::slot_of;
use cloudmaint::{
    MAINTENANCE_RUNBOOK, MaintenanceConfig, MaintenanceError, OperatorContext, Snapshot,
    run_pipeline,
};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mixed_snapshot.json")
}

/// File name → content for every file in `dir`.
fn read_dir_contents(dir: &Path) -> BTreeMap<String, String> {
    fs::read_dir(dir)
        .expect("output dir readable") // test: directory was just written
        .map(|e| {
            let e = e.expect("dir entry"); // test: local tempdir
            (
                e.file_name().to_string_lossy().into_owned(),
                fs::read_to_string(e.path()).expect("file readable"), // test: just written
            )
        })
        .collect()
}

fn resolve(root: &Path, json: &str, operator: &str) -> OperatorContext {
    let snapshot = Snapshot::from_json(json).expect("snapshot parses"); // test: known-good input
    OperatorContext::resolve_from_snapshot(operator, &snapshot, "MNT-1", root)
        .expect("context resolves") // test: known-good input
}

// =============================================================================
// Numbering
// =============================================================================

#[test]
fn test_full_topology_realizes_every_entry() {
    let root = tempfile::tempdir().unwrap();
    let ctx = OperatorContext::resolve("alice", &fixture(), "MNT-1", root.path()).unwrap();
    let report = run_pipeline(MAINTENANCE_RUNBOOK, &ctx, &MaintenanceConfig::default()).unwrap();

    assert_eq!(report.realized_count(), MAINTENANCE_RUNBOOK.len());

    let files = read_dir_contents(&ctx.output_dir);
    let mut slots: Vec<u32> = files.keys().filter_map(|name| slot_of(name)).collect();
    slots.sort();
    let expected: Vec<u32> = (1..=MAINTENANCE_RUNBOOK.len() as u32).collect();
    assert_eq!(slots, expected);
    assert!(files.values().all(|content| !content.is_empty()));
}

#[test]
fn test_file_count_equals_eligible_count() {
    // Kubernetes deployments only
    let json = r#"{ "regions": [ { "name": "eu-west-1", "eks_clusters": [
        { "name": "core", "namespaces": [ { "name": "default", "deployments": [
            { "name": "web", "replicas": 2, "maintenance_id": "MNT-1" } ] } ] } ] } ] }"#;
    let root = tempfile::tempdir().unwrap();
    let ctx = resolve(root.path(), json, "alice");
    let report = run_pipeline(MAINTENANCE_RUNBOOK, &ctx, &MaintenanceConfig::default()).unwrap();

    let files = read_dir_contents(&ctx.output_dir);
    assert_eq!(files.len(), report.realized_count());
    assert_eq!(
        files.keys().cloned().collect::<Vec<_>>(),
        vec![
            "1-generate-commands-for-updating-k8s-deployment-replicas-to-0",
            "2-generate-commands-for-restarting-k8s-deployment",
            "3-generate-commands-for-restarting-eks-deployment",
            "4-generate-commands-for-updating-k8s-deployment-replicas-to-resume",
            "5-generate-commands-for-querying-k8s-deployment-status",
        ]
    );
    assert_eq!(
        files["1-generate-commands-for-updating-k8s-deployment-replicas-to-0"],
        "kubectl --context core --namespace default scale deployment/web --replicas=0\n"
    );
    assert_eq!(
        files["4-generate-commands-for-updating-k8s-deployment-replicas-to-resume"],
        "kubectl --context core --namespace default scale deployment/web --replicas=2\n"
    );
}

#[test]
fn test_single_container_service_scenario() {
    let json = r#"{ "regions": [ { "name": "ap-east-1", "ecs_clusters": [
        { "name": "web", "services": [
            { "name": "api", "desired_count": 3, "maintenance_id": "MNT-1" } ] } ] } ] }"#;
    let root = tempfile::tempdir().unwrap();
    let ctx = resolve(root.path(), json, "alice");
    let report = run_pipeline(MAINTENANCE_RUNBOOK, &ctx, &MaintenanceConfig::default()).unwrap();

    let numbered: Vec<(u32, &str)> = report
        .realized()
        .map(|e| (e.step_no.unwrap(), e.description.as_str()))
        .collect();
    assert_eq!(
        numbered,
        vec![
            (1, "generate commands for updating ecs task count to 0"),
            (2, "generate commands for restarting ecs service"),
            (3, "generate commands for updating ecs task count to resume"),
            (4, "generate commands for querying ecs task status"),
        ]
    );

    let files = read_dir_contents(&ctx.output_dir);
    assert_eq!(files.len(), 4);
    assert_eq!(
        files["1-generate-commands-for-updating-ecs-task-count-to-0"],
        "aws ecs update-service --region ap-east-1 --cluster web --service api --desired-count 0\n"
    );
    assert_eq!(
        files["3-generate-commands-for-updating-ecs-task-count-to-resume"],
        "aws ecs update-service --region ap-east-1 --cluster web --service api --desired-count 3\n"
    );
}

#[test]
fn test_shrunken_topology_leaves_no_stale_steps() {
    let root = tempfile::tempdir().unwrap();
    let config = MaintenanceConfig::default();

    let full = OperatorContext::resolve("alice", &fixture(), "MNT-1", root.path()).unwrap();
    run_pipeline(MAINTENANCE_RUNBOOK, &full, &config).unwrap();
    fs::write(full.output_dir.join("1-notes.md"), "paged the DBA").unwrap();

    let json = r#"{ "regions": [ { "name": "ap-east-1", "ecs_clusters": [
        { "name": "web", "services": [
            { "name": "api", "desired_count": 3, "maintenance_id": "MNT-1" } ] } ] } ] }"#;
    let small = resolve(root.path(), json, "alice");
    let report = run_pipeline(MAINTENANCE_RUNBOOK, &small, &config).unwrap();
    assert_eq!(report.realized_count(), 4);

    let files = read_dir_contents(&small.output_dir);
    assert_eq!(
        files.keys().cloned().collect::<Vec<_>>(),
        vec![
            "1-generate-commands-for-updating-ecs-task-count-to-0",
            "1-notes.md",
            "2-generate-commands-for-restarting-ecs-service",
            "3-generate-commands-for-updating-ecs-task-count-to-resume",
            "4-generate-commands-for-querying-ecs-task-status",
        ]
    );
    assert!(!files.values().any(|content| content.contains("--service worker")));
}

// =============================================================================
// Determinism and Baselines
// =============================================================================

#[test]
fn test_rerun_is_byte_identical() {
    let root = tempfile::tempdir().unwrap();
    let config = MaintenanceConfig::default();
    let ctx = OperatorContext::resolve("alice", &fixture(), "MNT-1", root.path()).unwrap();

    run_pipeline(MAINTENANCE_RUNBOOK, &ctx, &config).unwrap();
    let first = read_dir_contents(&ctx.output_dir);
    run_pipeline(MAINTENANCE_RUNBOOK, &ctx, &config).unwrap();
    let second = read_dir_contents(&ctx.output_dir);

    assert_eq!(first, second);
}

#[test]
fn test_restore_uses_each_baseline() {
    let root = tempfile::tempdir().unwrap();
    let ctx = OperatorContext::resolve("alice", &fixture(), "MNT-1", root.path()).unwrap();
    let report = run_pipeline(MAINTENANCE_RUNBOOK, &ctx, &MaintenanceConfig::default()).unwrap();

    let restore = report
        .realized()
        .find(|e| e.description == "generate commands for updating ecs task count to resume")
        .unwrap();
    assert_eq!(
        restore.commands,
        vec![
            "aws ecs update-service --region ap-east-1 --cluster web --service api --desired-count 7",
            "aws ecs update-service --region ap-east-1 --cluster web --service worker --desired-count 2",
        ]
    );

    let zero = report
        .realized()
        .find(|e| e.description == "generate commands for updating ecs task count to 0")
        .unwrap();
    assert!(zero.commands.iter().all(|c| c.ends_with("--desired-count 0")));

    let statefulsets = report
        .realized()
        .find(|e| e.description == "generate commands for updating k8s statefulset replicas to resume")
        .unwrap();
    assert_eq!(
        statefulsets.commands,
        vec!["kubectl --context core --namespace shop scale statefulset/redis --replicas=3"]
    );
}

#[test]
fn test_dumps_before_and_after_do_not_collide() {
    let root = tempfile::tempdir().unwrap();
    let ctx = OperatorContext::resolve("alice", &fixture(), "MNT-1", root.path()).unwrap();
    let report = run_pipeline(MAINTENANCE_RUNBOOK, &ctx, &MaintenanceConfig::default()).unwrap();

    let pg_dumps: Vec<&String> = report
        .realized()
        .filter(|e| e.description == "generate commands for dumping pgstats")
        .flat_map(|e| e.commands.iter())
        .collect();
    assert_eq!(pg_dumps.len(), 2);
    assert_ne!(pg_dumps[0], pg_dumps[1]);
    assert!(pg_dumps[0].contains("host=orders.cluster-abc123.ap-east-1.rds.amazonaws.com"));
}

// =============================================================================
// Scoping
// =============================================================================

#[test]
fn test_other_maintenance_never_referenced() {
    let root = tempfile::tempdir().unwrap();
    let ctx = OperatorContext::resolve("alice", &fixture(), "MNT-1", root.path()).unwrap();
    run_pipeline(MAINTENANCE_RUNBOOK, &ctx, &MaintenanceConfig::default()).unwrap();

    for (name, content) in read_dir_contents(&ctx.output_dir) {
        for foreign in ["legacy", "cron", "checkout"] {
            assert!(!content.contains(foreign), "{} references {}", name, foreign);
        }
    }
}

#[test]
fn test_operator_sees_own_assignments() {
    let root = tempfile::tempdir().unwrap();
    let config = MaintenanceConfig::default();

    let alice = OperatorContext::resolve("alice", &fixture(), "MNT-1", root.path()).unwrap();
    let bob = OperatorContext::resolve("bob", &fixture(), "MNT-1", root.path()).unwrap();
    run_pipeline(MAINTENANCE_RUNBOOK, &alice, &config).unwrap();
    run_pipeline(MAINTENANCE_RUNBOOK, &bob, &config).unwrap();

    let alice_all: String = read_dir_contents(&alice.output_dir).into_values().collect();
    let bob_all: String = read_dir_contents(&bob.output_dir).into_values().collect();

    assert!(alice_all.contains("--service worker"));
    assert!(!alice_all.contains("standby"));
    assert!(bob_all.contains("deployment/standby"));
    assert!(!bob_all.contains("--service worker"));
    assert_eq!(alice.output_dir, root.path().join("alice"));
    assert_eq!(bob.output_dir, root.path().join("bob"));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_unknown_maintenance_id_writes_nothing() {
    let root = tempfile::tempdir().unwrap();
    let result = OperatorContext::resolve("alice", &fixture(), "MNT-404", root.path());
    assert!(matches!(result, Err(MaintenanceError::UnknownMaintenanceId(_))));
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn test_malformed_snapshot_file() {
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join("broken.json");
    fs::write(&path, "{ \"regions\": 42 }").unwrap();
    let result = OperatorContext::resolve("alice", &path, "MNT-1", &root.path().join("dist"));
    assert!(matches!(result, Err(MaintenanceError::MalformedSnapshot(_))));
    assert!(!root.path().join("dist").exists());
}

#[test]
fn test_unwritable_output_dir_is_fatal() {
    let root = tempfile::tempdir().unwrap();
    let mut ctx = OperatorContext::resolve("alice", &fixture(), "MNT-1", root.path()).unwrap();
    // A regular file where the directory should be; unlike a read-only
    // directory this fails for root too
    let blocker = root.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    ctx.output_dir = blocker;

    let result = run_pipeline(MAINTENANCE_RUNBOOK, &ctx, &MaintenanceConfig::default());
    assert!(matches!(result, Err(MaintenanceError::Io { .. })));
}

#[cfg(unix)]
#[test]
fn test_read_only_output_dir_is_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let root = tempfile::tempdir().unwrap();
    let ctx = OperatorContext::resolve("alice", &fixture(), "MNT-1", root.path()).unwrap();
    fs::set_permissions(&ctx.output_dir, fs::Permissions::from_mode(0o555)).unwrap();

    // root ignores directory permissions; nothing to check there
    let canary = ctx.output_dir.join("canary");
    if fs::write(&canary, "").is_ok() {
        fs::remove_file(&canary).unwrap();
        fs::set_permissions(&ctx.output_dir, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = run_pipeline(MAINTENANCE_RUNBOOK, &ctx, &MaintenanceConfig::default());
    fs::set_permissions(&ctx.output_dir, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(result, Err(MaintenanceError::Io { .. })));
    assert_eq!(fs::read_dir(&ctx.output_dir).unwrap().count(), 0);
}

#[test]
fn test_generation_error_aborts_and_keeps_earlier_files() {
    let json = r#"{ "regions": [ { "name": "ap-east-1",
        "databases": [
            { "identifier": "orders", "engine": "postgres", "engine_version": "14.6",
              "instance_class": "db.r6g.large", "target_engine_version": "13.9",
              "maintenance_id": "MNT-1" } ],
        "ecs_clusters": [ { "name": "web", "services": [
            { "name": "api", "desired_count": 3, "maintenance_id": "MNT-1" } ] } ] } ] }"#;
    let root = tempfile::tempdir().unwrap();
    let ctx = resolve(root.path(), json, "alice");

    let result = run_pipeline(MAINTENANCE_RUNBOOK, &ctx, &MaintenanceConfig::default());
    assert!(matches!(result, Err(MaintenanceError::StepGeneration { .. })));

    let files = read_dir_contents(&ctx.output_dir);
    assert!(files.contains_key("1-generate-commands-for-updating-ecs-task-count-to-0"));
    assert!(files.contains_key("2-generate-commands-for-dumping-pgstats"));
    assert!(!files.keys().any(|name| name.contains("modifying-database-engine-version")));
}
