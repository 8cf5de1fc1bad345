//! End-to-end tests for the cycle driver
//!
//! This test suite covers:
//! - Building a monitor set from a TOML config
//! - Tolerance and the recovery hooks across cycles
//! - Dependency skips cascading through a chain
//! - Exporting state after a cycle

use std::fs;
use tempfile::TempDir;
use vigil::checks::CheckRegistry;
use vigil::codec::decode_states;
use vigil::config::AgentConfig;
use vigil::models::MonitorState;
use vigil::orchestrator::MonitorSet;

fn load(config: &str) -> MonitorSet {
    let config = AgentConfig::parse(config).unwrap();
    MonitorSet::from_config(&config, &CheckRegistry::with_builtins()).unwrap()
}

#[test]
fn test_fail_monitor_crosses_tolerance_and_recovers() {
    let set = load(
        r#"
[agent]
hostname = "probe01"

[monitors.flaky]
type = "fail"
interval = 3
tolerance = 1
"#,
    );

    let mut vfc = Vec::new();
    for cycle in 0..4 {
        set.run_cycle(1_000 + cycle * 60);
        vfc.push(set.with_monitor("flaky", |m| m.data().virtual_fail_count()).unwrap());
    }
    // fails three times (the first absorbed), then succeeds
    assert_eq!(vfc, vec![0, 1, 2, 0]);

    set.with_monitor("flaky", |m| {
        let data = m.data();
        assert_eq!(data.state(), MonitorState::Ok);
        assert_eq!(data.failures(), 1);
        assert_eq!(data.last_virtual_fail_count(), 2);
        assert!(data.just_recovered());
    })
    .unwrap();
}

#[cfg(unix)]
#[test]
fn test_hooks_fire_on_edges_only() {
    let dir = TempDir::new().unwrap();
    let recover_marker = dir.path().join("recover");
    let recovered_marker = dir.path().join("recovered");

    let set = load(&format!(
        r#"
[agent]
hostname = "probe01"
hook_timeout_secs = 10

[monitors.flaky]
type = "fail"
interval = 2
recover_command = "touch {}"
recovered_command = "touch {}"
"#,
        recover_marker.display(),
        recovered_marker.display()
    ));

    set.run_cycle(1_000);
    assert!(recover_marker.exists());
    assert!(!recovered_marker.exists());
    assert_eq!(
        set.with_monitor("flaky", |m| m.data().recover_info().to_string()),
        Some("Command executed and returned 0".to_string())
    );

    fs::remove_file(&recover_marker).unwrap();
    set.run_cycle(1_060);
    assert!(!recover_marker.exists());

    set.run_cycle(1_120);
    assert!(recovered_marker.exists());
    assert_eq!(
        set.with_monitor("flaky", |m| m.data().recovered_info().to_string()),
        Some("Command executed and returned 0".to_string())
    );
}

#[test]
fn test_dependency_chain_skips_and_resumes() {
    let set = load(
        r#"
[agent]
hostname = "probe01"

[monitors.network]
type = "fail"
interval = 2

[monitors.db]
type = "null"
depend = "network"

[monitors.web]
type = "null"
depend = ["db"]
"#,
    );
    assert_eq!(set.waves().len(), 3);

    let report = set.run_cycle(1_000);
    assert_eq!(report.failed, vec!["network"]);
    assert_eq!(report.dependency_skipped.len(), 2);
    set.with_monitor("web", |m| {
        assert_eq!(m.data().state(), MonitorState::Skipped);
        assert_eq!(m.data().skip_dependency(), Some("db"));
        assert_eq!(m.data().tests_run(), 1);
    })
    .unwrap();

    set.run_cycle(1_060);
    let report = set.run_cycle(1_120);
    assert_eq!(report.passed, vec!["db", "network", "web"]);
}

#[test]
fn test_export_after_cycle() {
    let dir = TempDir::new().unwrap();
    let set = load(
        r#"
[agent]
hostname = "probe01"

[monitors.db]
type = "null"
gap = 300
"#,
    );
    set.run_cycle(1_000);
    let report = set.run_cycle(1_030);
    assert_eq!(report.throttled, vec!["db"]);

    let path = dir.path().join("state.json");
    fs::write(&path, set.export().unwrap()).unwrap();
    let states = decode_states(&fs::read(&path).unwrap()).unwrap();

    assert_eq!(states, set.snapshot());
    assert_eq!(states[0].state(), MonitorState::Skipped);
    assert_eq!(states[0].last_run_at(), Some(1_000));
}
