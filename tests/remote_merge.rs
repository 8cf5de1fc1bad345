//! Remote agents reporting into an aggregator
//!
//! A "remote" monitor set runs its checks and exports state; the aggregator
//! merges the bytes without running anything itself.

use chrono::Duration;
use std::sync::Arc;
use std::thread;
use vigil::checks::CheckRegistry;
use vigil::clock;
use vigil::codec::{decode_value, WireValue, DATETIME_TAG, MONITORSTATE_TAG};
use vigil::config::AgentConfig;
use vigil::models::MonitorState;
use vigil::orchestrator::MonitorSet;

const REMOTE_CONFIG: &str = r#"
[agent]
hostname = "remote01"

[monitors.disk]
type = "fail"
interval = 4
tolerance = 1
failure_doc = "Vérifier le disque"

[monitors.load]
type = "null"
"#;

fn remote_agent() -> MonitorSet {
    let config = AgentConfig::parse(REMOTE_CONFIG).unwrap();
    MonitorSet::from_config(&config, &CheckRegistry::with_builtins()).unwrap()
}

#[test]
fn test_aggregator_sees_remote_failure() {
    let remote = remote_agent();
    remote.run_cycle(1_000);
    remote.run_cycle(1_060);

    let bytes = remote.export().unwrap();
    assert!(bytes.is_ascii());

    let aggregator = MonitorSet::new("central", std::time::Duration::from_secs(5));
    let registry = CheckRegistry::with_builtins();
    let merged = aggregator.merge_remote(&bytes, &registry).unwrap();
    assert_eq!(merged, vec!["disk", "load"]);
    assert_eq!(aggregator.remote_snapshot(), remote.snapshot());

    let disk = aggregator
        .with_remote("disk", |m| {
            (
                m.data().state(),
                m.data().virtual_fail_count(),
                m.data().settings().failure_doc.clone(),
                m.describe(),
            )
        })
        .unwrap();
    assert_eq!(disk.0, MonitorState::Failed);
    assert_eq!(disk.1, 1);
    assert_eq!(disk.2.as_deref(), Some("Vérifier le disque"));
    assert_eq!(disk.3, "A monitor which always fails.");

    let first_failure = aggregator
        .with_remote("disk", |m| m.data().first_failure_time())
        .flatten()
        .unwrap();
    let projections = aggregator.projections(first_failure + Duration::seconds(65));
    let disk = projections.iter().find(|p| p.name == "disk").unwrap();
    assert!(disk.is_remote);
    assert_eq!(disk.host, "remote01");
    assert_eq!(disk.downtime, "0+00:01:05");
    assert_eq!(disk.info, "This monitor always fails.");
}

#[test]
fn test_exported_state_is_tagged() {
    let remote = remote_agent();
    remote.run_cycle(1_000);

    let value = decode_value(&remote.export().unwrap()).unwrap();
    let WireValue::List(items) = value else {
        panic!("expected a list of monitors");
    };
    assert_eq!(items.len(), 2);

    let load = &items[1];
    assert_eq!(load.get("state").and_then(WireValue::as_state), Some(MonitorState::Ok));
    assert!(load.get("uptime_start").and_then(WireValue::as_timestamp).is_some());

    let raw: serde_json::Value = serde_json::from_slice(&remote.export().unwrap()).unwrap();
    assert_eq!(raw[1]["state"][MONITORSTATE_TAG], "OK");
    assert!(raw[1]["first_load_at"][DATETIME_TAG].is_string());
}

#[test]
fn test_merges_interleave_with_reads() {
    let aggregator = Arc::new(MonitorSet::new("central", std::time::Duration::from_secs(5)));
    let registry = Arc::new(CheckRegistry::with_builtins());
    let remote = remote_agent();

    let mut payloads = Vec::new();
    for cycle in 0..5 {
        remote.run_cycle(1_000 + cycle * 60);
        payloads.push(remote.export().unwrap());
    }
    let last = remote.snapshot();

    let writer = {
        let aggregator = Arc::clone(&aggregator);
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for bytes in payloads {
                aggregator.merge_remote(&bytes, &registry).unwrap();
            }
        })
    };
    let reader = {
        let aggregator = Arc::clone(&aggregator);
        thread::spawn(move || {
            for _ in 0..50 {
                for projection in aggregator.projections(clock::now()) {
                    assert_eq!(projection.host, "remote01");
                }
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(aggregator.remote_snapshot(), last);
}
