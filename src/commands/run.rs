use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::checks::CheckRegistry;
use crate::clock;
use crate::config::AgentConfig;
use crate::orchestrator::{CycleReport, MonitorSet};

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Run monitoring cycles until Ctrl-C or `cycles` cycles have completed.
pub fn execute(config_path: &Path, cycles: Option<u64>, export: Option<&Path>) -> Result<()> {
    let config = AgentConfig::load(config_path)?;
    let registry = CheckRegistry::with_builtins();
    let set = MonitorSet::from_config(&config, &registry)?;
    if set.is_empty() {
        bail!("No usable monitors in {}", config_path.display());
    }

    let running = Arc::new(AtomicBool::new(true));
    let running_for_signal = running.clone();
    ctrlc::set_handler(move || {
        running_for_signal.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    info!(
        monitors = set.len(),
        interval_secs = config.interval().as_secs(),
        "Starting monitoring"
    );

    let mut completed = 0u64;
    while running.load(Ordering::SeqCst) {
        let report = set.run_cycle(clock::epoch_secs());
        completed += 1;
        log_cycle(&set, &report);

        if let Some(path) = export {
            write_export(&set, path)?;
        }
        if cycles.is_some_and(|limit| completed >= limit) {
            break;
        }
        sleep_while_running(&running, config.interval());
    }

    info!(cycles = completed, "Stopped");
    Ok(())
}

fn log_cycle(set: &MonitorSet, report: &CycleReport) {
    for projection in set.projections(clock::now()) {
        if projection.vfc > 0 {
            warn!(
                monitor = %projection.name,
                failed_at = %projection.failed_at,
                downtime = %projection.downtime,
                vfc = projection.vfc,
                "{}",
                projection.info
            );
        } else {
            debug!(monitor = %projection.name, uptime = %projection.uptime, "ok");
        }
    }
    info!(
        passed = report.passed.len(),
        failed = report.failed.len(),
        throttled = report.throttled.len(),
        skipped = report.dependency_skipped.len(),
        "Cycle complete"
    );
}

/// Write the encoded state next to `path` and rename it into place.
fn write_export(set: &MonitorSet, path: &Path) -> Result<()> {
    let bytes = set.export()?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to move state to {}", path.display()))?;
    Ok(())
}

fn sleep_while_running(running: &AtomicBool, duration: Duration) {
    let deadline = Instant::now() + duration;
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(STOP_POLL_INTERVAL.min(deadline - now));
    }
}
