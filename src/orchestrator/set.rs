use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::cycle::{tick, CycleReport, TickOutcome};
use super::graph::{dependency_waves, detect_cycles, unknown_dependencies, DependencyGraph};
use crate::checks::CheckRegistry;
use crate::codec::{decode_states, encode_states, StatusProjection};
use crate::config::AgentConfig;
use crate::error::ConfigError;
use crate::models::MonitorData;
use crate::runtime::Monitor;

type SharedMonitor = Arc<Mutex<Monitor>>;

/// The monitors one agent owns, plus the state merged in from remote agents.
///
/// Local monitors are scheduled by [`MonitorSet::run_cycle`]. Remote monitors
/// are never run here; their state only arrives through
/// [`MonitorSet::merge_remote`]. Each monitor sits behind its own lock, which
/// a tick or a merge holds for its whole duration.
pub struct MonitorSet {
    local_host: String,
    hook_timeout: Duration,
    monitors: BTreeMap<String, SharedMonitor>,
    waves: Vec<Vec<String>>,
    remote: RwLock<BTreeMap<String, SharedMonitor>>,
    rejected: Vec<(String, ConfigError)>,
}

impl MonitorSet {
    pub fn new(local_host: &str, hook_timeout: Duration) -> Self {
        Self {
            local_host: local_host.to_string(),
            hook_timeout,
            monitors: BTreeMap::new(),
            waves: Vec::new(),
            remote: RwLock::new(BTreeMap::new()),
            rejected: Vec::new(),
        }
    }

    /// Build every configured monitor.
    ///
    /// A monitor with bad options is logged and left out; a dependency cycle
    /// fails the whole set.
    pub fn from_config(config: &AgentConfig, registry: &CheckRegistry) -> Result<Self> {
        let mut set = Self::new(&config.hostname(), config.hook_timeout());

        for (name, options) in config.monitor_options()? {
            match registry.build(&name, &options, &set.local_host) {
                Ok(monitor) => {
                    set.monitors
                        .insert(name.clone(), Arc::new(Mutex::new(monitor)));
                }
                Err(e) => {
                    error!(monitor = %name, "Rejected monitor: {e}");
                    set.rejected.push((name, e));
                }
            }
        }

        set.rebuild_schedule()
            .context("Failed to order monitors by dependency")?;
        info!(
            monitors = set.monitors.len(),
            rejected = set.rejected.len(),
            host = %set.local_host,
            "Monitor set loaded"
        );
        Ok(set)
    }

    /// Add a local monitor. Rejects duplicate names and dependency cycles.
    pub fn insert(&mut self, monitor: Monitor) -> Result<()> {
        let name = monitor.name().to_string();
        if self.monitors.contains_key(&name) {
            bail!("Monitor {name} already exists");
        }
        self.monitors
            .insert(name.clone(), Arc::new(Mutex::new(monitor)));

        if let Err(e) = self.rebuild_schedule() {
            self.monitors.remove(&name);
            self.rebuild_schedule()?;
            return Err(e.context(format!("Cannot add monitor {name}")));
        }
        Ok(())
    }

    fn rebuild_schedule(&mut self) -> Result<()> {
        let graph: DependencyGraph = self
            .monitors
            .iter()
            .map(|(name, monitor)| (name.clone(), lock(monitor).data().dependencies().to_vec()))
            .collect();

        for (name, dep) in unknown_dependencies(&graph) {
            warn!(monitor = %name, dependency = %dep, "Depends on an unknown monitor; it will always be skipped");
        }
        detect_cycles(&graph)?;
        self.waves = dependency_waves(&graph)?;
        Ok(())
    }

    /// Run one scheduling cycle at `now` (epoch seconds).
    ///
    /// Dependencies are reset, then each wave runs with one thread per
    /// monitor. A wave starts only after every monitor of the previous wave
    /// has reported, so upstream results are always known.
    pub fn run_cycle(&self, now: i64) -> CycleReport {
        for monitor in self.monitors.values() {
            lock(monitor).data_mut().reset_dependencies();
        }

        let mut report = CycleReport::default();
        for wave in &self.waves {
            for (name, outcome) in self.run_wave(wave, now) {
                if outcome.satisfies_dependents() {
                    self.notify_dependents(&name);
                }
                report.record(name, outcome);
            }
        }
        report.sort();

        debug!(
            passed = report.passed.len(),
            failed = report.failed.len(),
            throttled = report.throttled.len(),
            skipped = report.dependency_skipped.len(),
            "Cycle finished"
        );
        report
    }

    fn run_wave(&self, wave: &[String], now: i64) -> Vec<(String, TickOutcome)> {
        let hook_timeout = self.hook_timeout;
        thread::scope(|scope| {
            let handles: Vec<_> = wave
                .iter()
                .filter_map(|name| self.monitors.get(name).map(|monitor| (name, monitor)))
                .map(|(name, monitor)| {
                    let handle = scope.spawn(move || tick(&mut lock(monitor), now, hook_timeout));
                    (name.clone(), handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(name, handle)| {
                    let outcome = handle.join().unwrap_or_else(|_| {
                        error!(monitor = %name, "Check panicked; counting as failed");
                        TickOutcome::Failed
                    });
                    (name, outcome)
                })
                .collect()
        })
    }

    fn notify_dependents(&self, succeeded: &str) {
        for (name, monitor) in &self.monitors {
            if name != succeeded {
                lock(monitor).data_mut().dependency_succeeded(succeeded);
            }
        }
    }

    /// Install state reported by a remote agent.
    ///
    /// Each entry replaces the remote monitor of the same name under that
    /// monitor's lock, keeping its check when the type is unchanged and
    /// rebuilding it from the registry otherwise. Entries that name a local
    /// monitor or an unregistered type are logged and dropped. Returns the
    /// names that were merged.
    pub fn merge_remote(&self, bytes: &[u8], registry: &CheckRegistry) -> Result<Vec<String>> {
        let states = decode_states(bytes).context("Failed to decode remote state")?;
        let mut merged = Vec::new();

        for data in states {
            let name = data.name().to_string();
            if self.monitors.contains_key(&name) {
                warn!(monitor = %name, host = %data.running_on(), "Remote state names a local monitor; ignored");
                continue;
            }

            match self.merge_one(data, registry) {
                Ok(()) => {
                    debug!(monitor = %name, "Merged remote state");
                    merged.push(name);
                }
                Err(e) => warn!(monitor = %name, "Cannot merge remote state: {e}"),
            }
        }

        Ok(merged)
    }

    // The name is looked up and, when new, installed under one write lock so
    // concurrent merges of a new name share a single monitor.
    fn merge_one(&self, data: MonitorData, registry: &CheckRegistry) -> Result<(), ConfigError> {
        let shared = match write_lock(&self.remote).entry(data.name().to_string()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(registry.restore(data)?)));
                return Ok(());
            }
        };

        let mut monitor = lock(&shared);
        if monitor.data().type_tag() == data.type_tag() {
            monitor.restore_state(data);
        } else {
            *monitor = registry.restore(data)?;
        }
        Ok(())
    }

    /// Wire-encoded state of every local monitor.
    pub fn export(&self) -> Result<Vec<u8>> {
        encode_states(&self.snapshot()).context("Failed to encode monitor state")
    }

    /// Copies of the local monitors' state, in name order.
    pub fn snapshot(&self) -> Vec<MonitorData> {
        self.monitors
            .values()
            .map(|monitor| lock(monitor).data().clone())
            .collect()
    }

    pub fn remote_snapshot(&self) -> Vec<MonitorData> {
        read_lock(&self.remote)
            .values()
            .map(|monitor| lock(monitor).data().clone())
            .collect()
    }

    /// Status projections for local then remote monitors.
    pub fn projections(&self, now: DateTime<Utc>) -> Vec<StatusProjection> {
        let mut projections: Vec<_> = self
            .monitors
            .values()
            .map(|monitor| lock(monitor).projection(&self.local_host, now))
            .collect();
        projections.extend(
            read_lock(&self.remote)
                .values()
                .map(|monitor| lock(monitor).projection(&self.local_host, now)),
        );
        projections
    }

    /// Run `f` against a local monitor while holding its lock.
    pub fn with_monitor<R>(&self, name: &str, f: impl FnOnce(&Monitor) -> R) -> Option<R> {
        self.monitors.get(name).map(|monitor| f(&lock(monitor)))
    }

    pub fn with_remote<R>(&self, name: &str, f: impl FnOnce(&Monitor) -> R) -> Option<R> {
        let shared = read_lock(&self.remote).get(name).cloned()?;
        let monitor = lock(&shared);
        Some(f(&monitor))
    }

    pub fn names(&self) -> Vec<&str> {
        self.monitors.keys().map(String::as_str).collect()
    }

    pub fn remote_names(&self) -> Vec<String> {
        read_lock(&self.remote).keys().cloned().collect()
    }

    pub fn waves(&self) -> &[Vec<String>] {
        &self.waves
    }

    /// Monitors dropped at load time, with the reason.
    pub fn rejected(&self) -> &[(String, ConfigError)] {
        &self.rejected
    }

    pub fn local_host(&self) -> &str {
        &self.local_host
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

// A panicking check poisons only its own monitor; the state is still usable.
fn lock(monitor: &Mutex<Monitor>) -> MutexGuard<'_, Monitor> {
    monitor.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
