use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::clock;
use crate::codec::{decode_states, format_datetime};
use crate::models::{MonitorData, MonitorState};

/// Print a summary of every monitor in an exported state file.
pub fn execute(path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let states =
        decode_states(&bytes).with_context(|| format!("Failed to decode {}", path.display()))?;
    let now = clock::now();

    println!(
        "{}",
        format!("{} monitor(s) in {}", states.len(), path.display()).bold()
    );
    for data in &states {
        println!();
        print!("{}", render_monitor(data, now));
    }
    Ok(())
}

fn state_label(state: MonitorState) -> ColoredString {
    match state {
        MonitorState::Ok => state.name().green(),
        MonitorState::Failed => state.name().red().bold(),
        MonitorState::Skipped => state.name().yellow(),
        MonitorState::Unknown => state.name().dimmed(),
    }
}

fn render_monitor(data: &MonitorData, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} ({})",
        state_label(data.state()),
        data.name().bold(),
        data.type_tag()
    );
    let _ = writeln!(out, "  host:         {}", data.running_on());
    let _ = writeln!(
        out,
        "  tests run:    {} ({} failure episode(s))",
        data.tests_run(),
        data.failures()
    );
    let _ = writeln!(
        out,
        "  errors:       {} (virtual {})",
        data.error_count(),
        data.virtual_fail_count()
    );
    let _ = writeln!(
        out,
        "  availability: {:.2}%",
        data.availability(now) * 100.0
    );

    if data.is_passing() {
        let _ = writeln!(out, "  uptime:       {}", data.uptime_display(now));
    } else {
        let _ = writeln!(
            out,
            "  failed at:    {}",
            format_datetime(data.first_failure_time())
        );
        let _ = writeln!(out, "  downtime:     {}", data.downtime_display(now));
    }
    if let Some(dependency) = data.skip_dependency() {
        let _ = writeln!(out, "  skipped for:  {dependency}");
    }
    if !data.last_result().is_empty() {
        let _ = writeln!(out, "  last result:  {}", data.last_result());
    }
    if !data.recover_info().is_empty() {
        let _ = writeln!(out, "  recover:      {}", data.recover_info().dimmed());
    }
    if !data.recovered_info().is_empty() {
        let _ = writeln!(out, "  recovered:    {}", data.recovered_info().dimmed());
    }
    out
}
