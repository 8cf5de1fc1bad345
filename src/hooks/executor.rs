//! Child-process execution for recovery hooks.

use std::fmt;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Result of running one hook command.
///
/// Never an error: every way a hook can go wrong is described here and
/// recorded as text on the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// The command ran to completion (a signal-terminated process reports -1)
    Executed { exit_code: i32 },
    /// The command was killed after exceeding the timeout
    TimedOut { after: Duration },
    /// The command could not be started or waited for
    LaunchFailed(String),
}

impl HookOutcome {
    /// True only for a command that ran and exited 0.
    pub fn is_success(&self) -> bool {
        matches!(self, HookOutcome::Executed { exit_code: 0 })
    }
}

impl fmt::Display for HookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookOutcome::Executed { exit_code } => {
                write!(f, "Command executed and returned {exit_code}")
            }
            HookOutcome::TimedOut { after } => {
                write!(f, "Command timed out after {}s", after.as_secs())
            }
            HookOutcome::LaunchFailed(err) => write!(f, "Unable to run command: {err}"),
        }
    }
}

/// Split a hook command into an argument vector.
///
/// Plain whitespace splitting: no shell, no quoting, no escapes. An argument
/// containing spaces cannot be expressed.
pub fn split_command(command: &str) -> Vec<&str> {
    command.split_whitespace().collect()
}

/// Run `command` and wait for it, killing it after `timeout`.
pub fn run_command(command: &str, timeout: Duration) -> HookOutcome {
    let argv = split_command(command);
    let Some((program, args)) = argv.split_first() else {
        return HookOutcome::LaunchFailed("empty command".to_string());
    };

    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return HookOutcome::LaunchFailed(e.to_string()),
    };

    match child.wait_timeout(timeout) {
        Ok(Some(status)) => HookOutcome::Executed {
            exit_code: status.code().unwrap_or(-1),
        },
        Ok(None) => {
            kill_child_process(&mut child);
            HookOutcome::TimedOut { after: timeout }
        }
        Err(e) => {
            kill_child_process(&mut child);
            HookOutcome::LaunchFailed(e.to_string())
        }
    }
}

fn kill_child_process(child: &mut Child) {
    // the process may already have exited
    let _ = child.kill();
    let _ = child.wait();
}
