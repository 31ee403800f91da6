// Location: mt5-relay/src/adapters/infrastructure/process_reaper.rs
// Purpose: Force-terminate the terminal process and wait for the OS to settle
// Why: A lingering terminal keeps its IPC channel and its config files locked;
//      the settle wait is a coarse barrier, not a liveness check.

use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Exit code of the kill command when no process matched
#[cfg(windows)]
const NOT_FOUND_EXIT_CODE: i32 = 128;
#[cfg(not(windows))]
const NOT_FOUND_EXIT_CODE: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillOutcome {
    Killed,
    NotRunning,
    /// The kill command itself did not finish within the timeout
    TimedOut,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ProcessReaper {
    program: String,
    args: Vec<String>,
    kill_timeout: Duration,
    settle: Duration,
}

impl ProcessReaper {
    /// Reaper for the terminal image `process_name` using the platform's
    /// force-kill command
    pub fn new(process_name: &str, kill_timeout: Duration, settle: Duration) -> Self {
        let (program, args) = kill_command(process_name);
        Self::with_command(program, args, kill_timeout, settle)
    }

    pub fn with_command(
        program: impl Into<String>,
        args: Vec<String>,
        kill_timeout: Duration,
        settle: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            kill_timeout,
            settle,
        }
    }

    /// Run the kill command, tolerating every failure mode
    pub fn kill(&self) -> KillOutcome {
        let mut child = match Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return KillOutcome::Failed(format!("{}: {}", self.program, e)),
        };

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return KillOutcome::Killed,
                Ok(Some(status)) if status.code() == Some(NOT_FOUND_EXIT_CODE) => {
                    return KillOutcome::NotRunning
                }
                Ok(Some(status)) => return KillOutcome::Failed(format!("exited with {}", status)),
                Ok(None) if started.elapsed() >= self.kill_timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return KillOutcome::TimedOut;
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => return KillOutcome::Failed(e.to_string()),
            }
        }
    }

    /// Kill, then block for the settle interval regardless of the outcome
    pub fn kill_and_settle(&self) -> KillOutcome {
        let outcome = self.kill();
        match &outcome {
            KillOutcome::Killed => tracing::info!("Terminal process killed"),
            KillOutcome::NotRunning => tracing::info!("Terminal process was not running"),
            KillOutcome::TimedOut => tracing::warn!(
                "Kill command did not finish within {:?}",
                self.kill_timeout
            ),
            KillOutcome::Failed(reason) => tracing::warn!("Kill command failed: {}", reason),
        }

        tracing::debug!("Waiting {:?} for the terminal to settle", self.settle);
        std::thread::sleep(self.settle);
        outcome
    }
}

#[cfg(windows)]
fn kill_command(process_name: &str) -> (String, Vec<String>) {
    (
        "taskkill".to_string(),
        vec!["/F".to_string(), "/IM".to_string(), process_name.to_string()],
    )
}

#[cfg(not(windows))]
fn kill_command(process_name: &str) -> (String, Vec<String>) {
    (
        "pkill".to_string(),
        vec!["-KILL".to_string(), "-x".to_string(), process_name.to_string()],
    )
}
