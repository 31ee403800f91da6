use std::time::Duration;

use super::config_patcher;
use super::process_reaper::ProcessReaper;
use super::state_purger;
use super::terminal_paths::TerminalPaths;
use crate::config::{LifecycleConfig, TerminalConfig};
use crate::domain::models::Credentials;
use crate::ports::Housekeeping;

/// Housekeeping against the real filesystem and process table.
///
/// Locations are re-discovered on every call since the terminal creates its
/// profile directory on first launch.
pub struct FilesystemHousekeeping {
    paths: TerminalPaths,
    reaper: ProcessReaper,
}

impl FilesystemHousekeeping {
    pub fn new(paths: TerminalPaths, reaper: ProcessReaper) -> Self {
        Self { paths, reaper }
    }

    pub fn from_config(terminal: &TerminalConfig, lifecycle: &LifecycleConfig) -> Self {
        Self::new(
            TerminalPaths::from_config(terminal),
            ProcessReaper::new(
                &terminal.process_name,
                lifecycle.kill_timeout(),
                lifecycle.settle(),
            ),
        )
    }
}

impl Housekeeping for FilesystemHousekeeping {
    fn prepare_config(&self, credentials: &Credentials) {
        config_patcher::patch(&self.paths.config_locations(), credentials);
    }

    fn purge_accounts(&self) {
        state_purger::purge(&self.paths.accounts_locations());
    }

    fn kill_and_settle(&self) {
        self.reaper.kill_and_settle();
    }

    fn pause(&self, duration: Duration) {
        tracing::debug!("Waiting {:?} before retrying initialize", duration);
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_prepare_and_purge_touch_install_and_profile() {
        let install = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        let install_cfg = install.path().join("Config");
        let profile_cfg = data.path().join("D0E8209F77C8CF37AD8BF550E51FF075").join("config");
        fs::create_dir_all(&install_cfg).unwrap();
        fs::create_dir_all(&profile_cfg).unwrap();

        for dir in [&install_cfg, &profile_cfg] {
            fs::write(dir.join("common.ini"), "[Common]\nLogin=1\n[Experts]\nEnabled=0\n").unwrap();
            fs::write(dir.join("accounts.dat"), [0u8; 16]).unwrap();
        }

        let hk = FilesystemHousekeeping::new(
            TerminalPaths::new(install.path(), data.path(), "common.ini", "accounts.dat"),
            ProcessReaper::with_command("true", vec![], Duration::from_secs(1), Duration::ZERO),
        );

        hk.prepare_config(&Credentials {
            login: Some(555),
            server: None,
        });
        hk.purge_accounts();

        for dir in [&install_cfg, &profile_cfg] {
            assert_eq!(
                fs::read_to_string(dir.join("common.ini")).unwrap(),
                "[Common]\nLogin=555\n[Experts]\nEnabled=1\n"
            );
            assert!(!dir.join("accounts.dat").exists());
        }
    }
}
