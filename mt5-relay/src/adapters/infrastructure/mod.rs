pub mod config_patcher;
pub mod housekeeping;
pub mod process_reaper;
pub mod state_purger;
pub mod terminal_paths;

pub use housekeeping::FilesystemHousekeeping;
pub use process_reaper::{KillOutcome, ProcessReaper};
pub use terminal_paths::TerminalPaths;
