pub mod offline_terminal;

pub use offline_terminal::OfflineTerminal;
