// Location: mt5-relay/src/adapters/infrastructure/terminal_paths.rs
// Purpose: Resolve where the terminal keeps its configuration and account state
// Why: Besides the installation directory, the terminal keeps a per-user profile
//      under a hashed directory name that is only known after install; both
//      copies must be kept in sync.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::TerminalConfig;

/// Name of the configuration directory inside the installation directory
const INSTALL_CONFIG_DIR: &str = "Config";
/// Name of the configuration directory inside a profile directory
const PROFILE_CONFIG_DIR: &str = "config";
/// File in each profile naming the installation it belongs to (UTF-16LE)
const ORIGIN_FILE: &str = "origin.txt";

#[derive(Debug, Clone)]
pub struct TerminalPaths {
    install_dir: PathBuf,
    data_root: PathBuf,
    config_file: String,
    accounts_file: String,
}

impl TerminalPaths {
    pub fn new(
        install_dir: impl Into<PathBuf>,
        data_root: impl Into<PathBuf>,
        config_file: impl Into<String>,
        accounts_file: impl Into<String>,
    ) -> Self {
        Self {
            install_dir: install_dir.into(),
            data_root: data_root.into(),
            config_file: config_file.into(),
            accounts_file: accounts_file.into(),
        }
    }

    pub fn from_config(config: &TerminalConfig) -> Self {
        Self::new(
            &config.install_dir,
            expand_env_vars(&config.data_root),
            &config.config_file,
            &config.accounts_file,
        )
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Configuration files to patch: the installation copy first, then the
    /// profile copy if one was found.
    ///
    /// The installation path is returned even when it does not exist; callers
    /// skip missing files.
    pub fn config_locations(&self) -> Vec<PathBuf> {
        let mut locations = vec![self
            .install_dir
            .join(INSTALL_CONFIG_DIR)
            .join(&self.config_file)];
        if let Some(profile) = self.preferred_profile() {
            locations.push(profile.join(PROFILE_CONFIG_DIR).join(&self.config_file));
        }
        locations
    }

    /// Known-accounts artifacts: the installation copy plus one per profile
    pub fn accounts_locations(&self) -> Vec<PathBuf> {
        let mut locations = vec![self
            .install_dir
            .join(INSTALL_CONFIG_DIR)
            .join(&self.accounts_file)];
        locations.extend(
            self.profile_dirs()
                .into_iter()
                .map(|dir| dir.join(PROFILE_CONFIG_DIR).join(&self.accounts_file)),
        );
        locations
    }

    /// Profile directories under the data root that carry a config directory,
    /// in lexical order
    pub fn profile_dirs(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.data_root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Cannot read data root {:?}: {}", self.data_root, e);
                return Vec::new();
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.join(PROFILE_CONFIG_DIR).is_dir())
            .collect();
        dirs.sort();
        dirs
    }

    /// The profile whose configuration file should be patched.
    ///
    /// A profile whose `origin.txt` names the installation directory wins;
    /// otherwise the first profile holding a configuration file.
    pub fn preferred_profile(&self) -> Option<PathBuf> {
        let candidates: Vec<PathBuf> = self
            .profile_dirs()
            .into_iter()
            .filter(|dir| dir.join(PROFILE_CONFIG_DIR).join(&self.config_file).is_file())
            .collect();

        let install = normalize(&self.install_dir.to_string_lossy());
        let by_origin = candidates.iter().find(|dir| {
            fs::read(dir.join(ORIGIN_FILE))
                .ok()
                .and_then(|bytes| decode_origin_txt(&bytes))
                .map(|origin| normalize(&origin) == install)
                .unwrap_or(false)
        });

        match by_origin {
            Some(dir) => {
                tracing::debug!("Profile matched via origin.txt: {:?}", dir);
                Some(dir.clone())
            }
            None => candidates.into_iter().next(),
        }
    }
}

/// Decode `origin.txt`: UTF-16LE, usually with a BOM, sometimes NUL-padded
pub fn decode_origin_txt(content: &[u8]) -> Option<String> {
    let content = content.strip_prefix(&[0xFF, 0xFE]).unwrap_or(content);

    let units: Vec<u16> = content
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16(&units)
        .ok()
        .map(|s| s.trim_end_matches('\0').trim().to_string())
}

/// Expand `%VAR%` references from the environment. Unknown variables and a
/// lone `%` are left as written.
pub fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match std::env::var(name) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => {
                        out.push('%');
                        out.push_str(name);
                        out.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn normalize(path: &str) -> String {
    path.trim()
        .trim_end_matches(['\\', '/'])
        .replace('/', "\\")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16_with_bom(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    fn make_profile(root: &Path, hash: &str, with_config: bool) -> PathBuf {
        let dir = root.join(hash);
        fs::create_dir_all(dir.join("config")).unwrap();
        if with_config {
            fs::write(dir.join("config").join("common.ini"), "[Common]\n").unwrap();
        }
        dir
    }

    #[test]
    fn test_decode_origin_txt() {
        let decoded = decode_origin_txt(&utf16_with_bom("C:\\Program Files\\MetaTrader 5\0"));
        assert_eq!(decoded.as_deref(), Some(r"C:\Program Files\MetaTrader 5"));

        // Odd trailing byte is ignored
        let mut bytes = utf16_with_bom("D:\\MT5");
        bytes.push(0x41);
        assert_eq!(decode_origin_txt(&bytes).as_deref(), Some(r"D:\MT5"));
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("MT5_RELAY_TEST_APPDATA", "/home/trader/AppData");
        assert_eq!(
            expand_env_vars("%MT5_RELAY_TEST_APPDATA%/MetaQuotes/Terminal"),
            "/home/trader/AppData/MetaQuotes/Terminal"
        );
        assert_eq!(
            expand_env_vars("%MT5_RELAY_TEST_UNSET_VAR%/x"),
            "%MT5_RELAY_TEST_UNSET_VAR%/x"
        );
        assert_eq!(expand_env_vars("100% sure"), "100% sure");
        assert_eq!(expand_env_vars("%%"), "%%");
    }

    #[test]
    fn test_locations_without_profiles() {
        let install = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        let paths = TerminalPaths::new(install.path(), data.path(), "common.ini", "accounts.dat");

        assert_eq!(
            paths.config_locations(),
            vec![install.path().join("Config").join("common.ini")]
        );
        assert_eq!(
            paths.accounts_locations(),
            vec![install.path().join("Config").join("accounts.dat")]
        );
    }

    #[test]
    fn test_first_profile_in_lexical_order_is_used() {
        let install = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        make_profile(data.path(), "BBBB", true);
        let first = make_profile(data.path(), "AAAA", true);
        // Profile without a configuration file is never patched
        make_profile(data.path(), "0000", false);

        let paths = TerminalPaths::new(install.path(), data.path(), "common.ini", "accounts.dat");
        let locations = paths.config_locations();

        assert_eq!(locations.len(), 2);
        assert_eq!(locations[1], first.join("config").join("common.ini"));
    }

    #[test]
    fn test_origin_match_is_preferred() {
        let install = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        make_profile(data.path(), "AAAA", true);
        let owned = make_profile(data.path(), "ZZZZ", true);
        let origin = format!("{}\\", install.path().to_string_lossy().to_uppercase());
        fs::write(owned.join("origin.txt"), utf16_with_bom(&origin)).unwrap();

        let paths = TerminalPaths::new(install.path(), data.path(), "common.ini", "accounts.dat");
        assert_eq!(paths.preferred_profile(), Some(owned));
    }

    #[test]
    fn test_every_profile_is_purged() {
        let install = tempfile::tempdir().unwrap();
        let data = tempfile::tempdir().unwrap();
        let a = make_profile(data.path(), "AAAA", true);
        let b = make_profile(data.path(), "BBBB", false);
        fs::write(data.path().join("stray.txt"), "x").unwrap();

        let paths = TerminalPaths::new(install.path(), data.path(), "common.ini", "accounts.dat");
        let locations = paths.accounts_locations();

        assert_eq!(locations.len(), 3);
        assert!(locations.contains(&a.join("config").join("accounts.dat")));
        assert!(locations.contains(&b.join("config").join("accounts.dat")));
    }
}
