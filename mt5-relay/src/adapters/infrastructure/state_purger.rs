use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Delete the terminal's known-accounts artifacts.
///
/// A missing file counts as purged. Any other failure (file locked, access
/// denied) is logged and the next location is tried. Returns the number of
/// files actually removed.
pub fn purge(locations: &[PathBuf]) -> usize {
    let mut removed = 0;
    for path in locations {
        match fs::remove_file(path) {
            Ok(()) => {
                removed += 1;
                tracing::info!("Deleted {:?}", path);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("Could not delete {:?}: {}", path, e);
            }
        }
    }
    removed
}
