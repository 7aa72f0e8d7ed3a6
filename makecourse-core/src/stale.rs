//! The staleness oracle: decides whether a unit's documents must be
//! regenerated.
//!
//! Two-tier check. The fingerprint delta against the previous run is the
//! coarse gate: any semantic attribute change forces a rebuild. Only when
//! the fingerprint is unchanged do filesystem timestamps decide, catching
//! a deleted output or a source asset touched without changing any tracked
//! attribute.

use std::path::Path;
use std::time::SystemTime;

use walkdir::WalkDir;

/// Whether a unit must be rebuilt.
///
/// `outputs` are the absolute paths of the unit's declared output files;
/// `source_dirs` the directories containing everything it imported.
/// A missing output counts as infinitely old; a unit that imported nothing
/// has epoch-old sources.
pub fn should_rebuild(remains_unchanged: bool, outputs: &[&Path], source_dirs: &[&Path]) -> bool {
    if !remains_unchanged {
        return true;
    }

    let oldest_produced = outputs
        .iter()
        .map(|p| file_mtime(p))
        .min()
        .unwrap_or_else(SystemTime::now);

    let newest_source = source_dirs
        .iter()
        .map(|d| dir_mtime(d))
        .max()
        .unwrap_or(SystemTime::UNIX_EPOCH);

    newest_source > oldest_produced
}

fn file_mtime(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Latest modification time of any file below `dir` (recursive).
pub fn dir_mtime(dir: &Path) -> SystemTime {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .filter_map(|m| m.modified().ok())
        .max()
        .unwrap_or(SystemTime::UNIX_EPOCH)
}
