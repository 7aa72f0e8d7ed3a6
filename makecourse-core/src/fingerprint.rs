//! Content fingerprints and the cross-run cache.
//!
//! A unit's fingerprint is the set of `(attribute name, blake3 digest of
//! the value's string form)` pairs. Two fingerprints are equal iff the
//! sets are equal: a changed, added or removed attribute all count as a
//! difference. The cache maps unit names to their fingerprints and is
//! persisted as JSON next to the course file, one cache per input.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::notation::LangString;

/// Order-independent set of (attribute name, hex digest) pairs.
pub type Fingerprint = BTreeSet<(String, String)>;

/// Fingerprint a unit's effective attribute mapping.
pub fn fingerprint(attrs: &BTreeMap<String, LangString>) -> Fingerprint {
    attrs
        .iter()
        .map(|(name, value)| {
            let digest = blake3::hash(value.to_string().as_bytes());
            (name.clone(), digest.to_hex().to_string())
        })
        .collect()
}

/// Persisted fingerprints of the previous run's build candidates.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FingerprintCache {
    units: BTreeMap<String, BTreeMap<String, String>>,
}

impl FingerprintCache {
    /// Cache file for a course input, deterministic from its filename:
    /// `.<name>.makecourse.json` in the same directory.
    pub fn path_for(course_file: &Path) -> PathBuf {
        let name = course_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "course".to_string());
        let dir = course_file.parent().unwrap_or_else(|| Path::new("."));
        dir.join(format!(".{name}.makecourse.json"))
    }

    /// Load the previous run's cache. A missing or unreadable file is a
    /// cold start, not an error.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(cache) => cache,
                Err(err) => {
                    tracing::warn!("discarding unreadable cache {}: {}", path.display(), err);
                    FingerprintCache::default()
                }
            },
            Err(_) => FingerprintCache::default(),
        }
    }

    /// Persist the cache for the next run.
    pub fn store(&self, path: &Path) -> Result<(), BuildError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn insert(&mut self, name: &str, fp: &Fingerprint) {
        self.units
            .insert(name.to_string(), fp.iter().cloned().collect());
    }

    /// Strict fingerprint-set equality against the cached entry for `name`.
    /// Unknown names never match.
    pub fn matches(&self, name: &str, fp: &Fingerprint) -> bool {
        match self.units.get(name) {
            Some(cached) => {
                cached.len() == fp.len()
                    && fp.iter().all(|(k, v)| cached.get(k) == Some(v))
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
