//! Collision-free target paths within one pass.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::NamingError;

/// Upper bound on numbered candidates tried for one desired path.
pub const MAX_CONFLICT_ATTEMPTS: u32 = 10_000;

/// Hands out target paths that exist neither on disk nor earlier in the pass.
///
/// Renames happen one after another inside a pass, so every path handed out
/// is remembered until the resolver is dropped.
#[derive(Debug, Default)]
pub struct ConflictResolver {
    claimed: HashSet<PathBuf>,
}

impl ConflictResolver {
    /// Create an empty resolver for a new pass.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `desired` to a free path and claim it.
    ///
    /// Tries `desired` first, then `<stem>_2.<ext>`, `<stem>_3.<ext>`, ...
    ///
    /// # Errors
    ///
    /// Returns [`NamingError::Conflict`] if no free candidate is found within
    /// [`MAX_CONFLICT_ATTEMPTS`].
    pub fn resolve(&mut self, desired: &Path) -> Result<PathBuf, NamingError> {
        if self.is_free(desired) {
            self.claimed.insert(desired.to_path_buf());
            return Ok(desired.to_path_buf());
        }

        for n in 2..=MAX_CONFLICT_ATTEMPTS {
            let candidate = numbered(desired, n);
            if self.is_free(&candidate) {
                tracing::debug!(
                    desired = %desired.display(),
                    resolved = %candidate.display(),
                    "Target name taken, using numbered variant"
                );
                self.claimed.insert(candidate.clone());
                return Ok(candidate);
            }
        }

        Err(NamingError::Conflict {
            path: desired.display().to_string(),
            attempts: MAX_CONFLICT_ATTEMPTS,
        })
    }

    /// Number of paths claimed so far.
    #[must_use]
    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }

    fn is_free(&self, path: &Path) -> bool {
        !self.claimed.contains(path) && std::fs::symlink_metadata(path).is_err()
    }
}

/// `dir/stem.ext` -> `dir/stem_N.ext`.
fn numbered(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{n}"),
    };
    path.with_file_name(name)
}
