//! Directory navigation (cd)

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Resolves `cd` targets against a session's working directory.
#[derive(Debug, Clone)]
pub struct DirectoryNavigator {
    home: PathBuf,
}

impl DirectoryNavigator {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Resolve `target` from `cwd`.
    ///
    /// Returns `Ok(None)` for an empty target (the cwd stays as it is),
    /// `Ok(Some(dir))` with the canonical directory on success, and
    /// [`Error::NotFound`] carrying the target as typed otherwise.
    pub async fn change_directory(&self, target: &str, cwd: &Path) -> Result<Option<PathBuf>> {
        let target = target.trim();
        if target.is_empty() {
            return Ok(None);
        }

        let candidate = self.resolve(target, cwd);
        let not_found = || Error::NotFound {
            target: target.to_string(),
        };

        let canonical = tokio::fs::canonicalize(&candidate)
            .await
            .map_err(|_| not_found())?;
        let metadata = tokio::fs::metadata(&canonical)
            .await
            .map_err(|_| not_found())?;

        if metadata.is_dir() {
            Ok(Some(canonical))
        } else {
            Err(not_found())
        }
    }

    /// Apply `~` substitution and make the target absolute, without touching
    /// the filesystem.
    ///
    /// Only `~` and `~/...` mean home; `~name` is taken as a literal name.
    pub fn resolve(&self, target: &str, cwd: &Path) -> PathBuf {
        let home_relative = match target.strip_prefix('~') {
            Some("") => Some(""),
            Some(rest) if rest.starts_with(['/', '\\']) => {
                Some(rest.trim_start_matches(['/', '\\']))
            }
            _ => None,
        };
        let expanded = match home_relative {
            Some("") => self.home.clone(),
            Some(rest) => self.home.join(rest),
            None => PathBuf::from(target),
        };

        if expanded.is_absolute() {
            expanded
        } else {
            cwd.join(expanded)
        }
    }
}
