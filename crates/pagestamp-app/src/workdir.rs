// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Work directory lifecycle.

use std::path::{Path, PathBuf};

use pagestamp_core::error::Result;
use tempfile::TempDir;
use tracing::{debug, warn};

/// Where intermediate artifacts live for one run.
#[derive(Debug)]
pub enum WorkDir {
    /// Fresh temporary directory, removed on drop unless kept.
    Temporary(TempDir),
    /// User-supplied directory, never removed.
    Explicit(PathBuf),
}

impl WorkDir {
    pub fn create(explicit: Option<&Path>) -> Result<Self> {
        let dir = match explicit {
            Some(path) => {
                std::fs::create_dir_all(path)?;
                Self::Explicit(path.to_path_buf())
            }
            None => Self::Temporary(tempfile::Builder::new().prefix("pagestamp-").tempdir()?),
        };
        debug!(path = %dir.path().display(), "work directory");
        Ok(dir)
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Temporary(dir) => dir.path(),
            Self::Explicit(path) => path,
        }
    }

    /// Leave the directory on storage after a failed run.
    pub fn keep(self) -> PathBuf {
        let path = match self {
            Self::Temporary(dir) => dir.keep(),
            Self::Explicit(path) => path,
        };
        warn!(path = %path.display(), "intermediate files kept for inspection");
        path
    }
}
