// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output path selection.

use std::path::{Path, PathBuf};

use tracing::info;

/// Pick the path the collected document is written to.
///
/// Without `numbered`, `path` is used as is (and overwritten). With it, an
/// existing `path` is kept and the first free `{stem}.{n}.{ext}`, n ≥ 1,
/// is chosen instead.
pub fn select_output_path(path: &Path, numbered: bool) -> PathBuf {
    if !numbered || !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());

    let chosen = (1u64..)
        .map(|n| {
            let name = match &ext {
                Some(ext) => format!("{stem}.{n}.{ext}"),
                None => format!("{stem}.{n}"),
            };
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf());

    info!(
        requested = %path.display(),
        chosen = %chosen.display(),
        "output exists, writing numbered copy"
    );
    chosen
}
