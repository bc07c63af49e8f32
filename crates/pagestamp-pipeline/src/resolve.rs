// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Source resolution — turn command-line inputs into an ordered document list.

use std::path::{Path, PathBuf};

use pagestamp_core::error::{PagestampError, Result};
use tracing::{debug, instrument};

use crate::natural::sort_paths;

/// Expand `inputs` into the ordered list of source documents.
///
/// Directories contribute their `*.pdf` files in natural order; files are
/// taken as given. Unless `keep_order` is set the combined list is then
/// re-sorted by natural key. Nothing is deduplicated.
#[instrument(skip(inputs), fields(inputs = inputs.len()))]
pub fn resolve_sources(inputs: &[PathBuf], keep_order: bool) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();

    for input in inputs {
        if input.is_dir() {
            sources.extend(pdfs_in(input)?);
        } else if input.is_file() {
            sources.push(input.clone());
        } else {
            return Err(PagestampError::config(format!(
                "invalid source file/dir \"{}\"",
                input.display()
            )));
        }
    }

    if !keep_order {
        sort_paths(&mut sources);
    }

    debug!(?sources, "resolved sources");
    Ok(sources)
}

/// Visible `.pdf` files directly inside `dir`, naturally sorted.
fn pdfs_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let visible = path
            .file_name()
            .is_some_and(|n| !n.to_string_lossy().starts_with('.'));
        let is_pdf = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if visible && is_pdf && path.is_file() {
            found.push(path);
        }
    }
    sort_paths(&mut found);
    Ok(found)
}
