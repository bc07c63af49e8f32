// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tool discovery — locate Ghostscript and ImageMagick before any work starts.
//
// Search order is `PATH` first, then the default Windows install locations.
// ImageMagick candidates are verified by their `-version` banner because
// Windows ships an unrelated `convert.exe` (a FAT-to-NTFS converter).

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use pagestamp_core::error::{PagestampError, Result};
use tracing::{debug, info, instrument};

use crate::ghostscript::Ghostscript;
use crate::magick::ImageMagick;

const GHOSTSCRIPT_NAMES: &[&str] = &["gs", "gswin64c", "gswin32c"];
const GHOSTSCRIPT_URL: &str = "https://www.ghostscript.com/";
const IMAGEMAGICK_URL: &str = "https://imagemagick.org";

/// The pair of external tools the pipeline needs.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub ghostscript: Ghostscript,
    pub magick: ImageMagick,
}

impl Toolchain {
    /// Find both tools or fail with [`PagestampError::ToolNotFound`].
    #[instrument]
    pub fn discover() -> Result<Self> {
        let ghostscript = find_ghostscript().ok_or_else(|| PagestampError::ToolNotFound {
            tool: "Ghostscript".into(),
            detail: format!("please install from {GHOSTSCRIPT_URL}"),
        })?;
        let magick = find_magick().ok_or_else(|| PagestampError::ToolNotFound {
            tool: "ImageMagick".into(),
            detail: format!("please install from {IMAGEMAGICK_URL}"),
        })?;

        info!(
            ghostscript = %ghostscript.program().display(),
            magick = ?magick,
            "external tools found"
        );
        Ok(Self { ghostscript, magick })
    }
}

fn find_ghostscript() -> Option<Ghostscript> {
    GHOSTSCRIPT_NAMES
        .iter()
        .find_map(|name| find_in_path(name))
        .or_else(|| {
            windows_install(Path::new("C:/Program Files/gs"), |dir| {
                first_file(&dir.join("bin"), |name| {
                    name.starts_with("gswin") && name.ends_with("c.exe")
                })
            })
        })
        .map(Ghostscript::new)
}

fn find_magick() -> Option<ImageMagick> {
    let unified = find_in_path("magick").or_else(|| {
        windows_install(Path::new("C:/Program Files"), |dir| {
            let name = dir.file_name()?.to_string_lossy().to_ascii_lowercase();
            if !name.starts_with("imagemagick") {
                return None;
            }
            Some(dir.join("magick.exe")).filter(|p| p.is_file())
        })
    });
    if let Some(magick) = unified.filter(|p| is_imagemagick(p)) {
        return Some(ImageMagick::Unified(magick));
    }

    let convert = find_in_path("convert").filter(|p| is_imagemagick(p))?;
    let composite = find_in_path("composite").filter(|p| is_imagemagick(p))?;
    Some(ImageMagick::Split { convert, composite })
}

/// Search `PATH` for an executable called `name`.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    search_dirs(env::split_paths(&path), name)
}

fn search_dirs(dirs: impl IntoIterator<Item = PathBuf>, name: &str) -> Option<PathBuf> {
    let candidates = executable_names(name);
    dirs.into_iter()
        .flat_map(|dir| candidates.iter().map(move |c| dir.join(c)))
        .find(|candidate| candidate.is_file())
}

fn executable_names(name: &str) -> Vec<OsString> {
    let mut names = vec![OsString::from(name)];
    if cfg!(windows) {
        names.push(OsString::from(format!("{name}.exe")));
    }
    names
}

/// Visit the subdirectories of a Windows install root in name order and
/// return the first hit of `probe`.
fn windows_install(root: &Path, probe: impl Fn(&Path) -> Option<PathBuf>) -> Option<PathBuf> {
    if !cfg!(windows) {
        return None;
    }
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs.iter().find_map(|dir| probe(dir))
}

fn first_file(dir: &Path, matches: impl Fn(&str) -> bool) -> Option<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .map(|n| matches(&n.to_string_lossy().to_ascii_lowercase()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files.into_iter().next()
}

/// True if `program -version` identifies itself as ImageMagick.
fn is_imagemagick(program: &Path) -> bool {
    match Command::new(program).arg("-version").output() {
        Ok(output) => {
            let banner = String::from_utf8_lossy(&output.stdout);
            let found = banner.contains("ImageMagick");
            debug!(program = %program.display(), found, "probed ImageMagick candidate");
            found
        }
        Err(err) => {
            debug!(program = %program.display(), error = %err, "candidate did not run");
            false
        }
    }
}
