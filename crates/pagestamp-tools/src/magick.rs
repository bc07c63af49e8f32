// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ImageMagick compositor.
//
// ImageMagick 7 ships a single `magick` binary (`magick convert ...`), while
// ImageMagick 6 installs `convert` and `composite` separately. Both layouts
// produce identical argument lists after the program prefix.

use std::path::{Path, PathBuf};

use pagestamp_core::types::{Gravity, PixelSize};

use crate::process::Invocation;
use crate::traits::{Compositor, TextStyle};

/// A discovered ImageMagick installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageMagick {
    /// ImageMagick 7 `magick` entry point.
    Unified(PathBuf),
    /// ImageMagick 6 standalone binaries.
    Split { convert: PathBuf, composite: PathBuf },
}

impl ImageMagick {
    fn convert(&self) -> Invocation {
        match self {
            Self::Unified(magick) => Invocation::new("convert", magick).arg("convert"),
            Self::Split { convert, .. } => Invocation::new("convert", convert),
        }
    }

    fn composite(&self) -> Invocation {
        match self {
            Self::Unified(magick) => Invocation::new("composite", magick).arg("composite"),
            Self::Split { composite, .. } => Invocation::new("composite", composite),
        }
    }
}

impl Compositor for ImageMagick {
    fn fit(&self, src: &Path, dst: &Path, size: PixelSize, gravity: Gravity, strip: bool) -> Invocation {
        let dims = size.to_string();
        let mut inv = self.convert().path(src);
        if strip {
            inv = inv.args(["(", "-strip", ")"]);
        }
        inv.args(["(", "-resize", dims.as_str(), ")"])
            .args(["(", "-gravity", gravity.keyword(), "-extent", dims.as_str(), ")"])
            .path(dst)
    }

    fn append(&self, inputs: &[&Path], dst: &Path) -> Invocation {
        inputs
            .iter()
            .fold(self.convert().arg("-append"), |inv, input| inv.path(input))
            .arg("-strip")
            .path(dst)
    }

    fn text(&self, text: &str, dst: &Path, style: &TextStyle<'_>) -> Invocation {
        let mut inv = self.convert();
        if let Some(font) = style.font {
            inv = inv.args(["-font", font]);
        }
        inv.args(["-background", "none", "-fill", style.color])
            .arg("-size")
            .arg(style.size.to_string())
            .args(["-gravity", style.gravity.keyword()])
            .arg(format!("label:{}", escape_label(text)))
            .path(dst)
    }

    fn overlay(
        &self,
        overlay: &Path,
        background: &Path,
        dst: &Path,
        gravity: Gravity,
        dx: i64,
        dy: i64,
    ) -> Invocation {
        self.composite()
            .args(["-gravity", gravity.keyword()])
            .arg("-geometry")
            .arg(format!("{dx:+}{dy:+}"))
            .path(overlay)
            .path(background)
            .path(dst)
    }

    fn assemble(&self, pages: &[&Path], dst: &Path, size: PixelSize, dpi: u32) -> Invocation {
        let inv = self
            .convert()
            .args(["-format", "pdf", "-resize"])
            .arg(size.to_string())
            .args(["-units", "PixelsPerInch", "-density"])
            .arg(dpi.to_string());
        pages.iter().fold(inv, |inv, page| inv.path(page)).path(dst)
    }
}

/// Escape text for the `label:` coder, which expands `%` escapes and reads
/// a file when the text starts with `@`.
fn escape_label(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('%', "%%");
    if escaped.starts_with('@') {
        format!("\\{escaped}")
    } else {
        escaped
    }
}
