// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ghostscript rasteriser — renders every page of a PDF/PostScript document
// to a 24-bit PNG.

use std::path::{Path, PathBuf};

use crate::process::Invocation;
use crate::traits::Rasterizer;

/// Flags shared by every render: quiet, sandboxed, non-interactive, with
/// anti-aliased text and graphics.
const RENDER_FLAGS: &[&str] = &[
    "-q",
    "-dQUIET",
    "-dSAFER",
    "-dBATCH",
    "-dNOPAUSE",
    "-dNOPROMPT",
    "-dMaxBitMap=500000000",
    "-dAlignToPixels=0",
    "-dGridFitTT=2",
    "-sDEVICE=png16m",
    "-dTextAlphaBits=4",
    "-dGraphicsAlphaBits=4",
];

/// A discovered Ghostscript binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ghostscript {
    program: PathBuf,
}

impl Ghostscript {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Rasterizer for Ghostscript {
    fn rasterize(
        &self,
        source: &Path,
        dpi: u32,
        output_dir: &Path,
        file_prefix: &str,
    ) -> Invocation {
        // `%d` is Ghostscript's page placeholder; literal percents in the
        // prefix must be doubled.
        let pattern = output_dir.join(format!("{}-%d.png", file_prefix.replace('%', "%%")));
        let mut output_file = std::ffi::OsString::from("-sOutputFile=");
        output_file.push(pattern.as_os_str());

        Invocation::new("ghostscript", &self.program)
            .args(RENDER_FLAGS)
            .arg(format!("-r{dpi}"))
            .arg(output_file)
            .path(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_command_targets_page_pattern() {
        let gs = Ghostscript::new("/usr/bin/gs");
        let inv = gs.rasterize(Path::new("specs/L1-x.pdf"), 150, Path::new("/work"), "SRC_L1-x");
        let args = inv.args_lossy();

        assert_eq!(inv.tool, "ghostscript");
        assert_eq!(args.first().map(String::as_str), Some("-q"));
        assert!(args.contains(&"-sDEVICE=png16m".to_owned()));
        assert!(args.contains(&"-r150".to_owned()));
        assert_eq!(
            inv.arg_with_prefix("-sOutputFile=").as_deref(),
            Some("/work/SRC_L1-x-%d.png")
        );
        assert_eq!(args.last().map(String::as_str), Some("specs/L1-x.pdf"));
    }

    #[test]
    fn percent_in_prefix_is_escaped() {
        let gs = Ghostscript::new("gs");
        let inv = gs.rasterize(Path::new("a.pdf"), 300, Path::new("/w"), "SRC_50%off");
        assert_eq!(
            inv.arg_with_prefix("-sOutputFile=").as_deref(),
            Some("/w/SRC_50%%off-%d.png")
        );
    }
}
