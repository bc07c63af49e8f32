// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the pagestamp pipeline.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PagestampError;

/// Millimetres per inch, used to turn paper sizes into pixel sizes.
pub const MM_PER_IN: f64 = 25.4;

/// Split `WIDTHxHEIGHT` style values into two floats.
fn parse_pair(value: &str) -> Option<(f64, f64)> {
    let (first, second) = value.split_once('x')?;
    let first = first.trim().parse::<f64>().ok()?;
    let second = second.trim().parse::<f64>().ok()?;
    if first.is_finite() && second.is_finite() {
        Some((first, second))
    } else {
        None
    }
}

/// Paper size in millimetres, parsed from `WIDTHxHEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaperSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PaperSize {
    /// US Letter, the default page size.
    pub const LETTER: Self = Self {
        width_mm: 215.9,
        height_mm: 279.4,
    };

    /// Pixel dimensions of this paper at `dpi`, truncated toward zero.
    pub fn pixels(&self, dpi: u32) -> PixelSize {
        PixelSize {
            width: (self.width_mm / MM_PER_IN * dpi as f64) as u32,
            height: (self.height_mm / MM_PER_IN * dpi as f64) as u32,
        }
    }
}

impl Default for PaperSize {
    fn default() -> Self {
        Self::LETTER
    }
}

impl FromStr for PaperSize {
    type Err = PagestampError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (width_mm, height_mm) = parse_pair(value).ok_or_else(|| {
            PagestampError::config(format!(
                "size must be in the format WIDTHxHEIGHT, got \"{value}\""
            ))
        })?;
        if width_mm <= 0.0 || height_mm <= 0.0 {
            return Err(PagestampError::config(format!(
                "size must be positive, got \"{value}\""
            )));
        }
        Ok(Self {
            width_mm,
            height_mm,
        })
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width_mm, self.height_mm)
    }
}

/// Pixel dimensions (width, height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Overlay margin expressed in percents of the overlay height, parsed from
/// `XPCTxYPCT`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginPct {
    pub x_pct: f64,
    pub y_pct: f64,
}

impl MarginPct {
    pub const fn new(x_pct: f64, y_pct: f64) -> Self {
        Self { x_pct, y_pct }
    }

    /// Resolve against an overlay height in pixels.
    pub fn to_pixels(&self, height: u32) -> PixelOffset {
        PixelOffset {
            x: (height as f64 * self.x_pct / 100.0) as u32,
            y: (height as f64 * self.y_pct / 100.0) as u32,
        }
    }
}

impl FromStr for MarginPct {
    type Err = PagestampError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (x_pct, y_pct) = parse_pair(value).ok_or_else(|| {
            PagestampError::config(format!(
                "margin must be in the format XPCTxYPCT, got \"{value}\""
            ))
        })?;
        if x_pct < 0.0 || y_pct < 0.0 {
            return Err(PagestampError::config(format!(
                "margin must be 0 or positive, got \"{value}\""
            )));
        }
        Ok(Self { x_pct, y_pct })
    }
}

impl fmt::Display for MarginPct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x_pct, self.y_pct)
    }
}

/// Pixel offset of an overlay from its gravity anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelOffset {
    pub x: u32,
    pub y: u32,
}

/// Named anchor position used for overlay placement and padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    NorthWest,
    North,
    NorthEast,
    West,
    Center,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Gravity {
    /// ImageMagick `-gravity` keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::NorthWest => "NorthWest",
            Self::North => "North",
            Self::NorthEast => "NorthEast",
            Self::West => "West",
            Self::Center => "Center",
            Self::East => "East",
            Self::SouthWest => "SouthWest",
            Self::South => "South",
            Self::SouthEast => "SouthEast",
        }
    }
}

impl FromStr for Gravity {
    type Err = PagestampError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalised: String = value
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalised.as_str() {
            "northwest" => Ok(Self::NorthWest),
            "north" => Ok(Self::North),
            "northeast" => Ok(Self::NorthEast),
            "west" => Ok(Self::West),
            "center" | "centre" => Ok(Self::Center),
            "east" => Ok(Self::East),
            "southwest" => Ok(Self::SouthWest),
            "south" => Ok(Self::South),
            "southeast" => Ok(Self::SouthEast),
            _ => Err(PagestampError::config(format!(
                "unknown gravity \"{value}\""
            ))),
        }
    }
}

impl fmt::Display for Gravity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Pipeline phase that produced an artifact. The prefix is part of the
/// on-disk naming contract `{STAGE}_{IDENTITY}.{ext}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Rendered page bitmap.
    Src,
    Resized,
    /// Header + body + footer.
    Merged,
    /// Label overlay image, one per distinct label value.
    Label,
    Labeled,
    /// Page-number overlay image, one per page.
    Number,
    Numbered,
}

impl Stage {
    /// Filename prefix for this stage.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Src => "SRC",
            Self::Resized => "RESIZED",
            Self::Merged => "MERGED",
            Self::Label => "LABEL",
            Self::Labeled => "LABELED",
            Self::Number => "NUMBER",
            Self::Numbered => "NUMBERED",
        }
    }

    /// Artifact filename for `identity` produced by this stage.
    pub fn file_name(&self, identity: &str) -> String {
        format!("{}_{}.png", self.prefix(), identity)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A stage output on storage together with its provenance.
///
/// The record is passed between stages by value so nothing ever has to parse
/// an identity back out of a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Stage that produced the file.
    pub stage: Stage,
    /// Provenance key: dot-stripped source stem, plus `-N` for rendered pages.
    pub identity: String,
    /// Original stem of the source document this artifact descends from.
    pub stem: String,
    /// Location of the file.
    pub path: PathBuf,
}

impl Artifact {
    /// Build the record for `identity` at `stage` inside `workdir`.
    pub fn new(
        stage: Stage,
        identity: impl Into<String>,
        stem: impl Into<String>,
        workdir: &Path,
    ) -> Self {
        let identity = identity.into();
        let path = workdir.join(stage.file_name(&identity));
        Self {
            stage,
            identity,
            stem: stem.into(),
            path,
        }
    }

    /// The next-generation artifact: same provenance, new stage.
    pub fn advance(&self, stage: Stage, workdir: &Path) -> Self {
        Self::new(stage, self.identity.clone(), self.stem.clone(), workdir)
    }

    /// Filename of the artifact (without directory).
    pub fn file_name(&self) -> String {
        self.stage.file_name(&self.identity)
    }
}

/// Filename stem: directory and extension removed.
pub fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Identity derived from a source stem. Dots are removed so every artifact
/// filename carries exactly one extension separator.
pub fn identity_of(stem: &str) -> String {
    stem.chars().filter(|c| *c != '.').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paper_size_parses_and_converts() {
        let size: PaperSize = "215.9x279.4".parse().unwrap();
        assert_eq!(size, PaperSize::LETTER);
        assert_eq!(
            size.pixels(300),
            PixelSize {
                width: 2550,
                height: 3300
            }
        );
    }

    #[test]
    fn paper_size_rejects_garbage() {
        assert!("215.9".parse::<PaperSize>().is_err());
        assert!("ax b".parse::<PaperSize>().is_err());
        assert!("0x279".parse::<PaperSize>().is_err());
        assert!("-1x279".parse::<PaperSize>().is_err());
    }

    #[test]
    fn margin_parses_and_resolves() {
        let margin: MarginPct = "70x125".parse().unwrap();
        assert_eq!(margin.to_pixels(165), PixelOffset { x: 115, y: 206 });
        assert!("-5x10".parse::<MarginPct>().is_err());
        assert!("0x0".parse::<MarginPct>().is_ok());
    }

    #[test]
    fn gravity_parses_loosely() {
        assert_eq!("south".parse::<Gravity>().unwrap(), Gravity::South);
        assert_eq!("SouthEast".parse::<Gravity>().unwrap(), Gravity::SouthEast);
        assert_eq!("north-west".parse::<Gravity>().unwrap(), Gravity::NorthWest);
        assert!("up".parse::<Gravity>().is_err());
    }

    #[test]
    fn artifact_names_follow_stage_convention() {
        let workdir = Path::new("/tmp/work");
        let src = Artifact::new(Stage::Src, "L1-VENDOR-1", "L1-VENDOR", workdir);
        assert_eq!(src.file_name(), "SRC_L1-VENDOR-1.png");

        let resized = src.advance(Stage::Resized, workdir);
        assert_eq!(resized.path, workdir.join("RESIZED_L1-VENDOR-1.png"));
        assert_eq!(resized.stem, "L1-VENDOR");
    }

    #[test]
    fn identity_strips_dots() {
        assert_eq!(identity_of("report.v2.final"), "reportv2final");
        assert_eq!(stem_of(Path::new("dir/a.b.pdf")), "a.b");
    }
}
