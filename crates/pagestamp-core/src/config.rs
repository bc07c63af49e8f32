// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.
//
// `PipelineOptions` carries the user-facing values (percents, millimetres);
// `PipelineConfig` is the immutable pixel-level configuration resolved from
// them once, before any stage runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PagestampError, Result};
use crate::types::{Gravity, MarginPct, PaperSize, PixelOffset, PixelSize};

/// Font used for overlays on Linux when none is configured.
pub const LINUX_DEFAULT_FONT: &str = "Bitstream-Vera-Sans-Bold";

/// User-facing pipeline settings, before resolution into pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Processing resolution.
    pub dpi: u32,
    /// Paper size in millimetres.
    pub size: PaperSize,
    /// Header image attached above each page.
    pub header: Option<PathBuf>,
    /// Header height in percents of the page height.
    pub header_height: f64,
    /// Footer image attached below each page.
    pub footer: Option<PathBuf>,
    /// Footer height in percents of the page height.
    pub footer_height: f64,
    /// Filename label separator. Labeling is enabled when set.
    pub label_sep: Option<String>,
    /// Label height in percents of the page height.
    pub label_height: f64,
    /// Margin around the label in percents of the label height.
    pub label_margin: MarginPct,
    pub label_color: String,
    pub label_font: Option<String>,
    /// First page number. Numbering is enabled when set.
    pub number_start: Option<u64>,
    /// Page-number height in percents of the page height.
    pub number_height: f64,
    /// Margin around the page number in percents of its height.
    pub number_margin: MarginPct,
    pub number_color: String,
    pub number_gravity: Gravity,
    /// Maximum number of concurrently running tool invocations.
    pub concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            dpi: 300,
            size: PaperSize::LETTER,
            header: None,
            header_height: 10.0,
            footer: None,
            footer_height: 20.0,
            label_sep: None,
            label_height: 5.0,
            label_margin: MarginPct::new(70.0, 125.0),
            label_color: "red".into(),
            label_font: None,
            number_start: None,
            number_height: 3.0,
            number_margin: MarginPct::new(0.0, 50.0),
            number_color: "black".into(),
            number_gravity: Gravity::South,
            concurrency: default_concurrency(),
        }
    }
}

/// Number of CPUs available to this process, or 1 if unknown.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// A header or footer band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandConfig {
    /// Source image as given by the user.
    pub image: PathBuf,
    /// Band height in pixels.
    pub height: u32,
}

/// Filename label overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelConfig {
    pub separator: String,
    pub height: u32,
    pub margin: PixelOffset,
    pub color: String,
    pub font: Option<String>,
}

impl LabelConfig {
    /// Label text for a source stem: everything before the first separator,
    /// or the whole stem when the separator does not occur.
    pub fn label_for<'a>(&self, stem: &'a str) -> &'a str {
        stem.split_once(self.separator.as_str())
            .map_or(stem, |(label, _)| label)
    }
}

/// Page-number overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberConfig {
    pub start: u64,
    pub height: u32,
    pub margin: PixelOffset,
    pub color: String,
    pub font: Option<String>,
    pub gravity: Gravity,
}

/// Immutable, pixel-resolved pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    pub dpi: u32,
    /// Full page size in pixels.
    pub page: PixelSize,
    pub header: Option<BandConfig>,
    pub footer: Option<BandConfig>,
    /// Height left for the rendered page between header and footer.
    pub body_height: u32,
    pub label: Option<LabelConfig>,
    pub number: Option<NumberConfig>,
    pub concurrency: usize,
}

impl PipelineConfig {
    /// Resolve user options into pixel dimensions, validating every value.
    pub fn resolve(options: &PipelineOptions) -> Result<Self> {
        if options.dpi == 0 {
            return Err(PagestampError::config("dpi must be positive"));
        }
        if options.concurrency == 0 {
            return Err(PagestampError::config("concurrency must be at least 1"));
        }

        let page = options.size.pixels(options.dpi);
        let share = |what: &str, pct: f64| -> Result<i64> {
            Ok((page.height as f64 * percent(what, pct)? / 100.0) as i64)
        };

        let header_height = if options.header.is_some() {
            share("header height", options.header_height)?
        } else {
            0
        };
        let footer_height = if options.footer.is_some() {
            share("footer height", options.footer_height)?
        } else {
            0
        };
        let body_height = page.height as i64 - header_height - footer_height;

        if header_height < 0 || footer_height < 0 || body_height <= 0 {
            return Err(PagestampError::config(format!(
                "some heights came out negative or empty: header:body:footer={header_height}:{body_height}:{footer_height}"
            )));
        }

        let header = options.header.as_ref().map(|image| BandConfig {
            image: image.clone(),
            height: header_height as u32,
        });
        let footer = options.footer.as_ref().map(|image| BandConfig {
            image: image.clone(),
            height: footer_height as u32,
        });

        let label = match &options.label_sep {
            None => None,
            Some(sep) if sep.is_empty() => {
                return Err(PagestampError::config("label separator must not be empty"));
            }
            Some(sep) => {
                let height = overlay_height("label", share("label height", options.label_height)?)?;
                Some(LabelConfig {
                    separator: sep.clone(),
                    height,
                    margin: options.label_margin.to_pixels(height),
                    color: options.label_color.clone(),
                    font: overlay_font(options.label_font.as_deref()),
                })
            }
        };

        let number = match options.number_start {
            None => None,
            Some(start) => {
                let height = overlay_height("page number", share("page number height", options.number_height)?)?;
                Some(NumberConfig {
                    start,
                    height,
                    margin: options.number_margin.to_pixels(height),
                    color: options.number_color.clone(),
                    font: overlay_font(options.label_font.as_deref()),
                    gravity: options.number_gravity,
                })
            }
        };

        Ok(Self {
            dpi: options.dpi,
            page,
            header,
            footer,
            body_height: body_height as u32,
            label,
            number,
            concurrency: options.concurrency,
        })
    }

    /// Pixel size of the body region.
    pub fn body(&self) -> PixelSize {
        PixelSize {
            width: self.page.width,
            height: self.body_height,
        }
    }

    /// Compact JSON rendering for debug logs.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A share of the page height must lie within `0..=100` percent.
fn percent(what: &str, pct: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&pct) {
        return Err(PagestampError::config(format!(
            "{what} must be between 0 and 100 percent, got {pct}"
        )));
    }
    Ok(pct)
}

fn overlay_height(what: &str, height: i64) -> Result<u32> {
    match u32::try_from(height) {
        Ok(height) if height > 0 => Ok(height),
        _ => Err(PagestampError::config(format!(
            "{what} height must be positive, got {height} pixels"
        ))),
    }
}

fn overlay_font(configured: Option<&str>) -> Option<String> {
    match configured {
        Some(font) => Some(font.to_owned()),
        None if cfg!(target_os = "linux") => Some(LINUX_DEFAULT_FONT.to_owned()),
        None => None,
    }
}
