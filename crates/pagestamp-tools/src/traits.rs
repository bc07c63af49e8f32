// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trait definitions for the two external services and the process runner.
//
// Rasterizer and Compositor only *describe* work as an `Invocation`; a
// `ToolRunner` performs it. Stages can therefore be exercised against a
// runner that records invocations instead of launching processes.

use std::path::Path;

use pagestamp_core::error::Result;
use pagestamp_core::types::{Gravity, PixelSize};

use crate::process::Invocation;

/// Converts one input document into one bitmap per page.
pub trait Rasterizer: Send + Sync {
    /// Render every page of `source` at `dpi` into `output_dir`, naming the
    /// pages `{file_prefix}-{N}.png` with N counting from 1.
    fn rasterize(&self, source: &Path, dpi: u32, output_dir: &Path, file_prefix: &str)
        -> Invocation;
}

/// Resize, concatenate, label, overlay and assemble images.
pub trait Compositor: Send + Sync {
    /// Shrink `src` to fit `size` and pad the canvas to exactly `size`,
    /// anchored at `gravity`. With `strip`, metadata is dropped.
    fn fit(&self, src: &Path, dst: &Path, size: PixelSize, gravity: Gravity, strip: bool)
        -> Invocation;

    /// Stack `inputs` top to bottom into `dst`.
    fn append(&self, inputs: &[&Path], dst: &Path) -> Invocation;

    /// Render `text` onto a transparent `size` canvas.
    fn text(&self, text: &str, dst: &Path, style: &TextStyle<'_>) -> Invocation;

    /// Composite `overlay` onto `background` at `gravity`, shifted by
    /// (`dx`, `dy`) pixels.
    fn overlay(
        &self,
        overlay: &Path,
        background: &Path,
        dst: &Path,
        gravity: Gravity,
        dx: i64,
        dy: i64,
    ) -> Invocation;

    /// Assemble `pages`, in order, into one paginated PDF.
    fn assemble(&self, pages: &[&Path], dst: &Path, size: PixelSize, dpi: u32) -> Invocation;
}

/// How a text overlay is drawn.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle<'a> {
    pub size: PixelSize,
    pub color: &'a str,
    pub font: Option<&'a str>,
    /// Alignment of the text inside its canvas.
    pub gravity: Gravity,
}

/// Executes invocations. Blocks until the tool exits.
pub trait ToolRunner: Send + Sync {
    /// Run `invocation`; a non-zero exit or a spawn failure is an error.
    fn run(&self, invocation: &Invocation) -> Result<()>;
}
