// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagestamp-tools — The external collaborators of the pagestamp pipeline.
//
// Rasterisation is delegated to Ghostscript and every pixel operation to
// ImageMagick. This crate only builds their command lines, finds the
// binaries, and runs them; it never touches pixels itself.

pub mod discovery;
pub mod ghostscript;
pub mod magick;
pub mod probe;
pub mod process;
pub mod traits;

pub use discovery::Toolchain;
pub use ghostscript::Ghostscript;
pub use magick::ImageMagick;
pub use process::{Invocation, ProcessRunner};
pub use traits::{Compositor, Rasterizer, TextStyle, ToolRunner};
