// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pagestamp.
//
// Every variant is fatal: the pipeline has no retry path and a failed run is
// recovered only by running it again.

use thiserror::Error;

/// Top-level error type for all pagestamp operations.
#[derive(Debug, Error)]
pub enum PagestampError {
    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Configuration(String),

    // -- External tools --
    #[error("{tool} not found: {detail}")]
    ToolNotFound { tool: String, detail: String },

    #[error("{tool} command failed: {detail}")]
    ToolInvocation { tool: String, detail: String },

    // -- Documents --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Scheduling --
    #[error("task {0} panicked")]
    TaskPanicked(String),

    // -- Storage --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PagestampError {
    /// Shorthand for building a [`PagestampError::Configuration`].
    pub fn config(detail: impl Into<String>) -> Self {
        Self::Configuration(detail.into())
    }

    /// Shorthand for building a [`PagestampError::ToolInvocation`].
    pub fn tool(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ToolInvocation {
            tool: tool.into(),
            detail: detail.into(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagestampError>;
