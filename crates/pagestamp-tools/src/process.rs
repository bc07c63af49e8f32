// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// External process invocation.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use pagestamp_core::error::{PagestampError, Result};
use tracing::{debug, instrument};

use crate::traits::ToolRunner;

/// A fully described external command: which tool, which binary, which
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Tool name used in error messages ("ghostscript", "convert", ...).
    pub tool: &'static str,
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(tool: &'static str, program: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// Append a path argument.
    pub fn path(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    /// Arguments as lossy strings, for assertions and logs.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// The value following a `-sOutputFile=` style prefix, if present.
    pub fn arg_with_prefix(&self, prefix: &str) -> Option<String> {
        self.args_lossy()
            .into_iter()
            .find_map(|a| a.strip_prefix(prefix).map(str::to_owned))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs invocations as child processes, inheriting stdout and stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    #[instrument(skip_all, fields(tool = invocation.tool))]
    fn run(&self, invocation: &Invocation) -> Result<()> {
        debug!("Running {invocation}");
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|err| {
                PagestampError::tool(invocation.tool, format!("({invocation}) could not start: {err}"))
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(PagestampError::tool(
                invocation.tool,
                format!("({invocation}) failed ({status})"),
            ))
        }
    }
}
