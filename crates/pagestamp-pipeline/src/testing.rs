// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test doubles: a tool runner that records invocations and fabricates the
// files real tools would have written.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use pagestamp_core::error::{PagestampError, Result};
use pagestamp_tools::{Ghostscript, ImageMagick, Invocation, ToolRunner};

use crate::stages::Tools;

#[derive(Debug, Default)]
pub(crate) struct FakeRunner {
    /// Pages to fabricate per source file name. Unlisted sources get one.
    pages: HashMap<String, usize>,
    /// Invocations of this tool fail instead of writing output.
    failing_tool: Option<&'static str>,
    log: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub(crate) fn with_pages(pages: &[(&str, usize)]) -> Self {
        Self {
            pages: pages.iter().map(|(name, n)| (name.to_string(), *n)).collect(),
            ..Default::default()
        }
    }

    pub(crate) fn failing(mut self, tool: &'static str) -> Self {
        self.failing_tool = Some(tool);
        self
    }

    pub(crate) fn invocations(&self) -> Vec<Invocation> {
        self.log.lock().unwrap().clone()
    }

    /// Recorded invocations whose arguments contain `arg`.
    pub(crate) fn invocations_with(&self, arg: &str) -> Vec<Invocation> {
        self.invocations()
            .into_iter()
            .filter(|inv| inv.args_lossy().iter().any(|a| a == arg))
            .collect()
    }

    fn fabricate_pages(&self, pattern: &str, source: &str) {
        let name = Path::new(source)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let count = self.pages.get(&name).copied().unwrap_or(1);
        for page in 1..=count {
            let path = pattern.replace("%d", &page.to_string()).replace("%%", "%");
            std::fs::write(path, b"page").unwrap();
        }
    }
}

impl ToolRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        self.log.lock().unwrap().push(invocation.clone());
        if self.failing_tool == Some(invocation.tool) {
            return Err(PagestampError::tool(invocation.tool, "exit status: 1"));
        }

        let args = invocation.args_lossy();
        let last = args.last().cloned().unwrap_or_default();
        match invocation.arg_with_prefix("-sOutputFile=") {
            Some(pattern) => self.fabricate_pages(&pattern, &last),
            None => std::fs::write(PathBuf::from(last), b"image").unwrap(),
        }
        Ok(())
    }
}

pub(crate) fn fake_tools(runner: Arc<FakeRunner>) -> Tools {
    Tools {
        rasterizer: Arc::new(Ghostscript::new("gs")),
        compositor: Arc::new(ImageMagick::Split {
            convert: "convert".into(),
            composite: "composite".into(),
        }),
        runner,
    }
}
