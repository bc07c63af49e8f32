// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagestamp-pipeline — Orchestration engine for the pagestamp pipeline.
//
// Sources are ordered by natural key, expanded into pages, and pushed
// through render → resize → merge → label → number → collect. Every stage
// fans its work out over a bounded pool and fans back in before the next
// stage starts.

pub mod driver;
pub mod natural;
pub mod output;
pub mod resolve;
pub mod scheduler;
pub mod sequence;
pub mod stages;

#[cfg(test)]
pub(crate) mod testing;

pub use driver::{Pipeline, PipelineReport};
pub use natural::NaturalKey;
pub use output::select_output_path;
pub use resolve::resolve_sources;
pub use scheduler::WorkItem;
pub use sequence::PageSequence;
pub use stages::{StageRunner, Tools};
