// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline driver — chains the stages in their fixed order.
//
// render → resize → [merge] → [label] → [number] → collect. Optional stages
// are skipped when their configuration is absent; the list passed between
// stages is the only ordering authority.

use std::path::{Path, PathBuf};

use pagestamp_core::config::{BandConfig, PipelineConfig};
use pagestamp_core::error::{PagestampError, Result};
use pagestamp_core::types::Artifact;
use pagestamp_tools::probe;
use tracing::{debug, info, instrument};

use crate::stages::{StageRunner, Tools};

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Final page artifacts, in output order.
    pub pages: Vec<Artifact>,
    /// The assembled output document.
    pub output: PathBuf,
}

/// The whole annotation pipeline bound to one work directory.
pub struct Pipeline {
    stages: StageRunner,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, workdir: impl Into<PathBuf>, tools: Tools) -> Self {
        Self {
            stages: StageRunner::new(config, workdir, tools),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        self.stages.config()
    }

    /// Run every stage over `sources` (already in final order) and write
    /// the assembled document to `output`.
    ///
    /// Fails at the first stage error; later stages never start.
    #[instrument(skip_all, fields(sources = sources.len(), workdir = %self.stages.workdir().display()))]
    pub async fn run(&self, sources: &[PathBuf], output: &Path) -> Result<PipelineReport> {
        if sources.is_empty() {
            return Err(PagestampError::config("no source documents to process"));
        }
        let config = self.stages.config();
        for (role, band) in [("header", &config.header), ("footer", &config.footer)] {
            if let Some(band) = band {
                check_band(role, band)?;
            }
        }

        let mut pages = self.stages.render(sources).await?;
        info!(pages = pages.len(), "rendered");

        pages = self.stages.resize(&pages).await?;

        if config.header.is_some() || config.footer.is_some() {
            pages = self
                .stages
                .merge(&pages, config.header.as_ref(), config.footer.as_ref())
                .await?;
        }
        if let Some(label) = &config.label {
            pages = self.stages.label(&pages, label).await?;
        }
        if let Some(number) = &config.number {
            pages = self.stages.number(&pages, number).await?;
        }

        self.stages.collect(&pages, output).await?;
        info!(pages = pages.len(), output = %output.display(), "done");

        Ok(PipelineReport {
            pages,
            output: output.to_path_buf(),
        })
    }
}

/// Header and footer images must exist before any page is rendered. Their
/// dimensions are only logged; ImageMagick handles formats `image` cannot.
fn check_band(role: &str, band: &BandConfig) -> Result<()> {
    if !band.image.is_file() {
        return Err(PagestampError::config(format!(
            "{role} image \"{}\" does not exist",
            band.image.display()
        )));
    }
    match probe::image_size(&band.image) {
        Ok(size) => debug!(role, image = %band.image.display(), %size, target_height = band.height, "band image"),
        Err(err) => debug!(role, error = %err, "band image not decodable here"),
    }
    Ok(())
}
