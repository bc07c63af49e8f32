// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stage runner — one method per pipeline stage.
//
// Each stage takes the current ordered artifact list, fans one invocation
// per artifact out over the bounded scheduler, and returns the next
// generation in the same order as its input. Completion order never leaks
// into the output list.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pagestamp_core::config::{BandConfig, LabelConfig, NumberConfig, PipelineConfig};
use pagestamp_core::error::{PagestampError, Result};
use pagestamp_core::types::{identity_of, stem_of, Artifact, Gravity, PixelSize, Stage};
use pagestamp_tools::probe;
use pagestamp_tools::{
    Compositor, Invocation, ProcessRunner, Rasterizer, TextStyle, ToolRunner, Toolchain,
};
use tracing::{debug, info, instrument, warn};

use crate::natural::NaturalKey;
use crate::scheduler::{self, WorkItem};
use crate::sequence::PageSequence;

const HEADER_FILE: &str = "__HEADER__.png";
const FOOTER_FILE: &str = "__FOOTER__.png";

/// The collaborators a stage runner delegates to.
#[derive(Clone)]
pub struct Tools {
    pub rasterizer: Arc<dyn Rasterizer>,
    pub compositor: Arc<dyn Compositor>,
    pub runner: Arc<dyn ToolRunner>,
}

impl Tools {
    /// Real tools: discovered binaries launched as child processes.
    pub fn from_toolchain(toolchain: Toolchain) -> Self {
        Self {
            rasterizer: Arc::new(toolchain.ghostscript),
            compositor: Arc::new(toolchain.magick),
            runner: Arc::new(ProcessRunner),
        }
    }
}

/// Overlay lookup for one decoration pass: page identity → overlay artifact.
#[derive(Debug, Default)]
pub struct LabelMap(HashMap<String, Artifact>);

impl LabelMap {
    fn insert(&mut self, page: &Artifact, overlay: Artifact) {
        self.0.insert(page.identity.clone(), overlay);
    }

    pub fn overlay_for(&self, page: &Artifact) -> Result<&Artifact> {
        self.0.get(&page.identity).ok_or_else(|| {
            PagestampError::config(format!("no overlay prepared for page {}", page.identity))
        })
    }
}

/// Runs individual stages inside one work directory.
pub struct StageRunner {
    config: PipelineConfig,
    workdir: PathBuf,
    tools: Tools,
}

impl StageRunner {
    pub fn new(config: PipelineConfig, workdir: impl Into<PathBuf>, tools: Tools) -> Self {
        Self {
            config,
            workdir: workdir.into(),
            tools,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    // -- Render ---------------------------------------------------------------

    /// Rasterise every source into one `SRC_` artifact per page.
    ///
    /// Pages are listed from the work directory after all renders finish and
    /// ordered by source, then by page index.
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub async fn render(&self, sources: &[PathBuf]) -> Result<Vec<Artifact>> {
        let planned = plan_identities(sources);
        self.remove_stale_pages(&planned)?;

        let items = planned
            .iter()
            .map(|source| {
                let prefix = format!("{}_{}", Stage::Src.prefix(), source.identity);
                let invocation =
                    self.tools
                        .rasterizer
                        .rasterize(&source.path, self.config.dpi, &self.workdir, &prefix);
                let runner = self.tools.runner.clone();
                let workdir = self.workdir.clone();
                let path = source.path.clone();
                let identity = source.identity.clone();
                WorkItem::new(identity.clone(), move || {
                    info!("Rendering {identity}...");
                    runner.run(&invocation)?;
                    cross_check_page_count(&path, &workdir, &identity);
                    Ok(())
                })
            })
            .collect();
        self.dispatch(items).await?;

        let names = file_names(&self.workdir)?;
        let mut pages = Vec::new();
        for source in &planned {
            let rendered = rendered_pages(&names, &source.identity);
            if rendered.is_empty() {
                return Err(PagestampError::tool(
                    "ghostscript",
                    format!("no pages rendered from {}", source.path.display()),
                ));
            }
            debug!(identity = %source.identity, pages = rendered.len(), "rendered");
            pages.extend(rendered.into_iter().map(|page_identity| {
                Artifact::new(Stage::Src, page_identity, source.stem.clone(), &self.workdir)
            }));
        }
        Ok(pages)
    }

    fn remove_stale_pages(&self, planned: &[PlannedSource]) -> Result<()> {
        let names = file_names(&self.workdir)?;
        for source in planned {
            for page in rendered_pages(&names, &source.identity) {
                let stale = self.workdir.join(Stage::Src.file_name(&page));
                debug!(path = %stale.display(), "removing stale page");
                std::fs::remove_file(stale)?;
            }
        }
        Ok(())
    }

    // -- Resize ---------------------------------------------------------------

    /// Fit each page into the body region, centered and padded.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub async fn resize(&self, pages: &[Artifact]) -> Result<Vec<Artifact>> {
        let body = self.config.body();
        self.map(pages, Stage::Resized, "Resizing", |src, dst| {
            Ok(self
                .tools
                .compositor
                .fit(&src.path, &dst.path, body, Gravity::Center, true))
        })
        .await
    }

    // -- Merge ----------------------------------------------------------------

    /// Attach the header above and the footer below every page. Each band is
    /// prepared once before the per-page loop.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub async fn merge(
        &self,
        pages: &[Artifact],
        header: Option<&BandConfig>,
        footer: Option<&BandConfig>,
    ) -> Result<Vec<Artifact>> {
        let header = header.map(|band| (band, self.workdir.join(HEADER_FILE)));
        let footer = footer.map(|band| (band, self.workdir.join(FOOTER_FILE)));

        let band_items = header
            .iter()
            .chain(footer.iter())
            .map(|(band, dst)| {
                let size = PixelSize {
                    width: self.config.page.width,
                    height: band.height,
                };
                info!("Resizing {} to {size}", band.image.display());
                let invocation =
                    self.tools
                        .compositor
                        .fit(&band.image, dst, size, Gravity::West, false);
                self.work(band.image.display().to_string(), "Preparing band", invocation)
            })
            .collect();
        self.dispatch(band_items).await?;

        let header = header.map(|(_, path)| path);
        let footer = footer.map(|(_, path)| path);
        self.map(pages, Stage::Merged, "Merging", |src, dst| {
            let mut inputs: Vec<&Path> = Vec::with_capacity(3);
            inputs.extend(header.as_deref());
            inputs.push(&src.path);
            inputs.extend(footer.as_deref());
            Ok(self.tools.compositor.append(&inputs, &dst.path))
        })
        .await
    }

    // -- Label ----------------------------------------------------------------

    /// Stamp each page with the label derived from its source stem. One
    /// label image is generated per distinct label value.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub async fn label(&self, pages: &[Artifact], label: &LabelConfig) -> Result<Vec<Artifact>> {
        let style = TextStyle {
            size: PixelSize {
                width: self.config.page.width,
                height: label.height,
            },
            color: &label.color,
            font: label.font.as_deref(),
            gravity: Gravity::East,
        };

        let mut by_value: HashMap<&str, Artifact> = HashMap::new();
        let mut label_map = LabelMap::default();
        let mut items = Vec::new();
        for page in pages {
            let text = label.label_for(&page.stem);
            let overlay = by_value.entry(text).or_insert_with(|| {
                let overlay = Artifact::new(Stage::Label, text, text, &self.workdir);
                let invocation = self.tools.compositor.text(text, &overlay.path, &style);
                items.push(self.work(format!("\"{text}\""), "Generating label", invocation));
                overlay
            });
            label_map.insert(page, overlay.clone());
        }
        debug!(labels = items.len(), "label images");
        self.dispatch(items).await?;

        let (dx, dy) = (-(label.margin.x as i64), label.margin.y as i64);
        self.map(pages, Stage::Labeled, "Labeling", |src, dst| {
            let overlay = label_map.overlay_for(src)?;
            Ok(self
                .tools
                .compositor
                .overlay(&overlay.path, &src.path, &dst.path, Gravity::South, dx, dy))
        })
        .await
    }

    // -- Number ---------------------------------------------------------------

    /// Stamp consecutive page numbers, assigned in list order before any
    /// work is dispatched.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub async fn number(&self, pages: &[Artifact], number: &NumberConfig) -> Result<Vec<Artifact>> {
        let numbers = PageSequence::new(number.start).assign(pages.len());
        if numbers.len() != pages.len() {
            return Err(PagestampError::config(format!(
                "page numbers starting at {} overflow for {} pages",
                number.start,
                pages.len()
            )));
        }

        let style = TextStyle {
            size: PixelSize {
                width: self.config.page.width,
                height: number.height,
            },
            color: &number.color,
            font: number.font.as_deref(),
            gravity: Gravity::Center,
        };

        let mut number_map = LabelMap::default();
        let mut items = Vec::with_capacity(pages.len());
        for (page, n) in pages.iter().zip(&numbers) {
            let text = n.to_string();
            let overlay = Artifact::new(Stage::Number, text.clone(), text.clone(), &self.workdir);
            let invocation = self.tools.compositor.text(&text, &overlay.path, &style);
            items.push(self.work(text, "Generating page number", invocation));
            number_map.insert(page, overlay);
        }
        self.dispatch(items).await?;

        let (dx, dy) = (number.margin.x as i64, number.margin.y as i64);
        self.map(pages, Stage::Numbered, "Numbering", |src, dst| {
            let overlay = number_map.overlay_for(src)?;
            Ok(self
                .tools
                .compositor
                .overlay(&overlay.path, &src.path, &dst.path, number.gravity, dx, dy))
        })
        .await
    }

    // -- Collect --------------------------------------------------------------

    /// Assemble the final pages, in order, into the output document.
    #[instrument(skip_all, fields(pages = pages.len(), output = %output.display()))]
    pub async fn collect(&self, pages: &[Artifact], output: &Path) -> Result<()> {
        let inputs: Vec<&Path> = pages.iter().map(|p| p.path.as_path()).collect();
        let invocation =
            self.tools
                .compositor
                .assemble(&inputs, output, self.config.page, self.config.dpi);
        info!("Collecting annotated pages into {}", output.display());
        let runner = self.tools.runner.clone();
        self.dispatch(vec![WorkItem::new("collect", move || runner.run(&invocation))])
            .await
    }

    // -- Helpers --------------------------------------------------------------

    /// Generic 1:1 stage: one invocation per page, output in input order.
    async fn map<F>(&self, pages: &[Artifact], next: Stage, verb: &'static str, build: F) -> Result<Vec<Artifact>>
    where
        F: Fn(&Artifact, &Artifact) -> Result<Invocation>,
    {
        let outputs: Vec<Artifact> = pages
            .iter()
            .map(|page| page.advance(next, &self.workdir))
            .collect();
        let items = pages
            .iter()
            .zip(&outputs)
            .map(|(src, dst)| Ok(self.work(dst.identity.clone(), verb, build(src, dst)?)))
            .collect::<Result<Vec<_>>>()?;
        self.dispatch(items).await?;
        Ok(outputs)
    }

    fn work(&self, label: String, verb: &'static str, invocation: Invocation) -> WorkItem {
        let runner = self.tools.runner.clone();
        WorkItem::new(label.clone(), move || {
            info!("{verb} {label}...");
            runner.run(&invocation)
        })
    }

    async fn dispatch(&self, items: Vec<WorkItem>) -> Result<()> {
        scheduler::run(items, self.config.concurrency).await
    }
}

/// A source document with the identity its artifacts will carry.
#[derive(Debug)]
struct PlannedSource {
    path: PathBuf,
    stem: String,
    identity: String,
}

/// Give every source a distinct identity. A repeated stem gets `~2`, `~3`, …
/// so concurrent renders never write the same files.
fn plan_identities(sources: &[PathBuf]) -> Vec<PlannedSource> {
    let mut used = HashSet::new();
    sources
        .iter()
        .map(|path| {
            let stem = stem_of(path);
            let base = identity_of(&stem);
            let mut identity = base.clone();
            let mut k = 2;
            while !used.insert(identity.clone()) {
                identity = format!("{base}~{k}");
                k += 1;
            }
            PlannedSource {
                path: path.clone(),
                stem,
                identity,
            }
        })
        .collect()
}

fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Page identities rendered for `identity`: files named exactly
/// `SRC_{identity}-{digits}.png`, in page order.
fn rendered_pages(names: &[String], identity: &str) -> Vec<String> {
    let mut pages: Vec<String> = names
        .iter()
        .filter_map(|name| {
            let index = name
                .strip_prefix(Stage::Src.prefix())?
                .strip_prefix('_')?
                .strip_prefix(identity)?
                .strip_prefix('-')?
                .strip_suffix(".png")?;
            (!index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
                .then(|| format!("{identity}-{index}"))
        })
        .collect();
    pages.sort_by_cached_key(|page| NaturalKey::new(page));
    pages
}

/// Compare the PDF's own page count with what was rendered. Mismatches are
/// logged only; sources lopdf cannot read are skipped.
fn cross_check_page_count(source: &Path, workdir: &Path, identity: &str) {
    let is_pdf = source
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return;
    }
    let expected = match probe::pdf_page_count(source) {
        Ok(expected) => expected,
        Err(err) => {
            debug!(source = %source.display(), error = %err, "skipping page count check");
            return;
        }
    };
    match file_names(workdir) {
        Ok(names) => {
            let rendered = rendered_pages(&names, identity).len();
            if rendered != expected {
                warn!(
                    source = %source.display(),
                    expected,
                    rendered,
                    "rendered page count differs from PDF page count"
                );
            }
        }
        Err(err) => debug!(error = %err, "could not list rendered pages"),
    }
}
