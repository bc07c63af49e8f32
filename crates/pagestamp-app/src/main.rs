// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagestamp — collect pages from PDF files into one annotated PDF.
//
// Parses the command line, discovers Ghostscript and ImageMagick, resolves
// the configuration and sources, and drives the pipeline inside a work
// directory. Any failure is logged and turns into exit status 1.

mod cli;
mod workdir;

use std::process::ExitCode;

use clap::Parser;
use pagestamp_core::PipelineConfig;
use pagestamp_core::error::Result;
use pagestamp_pipeline::{Pipeline, Tools, resolve_sources, select_output_path};
use pagestamp_tools::Toolchain;
use tracing::{debug, error, info};

use crate::cli::Cli;
use crate::workdir::WorkDir;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_filter())),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(cli));
    // Tasks still running after a fail-fast error are not waited for.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = PipelineConfig::resolve(&cli.options())?;
    debug!(config = %config.to_json()?, "resolved configuration");

    let toolchain = Toolchain::discover()?;
    let sources = resolve_sources(&cli.sources, cli.keep_order)?;
    let output = select_output_path(&cli.output, cli.numbered_output);

    let workdir = WorkDir::create(cli.tempdir.as_deref())?;
    let pipeline = Pipeline::new(config, workdir.path(), Tools::from_toolchain(toolchain));

    match pipeline.run(&sources, &output).await {
        Ok(report) => {
            info!(
                pages = report.pages.len(),
                "written to {}",
                report.output.display()
            );
            Ok(())
        }
        Err(err) => {
            workdir.keep();
            Err(err)
        }
    }
}
