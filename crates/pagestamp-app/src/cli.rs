// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface.

use std::path::PathBuf;

use clap::Parser;
use pagestamp_core::config::{PipelineOptions, default_concurrency};
use pagestamp_core::types::{Gravity, MarginPct, PaperSize};

/// Collect pages from PDF files into a single PDF, optionally adding a
/// header, a footer, a filename label and page numbers to every page.
#[derive(Parser, Debug)]
#[command(name = "pagestamp", version, about)]
pub struct Cli {
    /// Source PDF files or directories of PDF files
    #[arg(value_name = "PDF_OR_DIR", required = true)]
    pub sources: Vec<PathBuf>,

    /// Output PDF file
    #[arg(short, long, value_name = "PDF")]
    pub output: PathBuf,

    /// Keep the source order as given instead of sorting by name
    #[arg(long)]
    pub keep_order: bool,

    /// Processing resolution
    #[arg(long, default_value_t = 300)]
    pub dpi: u32,

    /// Paper size in millimetres
    #[arg(long, value_name = "WIDTHxHEIGHT", default_value = "215.9x279.4")]
    pub size: PaperSize,

    /// Header image to use
    #[arg(long, value_name = "IMAGE")]
    pub header: Option<PathBuf>,

    /// Header height in percents of the page height
    #[arg(long, value_name = "PCT", default_value_t = 10.0)]
    pub header_height: f64,

    /// Footer image to use
    #[arg(long, value_name = "IMAGE")]
    pub footer: Option<PathBuf>,

    /// Footer height in percents of the page height
    #[arg(long, value_name = "PCT", default_value_t = 20.0)]
    pub footer_height: f64,

    /// Filename label separator; labels are added when set
    #[arg(long, value_name = "SEPARATOR")]
    pub label_sep: Option<String>,

    /// Label height in percents of the page height
    #[arg(long, value_name = "PCT", default_value_t = 5.0)]
    pub label_height: f64,

    /// Margin around the label in percents of the label height
    #[arg(long, value_name = "XPCTxYPCT", default_value = "70x125")]
    pub label_margin: MarginPct,

    /// Label color
    #[arg(long, value_name = "COLOR", default_value = "red")]
    pub label_color: String,

    /// Font for labels and page numbers ("magick -list font" lists them)
    #[arg(long, value_name = "FONT")]
    pub label_font: Option<String>,

    /// First page number; page numbers are added when set
    #[arg(long, value_name = "N")]
    pub number_start: Option<u64>,

    /// Page-number height in percents of the page height
    #[arg(long, value_name = "PCT", default_value_t = 3.0)]
    pub number_height: f64,

    /// Margin around the page number in percents of its height
    #[arg(long, value_name = "XPCTxYPCT", default_value = "0x50")]
    pub number_margin: MarginPct,

    /// Page-number color
    #[arg(long, value_name = "COLOR", default_value = "black")]
    pub number_color: String,

    /// Page-number position, e.g. south, southeast, north
    #[arg(long, value_name = "GRAVITY", default_value = "south")]
    pub number_gravity: Gravity,

    /// Write to the first free OUTPUT.N.pdf when OUTPUT exists
    #[arg(short, long)]
    pub numbered_output: bool,

    /// Maximum number of tool invocations running at once
    #[arg(long, default_value_t = default_concurrency())]
    pub concurrency: usize,

    /// More output; repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Explicit work directory, kept after the run
    #[arg(long, value_name = "DIR")]
    pub tempdir: Option<PathBuf>,
}

impl Cli {
    pub fn options(&self) -> PipelineOptions {
        PipelineOptions {
            dpi: self.dpi,
            size: self.size,
            header: self.header.clone(),
            header_height: self.header_height,
            footer: self.footer.clone(),
            footer_height: self.footer_height,
            label_sep: self.label_sep.clone(),
            label_height: self.label_height,
            label_margin: self.label_margin,
            label_color: self.label_color.clone(),
            label_font: self.label_font.clone(),
            number_start: self.number_start,
            number_height: self.number_height,
            number_margin: self.number_margin,
            number_color: self.number_color.clone(),
            number_gravity: self.number_gravity,
            concurrency: self.concurrency,
        }
    }

    /// Default log filter for the `-v` count. `RUST_LOG` overrides it.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_pipeline_defaults() {
        let cli = Cli::try_parse_from(["pagestamp", "-o", "out.pdf", "docs"]).unwrap();
        let options = cli.options();
        let defaults = PipelineOptions::default();

        assert_eq!(options.dpi, defaults.dpi);
        assert_eq!(options.size, defaults.size);
        assert_eq!(options.header_height, defaults.header_height);
        assert_eq!(options.footer_height, defaults.footer_height);
        assert_eq!(options.label_margin, defaults.label_margin);
        assert_eq!(options.number_margin, defaults.number_margin);
        assert_eq!(options.number_gravity, defaults.number_gravity);
        assert_eq!(options.label_color, "red");
        assert!(options.label_sep.is_none());
        assert!(options.number_start.is_none());
        assert!(!cli.keep_order);
        assert!(!cli.numbered_output);
        assert_eq!(cli.log_filter(), "info");
    }

    #[test]
    fn annotation_flags_are_carried_over() {
        let cli = Cli::try_parse_from([
            "pagestamp",
            "--output",
            "out.pdf",
            "--keep-order",
            "--header",
            "head.png",
            "--label-sep",
            "-",
            "--label-margin",
            "10x20",
            "--number-start",
            "5",
            "--number-gravity",
            "southeast",
            "-n",
            "-vv",
            "a.pdf",
            "b.pdf",
        ])
        .unwrap();
        let options = cli.options();

        assert_eq!(cli.sources, [PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
        assert!(cli.keep_order);
        assert!(cli.numbered_output);
        assert_eq!(options.header, Some(PathBuf::from("head.png")));
        assert_eq!(options.label_sep.as_deref(), Some("-"));
        assert_eq!(options.label_margin, MarginPct::new(10.0, 20.0));
        assert_eq!(options.number_start, Some(5));
        assert_eq!(options.number_gravity, Gravity::SouthEast);
        assert_eq!(cli.log_filter(), "trace");
    }

    #[test]
    fn malformed_values_are_rejected() {
        for args in [
            ["pagestamp", "-o", "o.pdf", "--size", "A4", "x.pdf"],
            ["pagestamp", "-o", "o.pdf", "--label-margin", "-1x5", "x.pdf"],
            ["pagestamp", "-o", "o.pdf", "--number-gravity", "up", "x.pdf"],
        ] {
            assert!(Cli::try_parse_from(args).is_err(), "{args:?} accepted");
        }
    }

    #[test]
    fn sources_and_output_are_required() {
        assert!(Cli::try_parse_from(["pagestamp", "-o", "out.pdf"]).is_err());
        assert!(Cli::try_parse_from(["pagestamp", "a.pdf"]).is_err());
    }
}
