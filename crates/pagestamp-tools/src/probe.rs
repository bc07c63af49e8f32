// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lightweight document probes used for pre-flight checks and render
// cross-checks. They never modify anything.

use std::path::Path;

use lopdf::Document;
use pagestamp_core::error::{PagestampError, Result};
use pagestamp_core::types::PixelSize;
use tracing::{debug, instrument};

/// Number of pages in a PDF, as reported by `lopdf`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn pdf_page_count(path: &Path) -> Result<usize> {
    let document = Document::load(path).map_err(|err| {
        PagestampError::PdfError(format!("failed to open {}: {}", path.display(), err))
    })?;
    let pages = document.get_pages().len();
    debug!(pages, "PDF page count");
    Ok(pages)
}

/// Pixel dimensions of an image file, read from its header only.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn image_size(path: &Path) -> Result<PixelSize> {
    let (width, height) = image::image_dimensions(path).map_err(|err| {
        PagestampError::ImageError(format!("failed to read {}: {}", path.display(), err))
    })?;
    Ok(PixelSize { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Object, dictionary};

    fn write_pdf(path: &Path, pages: usize) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn counts_pdf_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("three.pdf");
        write_pdf(&path, 3);
        assert_eq!(pdf_page_count(&path).unwrap(), 3);
    }

    #[test]
    fn non_pdf_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();
        assert!(pdf_page_count(&path).is_err());
    }

    #[test]
    fn reads_image_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("header.png");
        image::RgbaImage::new(40, 8).save(&path).unwrap();
        assert_eq!(image_size(&path).unwrap(), PixelSize { width: 40, height: 8 });
    }
}
