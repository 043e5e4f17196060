// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print-ready PDF output using `printpdf` 0.8.
//
// The page is sized to the raster at its print resolution, so a 1800x1200
// sheet at 300 DPI becomes a borderless 6x4 in page that photo kiosks print
// at 1:1.

use image::RgbImage;
use passwerk_core::SHEET_DPI;
use passwerk_core::error::{PasswerkError, Result};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

const MM_PER_INCH: f32 = 25.4;

/// Wraps a finished raster into a single-page, edge-to-edge PDF.
pub struct PrintPdfWriter {
    dpi: u32,
    title: Option<String>,
}

impl Default for PrintPdfWriter {
    fn default() -> Self {
        Self::new(SHEET_DPI)
    }
}

impl PrintPdfWriter {
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi: dpi.max(1),
            title: None,
        }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Physical page size of `image` at this writer's resolution.
    pub fn page_size_mm(&self, image: &RgbImage) -> (f32, f32) {
        let dpi = self.dpi as f32;
        (
            image.width() as f32 / dpi * MM_PER_INCH,
            image.height() as f32 / dpi * MM_PER_INCH,
        )
    }

    /// Create a single-page PDF with `image` filling the page.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height(), dpi = self.dpi))]
    pub fn create_from_rgb(&self, image: &RgbImage) -> Result<Vec<u8>> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PasswerkError::Encoding("cannot place an empty image in a PDF".into()));
        }
        let (page_w_mm, page_h_mm) = self.page_size_mm(image);
        let title = self.title.as_deref().unwrap_or("Passwerk Print Sheet");
        info!(page_w_mm, page_h_mm, title, "Creating print PDF");

        let raw = RawImage {
            pixels: RawImageData::U8(image.as_raw().clone()),
            width: image.width() as usize,
            height: image.height() as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(title);
        let xobject_id = doc.add_image(&raw);

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(self.dpi as f32),
                rotate: None,
            },
        }];

        let page = PdfPage::new(Mm(page_w_mm), Mm(page_h_mm), ops);
        doc.with_pages(vec![page]);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(pdf_bytes = output.len(), warnings = warnings.len(), "Print PDF complete");
        Ok(output)
    }
}
