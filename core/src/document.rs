//! Single-page PDF output from a raster, using `printpdf`.
//!
//! printpdf 0.8 builds documents from `PdfPage` structs holding `Vec<Op>`
//! operation lists; the page here is sized so the image covers it exactly at
//! the requested resolution.

use image::RgbImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};

const MM_PER_INCH: f32 = 25.4;

pub struct PdfEncoder {
    title: String,
}

impl PdfEncoder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Encode `image` as a one-page PDF at `dpi` pixels per inch.
    pub fn encode_page(&self, image: RgbImage, dpi: f32) -> Vec<u8> {
        let (width, height) = image.dimensions();
        let (page_w, page_h) = page_size(width, height, dpi);

        let raw = RawImage {
            pixels: RawImageData::U8(image.into_raw()),
            width: width as usize,
            height: height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(&self.title);
        let xobject_id = doc.add_image(&raw);

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(dpi),
                rotate: None,
            },
        }];
        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            log::debug!("printpdf reported {} warning(s)", warnings.len());
        }

        log::debug!(
            "encoded {width}x{height} px as a {:.1}x{:.1} mm page at {dpi} dpi",
            page_w.0,
            page_h.0
        );
        output
    }
}

impl Default for PdfEncoder {
    fn default() -> Self {
        Self::new("Converted image")
    }
}

/// Physical page size of a `width`×`height` pixel image at `dpi`.
pub fn page_size(width: u32, height: u32, dpi: f32) -> (Mm, Mm) {
    (
        Mm(width as f32 / dpi * MM_PER_INCH),
        Mm(height as f32 / dpi * MM_PER_INCH),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn page_matches_pixels_at_resolution() {
        let (w, h) = page_size(850, 1100, 100.0);
        assert!((w.0 - 215.9).abs() < 0.01);
        assert!((h.0 - 279.4).abs() < 0.01);
    }

    #[test]
    fn produces_a_pdf() {
        let image = RgbImage::from_pixel(20, 10, Rgb([10, 200, 30]));
        let bytes = PdfEncoder::default().encode_page(image, 100.0);
        assert!(bytes.starts_with(b"%PDF"));
    }
}
