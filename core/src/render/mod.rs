//! Rasterization of vector and paginated sources.

pub mod pdf;
pub mod svg;

use std::path::Path;

use image::DynamicImage;

use crate::error::ConversionError;

pub use pdf::PdfiumRenderer;
pub use svg::SvgRenderer;

/// Rasterizes pages of a paginated document.
///
/// Page indices are 0-based here; errors report 1-based page numbers.
pub trait DocumentRenderer: Send + Sync {
    /// Number of pages, as recorded by the document itself.
    fn page_count(&self, source: &Path) -> Result<usize, ConversionError>;

    /// Rasterize a single page.
    fn render_page(&self, source: &Path, index: usize) -> Result<DynamicImage, ConversionError>;

    /// Rasterize every page in order, handing each to `sink` as soon as it is
    /// ready. Stops at the first render or sink error.
    fn render_pages(
        &self,
        source: &Path,
        sink: &mut dyn FnMut(usize, DynamicImage) -> Result<(), ConversionError>,
    ) -> Result<usize, ConversionError> {
        let count = self.page_count(source)?;
        for index in 0..count {
            let page = self.render_page(source, index)?;
            sink(index, page)?;
        }
        Ok(count)
    }
}
