use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::DynamicImage;
use pdfium_render::prelude::*;

use crate::error::ConversionError;
use crate::render::DocumentRenderer;

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Rasterizes PDF pages through the pdfium library.
///
/// The library is bound per call; calls are serialised because pdfium keeps
/// process-wide state.
pub struct PdfiumRenderer {
    library: Option<PathBuf>,
    dpi: f32,
    lock: Mutex<()>,
}

impl PdfiumRenderer {
    pub fn new(library: Option<PathBuf>, dpi: f32) -> Self {
        Self {
            library,
            dpi,
            lock: Mutex::new(()),
        }
    }

    fn bind(&self) -> Result<Pdfium, ConversionError> {
        let bindings = match &self.library {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ConversionError::render(None, format!("failed to load pdfium: {e:?}")))?;
        Ok(Pdfium::new(bindings))
    }

    fn with_document<T>(
        &self,
        source: &Path,
        f: impl FnOnce(&PdfDocument<'_>) -> Result<T, ConversionError>,
    ) -> Result<T, ConversionError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_file(source, None)
            .map_err(|e| ConversionError::unreadable(source, format!("{e:?}")))?;
        f(&document)
    }

    fn render_config(&self) -> PdfRenderConfig {
        PdfRenderConfig::new().scale_page_by_factor(self.dpi / POINTS_PER_INCH)
    }
}

fn render_one(page: &PdfPage<'_>, index: usize, config: &PdfRenderConfig) -> Result<DynamicImage, ConversionError> {
    let bitmap = page
        .render_with_config(config)
        .map_err(|e| ConversionError::render(Some(index + 1), format!("{e:?}")))?;
    let image = bitmap.as_image();
    log::debug!("rendered page {} → {}x{} px", index + 1, image.width(), image.height());
    Ok(image)
}

impl DocumentRenderer for PdfiumRenderer {
    fn page_count(&self, source: &Path) -> Result<usize, ConversionError> {
        self.with_document(source, |document| Ok(document.pages().len() as usize))
    }

    fn render_page(&self, source: &Path, index: usize) -> Result<DynamicImage, ConversionError> {
        let config = self.render_config();
        self.with_document(source, |document| {
            let pages = document.pages();
            let page_index = u16::try_from(index)
                .map_err(|_| ConversionError::render(Some(index + 1), "page index out of range"))?;
            let page = pages
                .get(page_index)
                .map_err(|e| ConversionError::render(Some(index + 1), format!("{e:?}")))?;
            render_one(&page, index, &config)
        })
    }

    fn render_pages(
        &self,
        source: &Path,
        sink: &mut dyn FnMut(usize, DynamicImage) -> Result<(), ConversionError>,
    ) -> Result<usize, ConversionError> {
        let config = self.render_config();
        self.with_document(source, |document| {
            let pages = document.pages();
            let count = pages.len() as usize;
            log::info!("PDF loaded: {count} pages");

            for (index, page) in pages.iter().enumerate() {
                let image = render_one(&page, index, &config)?;
                sink(index, image)?;
            }
            Ok(count)
        })
    }
}
