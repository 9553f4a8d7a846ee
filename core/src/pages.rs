//! One output file per document page, named `{stem}_page{N}{.ext}`.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use uuid::Uuid;

use crate::error::ConversionError;
use crate::format::Format;
use crate::raster;
use crate::temp;

pub struct PageExpander {
    base: PathBuf,
    format: Format,
    quality: u8,
    request_id: Uuid,
    written: Vec<PathBuf>,
}

impl PageExpander {
    pub fn new(base: &Path, format: Format, quality: u8, request_id: Uuid) -> Self {
        Self {
            base: base.to_path_buf(),
            format,
            quality,
            request_id,
            written: Vec::new(),
        }
    }

    /// Output path of 1-based page `page`.
    pub fn page_path(&self, page: usize) -> PathBuf {
        page_path(&self.base, page)
    }

    /// Encode and write the next page.
    pub fn push(&mut self, image: &DynamicImage) -> Result<&Path, ConversionError> {
        let page = self.written.len() + 1;
        let path = self.page_path(page);
        let encoded = raster::encode(image, self.format, self.quality, &path)?;
        temp::write_atomic(&path, self.request_id, &encoded)
            .map_err(|e| ConversionError::encode(&path, e))?;

        log::info!("saved page {page} → {}", path.display());
        self.written.push(path);
        Ok(self.written[page - 1].as_path())
    }

    /// Close out the expansion with the outcome of the page source.
    ///
    /// Written pages stay on disk either way; a failure after at least one
    /// page is reported as a partial failure carrying those pages.
    pub fn finish(self, outcome: Result<(), ConversionError>) -> Result<Vec<PathBuf>, ConversionError> {
        match outcome {
            Ok(()) if self.written.is_empty() => {
                Err(ConversionError::render(None, "document has no pages"))
            }
            Ok(()) => Ok(self.written),
            Err(source) if self.written.is_empty() => Err(source),
            Err(source) => {
                let failed_page = self.written.len() + 1;
                log::warn!(
                    "page {failed_page} failed; keeping {} page(s) already written",
                    self.written.len()
                );
                Err(ConversionError::PartialMultiPage {
                    written: self.written,
                    failed_page,
                    source: Box::new(source),
                })
            }
        }
    }
}

/// Write every page `feed` produces, in order, stopping at the first failure.
///
/// `feed` pushes each 0-based page index and image into the sink it is
/// given, typically
/// [`DocumentRenderer::render_pages`](crate::render::DocumentRenderer::render_pages).
pub fn expand<F>(
    base: &Path,
    format: Format,
    quality: u8,
    request_id: Uuid,
    feed: F,
) -> Result<Vec<PathBuf>, ConversionError>
where
    F: FnOnce(&mut dyn FnMut(usize, DynamicImage) -> Result<(), ConversionError>) -> Result<usize, ConversionError>,
{
    let mut expander = PageExpander::new(base, format, quality, request_id);
    let mut write_page = |_: usize, page: DynamicImage| expander.push(&page).map(|_| ());
    let outcome = feed(&mut write_page).map(|_| ());
    expander.finish(outcome)
}

/// `dir/report.png`, page 2 → `dir/report_page2.png`.
pub fn page_path(base: &Path, page: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{stem}_page{page}.{}", ext.to_string_lossy()),
        None => format!("{stem}_page{page}"),
    };
    base.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::{Rgb, RgbImage};

    fn page(shade: u8) -> Result<DynamicImage, ConversionError> {
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 6, Rgb([shade, shade, shade]))))
    }

    fn run(
        base: &Path,
        format: Format,
        pages: Vec<Result<DynamicImage, ConversionError>>,
    ) -> Result<Vec<PathBuf>, ConversionError> {
        expand(base, format, 95, Uuid::new_v4(), |sink| {
            let count = pages.len();
            for (index, page) in pages.into_iter().enumerate() {
                sink(index, page?)?;
            }
            Ok(count)
        })
    }

    #[test]
    fn page_names_keep_the_extension_case() {
        assert_eq!(page_path(Path::new("out/page.png"), 1), PathBuf::from("out/page_page1.png"));
        assert_eq!(page_path(Path::new("scan.JPG"), 12), PathBuf::from("scan_page12.JPG"));
        assert_eq!(page_path(Path::new("a.b.webp"), 3), PathBuf::from("a.b_page3.webp"));
    }

    #[test]
    fn writes_contiguous_pages_and_no_base_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("page.png");
        let written = run(&base, Format::Png, vec![page(0), page(100), page(200)]).unwrap();

        let expected: Vec<_> = (1..=3).map(|n| dir.path().join(format!("page_page{n}.png"))).collect();
        assert_eq!(written, expected);
        assert!(written.iter().all(|p| p.exists()));
        assert!(!base.exists());
    }

    #[test]
    fn later_failure_reports_written_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("doc.jpg");
        let pages = vec![page(10), page(20), Err(ConversionError::render(Some(3), "corrupt page"))];

        let err = run(&base, Format::Jpeg, pages).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartialMultiPageFailure);
        match err {
            ConversionError::PartialMultiPage { written, failed_page, source } => {
                assert_eq!(written.len(), 2);
                assert_eq!(failed_page, 3);
                assert_eq!(source.kind(), ErrorKind::RenderFailure);
                assert!(written.iter().all(|p| p.exists()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn first_page_failure_is_a_total_failure() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("doc.png");
        let pages = vec![Err(ConversionError::render(Some(1), "corrupt page")), page(0)];

        let err = run(&base, Format::Png, pages).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RenderFailure);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn empty_document_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&dir.path().join("x.png"), Format::Png, Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RenderFailure);
    }
}
