use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use rayon::prelude::*;

use crate::config::ConversionConfig;
use crate::document::PdfEncoder;
use crate::enhance::Enhancer;
use crate::error::ConversionError;
use crate::format::{Format, FormatFamily};
use crate::pages;
use crate::raster::{self, RasterBuffer};
use crate::render::{DocumentRenderer, PdfiumRenderer, SvgRenderer};
use crate::request::{ConversionRequest, ConversionResult};
use crate::temp::{self, TempArtifact};
use crate::vectorize::Vectorizer;

/// SVG user units are CSS pixels.
const CSS_PX_PER_INCH: f32 = 96.0;

/// How a (source, target) pair is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// SVG → render → raster encode
    RenderVector,
    /// SVG → render → single-page PDF
    RenderVectorDocument,
    /// raster → enhance → trace
    Vectorize,
    /// PDF page 1 → render → enhance → trace
    VectorizeDocument,
    /// raster → RGB → single-page PDF
    EncodeDocument,
    /// PDF → render each page → one raster per page
    ExpandPages,
    /// raster → raster
    Reencode,
}

impl Strategy {
    /// Strategy for a format pair, or `None` when the pair is not supported.
    pub fn select(input: Format, output: Format) -> Option<Self> {
        use FormatFamily::*;

        match (input.family(), output.family()) {
            (Vector, Raster) if matches!(output, Format::Png | Format::Jpeg | Format::Webp) => {
                Some(Strategy::RenderVector)
            }
            (Vector, Document) => Some(Strategy::RenderVectorDocument),
            (Raster, Vector) => Some(Strategy::Vectorize),
            (Document, Vector) => Some(Strategy::VectorizeDocument),
            (Raster, Document) => Some(Strategy::EncodeDocument),
            (Document, Raster) => Some(Strategy::ExpandPages),
            (Raster, Raster) => Some(Strategy::Reencode),
            _ => None,
        }
    }
}

/// Output of a successful strategy run.
enum Produced {
    Single(PathBuf),
    Pages(Vec<PathBuf>),
}

/// Conversion engine: resolves the strategy for a request and runs it.
///
/// A `Converter` holds no per-request state; one instance can serve
/// concurrent requests.
pub struct Converter {
    config: ConversionConfig,
    enhancer: Enhancer,
    vectorizer: Vectorizer,
    svg: SvgRenderer,
    documents: Box<dyn DocumentRenderer>,
    pdf: PdfEncoder,
}

impl Converter {
    pub fn new(config: ConversionConfig) -> Self {
        let documents = PdfiumRenderer::new(config.pdfium_library.clone(), config.render_dpi);
        Self::with_document_renderer(config, Box::new(documents))
    }

    /// Use `documents` to rasterize paginated inputs instead of pdfium.
    pub fn with_document_renderer(config: ConversionConfig, documents: Box<dyn DocumentRenderer>) -> Self {
        Self {
            enhancer: Enhancer::new(config.enhance.clone()),
            vectorizer: Vectorizer::new(config.trace.clone()),
            svg: SvgRenderer::new(),
            documents,
            pdf: PdfEncoder::default(),
            config,
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert paths directly; extension errors surface as a `Failure`.
    pub fn convert(&self, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> ConversionResult {
        match ConversionRequest::new(input, output) {
            Ok(request) => self.dispatch(&request),
            Err(err) => ConversionResult::Failure(err),
        }
    }

    pub fn dispatch(&self, request: &ConversionRequest) -> ConversionResult {
        let (from, to) = (request.input_format(), request.output_format());

        let Some(strategy) = Strategy::select(from, to) else {
            log::warn!("unsupported format combination: {from} → {to}");
            return ConversionResult::Failure(ConversionError::UnsupportedCombination { from, to });
        };

        log::info!(
            "[{}] {} → {} via {strategy:?}",
            request.id().simple(),
            request.input().display(),
            request.output().display()
        );

        let outcome = self.ensure_readable(request.input()).and_then(|()| match strategy {
            Strategy::RenderVector => self.render_vector(request).map(Produced::Single),
            Strategy::RenderVectorDocument => self.render_vector_document(request).map(Produced::Single),
            Strategy::Vectorize => self.vectorize_raster(request).map(Produced::Single),
            Strategy::VectorizeDocument => self.vectorize_document(request).map(Produced::Single),
            Strategy::EncodeDocument => self.encode_document(request).map(Produced::Single),
            Strategy::ExpandPages => self.expand_pages(request).map(Produced::Pages),
            Strategy::Reencode => self.reencode(request).map(Produced::Single),
        });

        match outcome {
            Ok(Produced::Single(path)) => {
                log::info!("converted → {}", path.display());
                ConversionResult::SingleArtifact(path)
            }
            Ok(Produced::Pages(paths)) => {
                log::info!("converted → {} page(s)", paths.len());
                ConversionResult::MultiArtifact(paths)
            }
            Err(err) => {
                log::error!("conversion of {} failed: {err}", request.input().display());
                ConversionResult::Failure(err)
            }
        }
    }

    /// Run independent requests in parallel, one dispatch per worker.
    /// Results come back in request order.
    pub fn dispatch_all(&self, requests: &[ConversionRequest]) -> Vec<ConversionResult> {
        requests.par_iter().map(|request| self.dispatch(request)).collect()
    }

    fn ensure_readable(&self, input: &Path) -> Result<(), ConversionError> {
        match fs::metadata(input) {
            Ok(meta) if meta.is_file() => Ok(()),
            Ok(_) => Err(ConversionError::unreadable(input, "not a regular file")),
            Err(e) => Err(ConversionError::unreadable(input, e)),
        }
    }

    /// Encode and place a raster at the request's output path.
    fn finalize(&self, request: &ConversionRequest, image: &DynamicImage) -> Result<PathBuf, ConversionError> {
        let output = request.output();
        let encoded = raster::encode(image, request.output_format(), self.config.quality, output)?;
        self.write_output(request, &encoded)
    }

    fn write_output(&self, request: &ConversionRequest, data: &[u8]) -> Result<PathBuf, ConversionError> {
        let output = request.output();
        temp::write_atomic(output, request.id(), data).map_err(|e| ConversionError::encode(output, e))?;
        Ok(output.to_path_buf())
    }

    fn render_vector(&self, request: &ConversionRequest) -> Result<PathBuf, ConversionError> {
        let image = self.svg.render(request.input(), 1.0)?;
        self.finalize(request, &image)
    }

    fn render_vector_document(&self, request: &ConversionRequest) -> Result<PathBuf, ConversionError> {
        let dpi = self.config.vector_dpi;
        let image = self.svg.render(request.input(), dpi / CSS_PX_PER_INCH)?;
        let pdf = self.pdf.encode_page(raster::flatten_to_rgb(&image), dpi);
        self.write_output(request, &pdf)
    }

    fn encode_document(&self, request: &ConversionRequest) -> Result<PathBuf, ConversionError> {
        let image = raster::decode(request.input())?;
        let pdf = self.pdf.encode_page(raster::flatten_to_rgb(&image), self.config.document_dpi);
        self.write_output(request, &pdf)
    }

    fn reencode(&self, request: &ConversionRequest) -> Result<PathBuf, ConversionError> {
        let image = raster::decode(request.input())?;
        self.finalize(request, &image)
    }

    fn vectorize_raster(&self, request: &ConversionRequest) -> Result<PathBuf, ConversionError> {
        let image = raster::decode(request.input())
            .map_err(|e| ConversionError::Enhancement(e.to_string()))?;
        self.enhance_and_trace(request, image)
    }

    fn vectorize_document(&self, request: &ConversionRequest) -> Result<PathBuf, ConversionError> {
        let pages = self.documents.page_count(request.input())?;
        if pages == 0 {
            return Err(ConversionError::render(None, "document has no pages"));
        }
        if pages > 1 {
            log::warn!(
                "{} has {pages} pages; only page 1 is vectorized",
                request.input().display()
            );
        }
        let image = self.documents.render_page(request.input(), 0)?;
        self.enhance_and_trace(request, image)
    }

    fn enhance_and_trace(&self, request: &ConversionRequest, image: DynamicImage) -> Result<PathBuf, ConversionError> {
        let enhanced = self.enhancer.enhance(RasterBuffer::from_image(image))?.into_image();

        // Dropped on every path out of this function, taking the file with it
        let artifact = TempArtifact::create(&self.config.temp_dir(), request.id(), "enhanced", "png")
            .map_err(|e| ConversionError::Enhancement(format!("failed to create temp file: {e}")))?;
        enhanced
            .save_with_format(artifact.path(), image::ImageFormat::Png)
            .map_err(|e| ConversionError::Enhancement(format!("failed to write enhanced image: {e}")))?;

        self.vectorizer
            .vectorize(artifact.path(), request.output(), request.id())?;
        Ok(request.output().to_path_buf())
    }

    fn expand_pages(&self, request: &ConversionRequest) -> Result<Vec<PathBuf>, ConversionError> {
        pages::expand(
            request.output(),
            request.output_format(),
            self.config.quality,
            request.id(),
            |sink| self.documents.render_pages(request.input(), sink),
        )
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConversionConfig::default())
    }
}
