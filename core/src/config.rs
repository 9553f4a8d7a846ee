use std::path::PathBuf;

/// Parameters of the pre-trace enhancement pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhanceParams {
    /// Spatial extent of the edge-preserving smoothing, in pixels
    pub spatial_sigma: f32,
    /// Range (intensity) sigma of the smoothing, on a 0..1 intensity scale
    pub range_sigma: f32,
    /// Recursive filter passes
    pub iterations: u32,
    /// Gaussian sigma used to build the unsharp mask
    pub blur_sigma: f32,
    /// Weight of the smoothed image; the blurred image gets `1 - amount`
    pub amount: f32,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self {
            spatial_sigma: 50.0,
            range_sigma: 0.2,
            iterations: 3,
            blur_sigma: 1.0,
            amount: 1.5,
        }
    }
}

/// Parameters handed to the tracer.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceParams {
    /// Regions smaller than this many pixels are dropped
    pub filter_speckle: usize,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self { filter_speckle: 10 }
    }
}

#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Directory for intermediate artifacts (default: OS temp dir)
    pub temp_dir: Option<PathBuf>,
    /// Encode quality 0-100 for lossy targets
    pub quality: u8,
    /// Resolution a raster is placed at when encoded as a PDF page
    pub document_dpi: f32,
    /// Resolution PDF pages are rasterized at
    pub render_dpi: f32,
    /// Resolution an SVG is rasterized at before being embedded in a PDF
    pub vector_dpi: f32,
    pub enhance: EnhanceParams,
    pub trace: TraceParams,
    /// Explicit pdfium shared library; the system library is bound otherwise
    pub pdfium_library: Option<PathBuf>,
}

impl ConversionConfig {
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            quality: 95,
            document_dpi: 100.0,
            render_dpi: 72.0,
            vector_dpi: 150.0,
            enhance: EnhanceParams::default(),
            trace: TraceParams::default(),
            pdfium_library: None,
        }
    }
}
