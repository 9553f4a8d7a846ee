use std::path::Path;

use uuid::Uuid;
use visioncortex::PathSimplifyMode;

use crate::config::TraceParams;
use crate::error::ConversionError;
use crate::temp::TempArtifact;

/// Traces a raster file into spline paths.
pub struct Vectorizer {
    params: TraceParams,
}

impl Vectorizer {
    pub fn new(params: TraceParams) -> Self {
        Self { params }
    }

    fn tracer_config(&self) -> vtracer::Config {
        vtracer::Config {
            mode: PathSimplifyMode::Spline,
            filter_speckle: self.params.filter_speckle,
            ..vtracer::Config::default()
        }
    }

    /// Trace `source` into an SVG at `output`.
    ///
    /// The trace lands in a staging file next to `output` and is only moved
    /// into place once complete; a failed trace leaves `output` as it was.
    pub fn vectorize(&self, source: &Path, output: &Path, request_id: Uuid) -> Result<(), ConversionError> {
        let staged = TempArtifact::staging(output, request_id).map_err(|e| {
            ConversionError::Vectorization(format!("failed to stage {}: {e}", output.display()))
        })?;

        log::debug!(
            "tracing {} (spline, speckle < {})",
            source.display(),
            self.params.filter_speckle
        );
        vtracer::convert_image_to_svg(source, staged.path(), self.tracer_config())
            .map_err(ConversionError::Vectorization)?;

        staged.persist(output).map_err(|e| {
            ConversionError::Vectorization(format!("failed to write {}: {e}", output.display()))
        })
    }
}

impl Default for Vectorizer {
    fn default() -> Self {
        Self::new(TraceParams::default())
    }
}
