use std::fs;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{fontdb, Options, Tree};

use crate::error::ConversionError;

/// Renders SVG documents with resvg.
pub struct SvgRenderer {
    fonts: Arc<fontdb::Database>,
}

impl SvgRenderer {
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        log::debug!("loaded {} font faces for SVG text", db.len());
        Self { fonts: Arc::new(db) }
    }

    fn parse(&self, source: &Path) -> Result<Tree, ConversionError> {
        let data = fs::read(source).map_err(|e| ConversionError::unreadable(source, e))?;

        let mut options = Options::default();
        options.resources_dir = source.parent().map(|p| p.to_path_buf());
        options.fontdb = Arc::clone(&self.fonts);

        Tree::from_data(&data, &options).map_err(|e| ConversionError::render(None, e))
    }

    /// Intrinsic size of the SVG in CSS pixels.
    pub fn size(&self, source: &Path) -> Result<(f32, f32), ConversionError> {
        let tree = self.parse(source)?;
        Ok((tree.size().width(), tree.size().height()))
    }

    /// Rasterize at `scale` device pixels per CSS pixel, keeping transparency.
    pub fn render(&self, source: &Path, scale: f32) -> Result<DynamicImage, ConversionError> {
        let tree = self.parse(source)?;
        let size = tree
            .size()
            .to_int_size()
            .scale_by(scale)
            .ok_or_else(|| ConversionError::render(None, format!("cannot scale SVG by {scale}")))?;

        let mut pixmap = Pixmap::new(size.width(), size.height()).ok_or_else(|| {
            ConversionError::render(
                None,
                format!("cannot allocate a {}x{} canvas", size.width(), size.height()),
            )
        })?;
        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

        log::debug!(
            "rendered {} at {scale}x → {}x{}",
            source.display(),
            size.width(),
            size.height()
        );
        Ok(DynamicImage::ImageRgba8(pixmap_to_rgba(&pixmap)))
    }
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// tiny-skia stores premultiplied colour; image expects straight alpha.
fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let raw = pixmap
        .pixels()
        .iter()
        .flat_map(|px| {
            let c = px.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), raw)
        .unwrap_or_else(|| RgbaImage::new(pixmap.width(), pixmap.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    const RECT: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="30">
        <rect x="0" y="0" width="20" height="30" fill="#ff0000"/>
    </svg>"##;

    #[test]
    fn renders_at_intrinsic_size_with_transparency() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rect.svg");
        fs::write(&path, RECT).unwrap();

        let renderer = SvgRenderer::new();
        assert_eq!(renderer.size(&path).unwrap(), (40.0, 30.0));

        let img = renderer.render(&path, 1.0).unwrap();
        assert_eq!(img.dimensions(), (40, 30));
        assert_eq!(img.get_pixel(5, 5).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(35, 5).0[3], 0);
    }

    #[test]
    fn scale_multiplies_the_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rect.svg");
        fs::write(&path, RECT).unwrap();

        let img = SvgRenderer::new().render(&path, 2.0).unwrap();
        assert_eq!(img.dimensions(), (80, 60));
    }

    #[test]
    fn malformed_svg_is_a_render_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.svg");
        fs::write(&path, "<svg").unwrap();

        let err = SvgRenderer::new().render(&path, 1.0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::RenderFailure);
    }
}
