use std::io::Cursor;
use std::path::Path;

use image::{
    DynamicImage, GenericImageView, GrayImage, ImageFormat as ImgFormat, ImageReader, Luma, Rgb,
    RgbImage, RgbaImage,
};

use crate::error::ConversionError;
use crate::format::Format;

/// Decoded raster with the colour channels and the alpha channel held apart.
///
/// Filters run on `rgb` only; `alpha` is carried through untouched and
/// recombined by [`RasterBuffer::into_image`].
#[derive(Debug, Clone)]
pub struct RasterBuffer {
    rgb: RgbImage,
    alpha: Option<GrayImage>,
}

impl RasterBuffer {
    pub fn from_image(image: DynamicImage) -> Self {
        if !image.color().has_alpha() {
            return Self {
                rgb: image.into_rgb8(),
                alpha: None,
            };
        }

        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        let mut rgb = RgbImage::new(width, height);
        let mut alpha = GrayImage::new(width, height);
        for (x, y, px) in rgba.enumerate_pixels() {
            let [r, g, b, a] = px.0;
            rgb.put_pixel(x, y, Rgb([r, g, b]));
            alpha.put_pixel(x, y, Luma([a]));
        }
        Self {
            rgb,
            alpha: Some(alpha),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgb.dimensions()
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn alpha(&self) -> Option<&GrayImage> {
        self.alpha.as_ref()
    }

    /// Replace the colour channels, keeping the alpha channel as it was.
    pub fn with_rgb(self, rgb: RgbImage) -> Self {
        debug_assert_eq!(rgb.dimensions(), self.rgb.dimensions());
        Self {
            rgb,
            alpha: self.alpha,
        }
    }

    pub fn into_image(self) -> DynamicImage {
        let Some(alpha) = self.alpha else {
            return DynamicImage::ImageRgb8(self.rgb);
        };
        let (width, height) = self.rgb.dimensions();
        let rgba = RgbaImage::from_fn(width, height, |x, y| {
            let [r, g, b] = self.rgb.get_pixel(x, y).0;
            image::Rgba([r, g, b, alpha.get_pixel(x, y).0[0]])
        });
        DynamicImage::ImageRgba8(rgba)
    }
}

/// Decode a raster file, sniffing the content rather than trusting the name.
pub fn decode(path: &Path) -> Result<DynamicImage, ConversionError> {
    let img = ImageReader::open(path)
        .map_err(|e| ConversionError::unreadable(path, e))?
        .with_guessed_format()
        .map_err(|e| ConversionError::unreadable(path, e))?
        .decode()
        .map_err(|e| ConversionError::unreadable(path, format!("failed to decode image: {e}")))?;

    log::debug!(
        "decoded {}: {}x{} {:?}",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );
    Ok(img)
}

/// Drop the alpha channel, compositing translucent pixels over white.
pub fn flatten_to_rgb(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let over_white = |c: u8| -> u8 {
            let a = a as u32;
            ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8
        };
        Rgb([over_white(r), over_white(g), over_white(b)])
    })
}

/// Encode an image for a raster target. `path` is only used in diagnostics.
pub fn encode(
    img: &DynamicImage,
    format: Format,
    quality: u8,
    path: &Path,
) -> Result<Vec<u8>, ConversionError> {
    let output = match format {
        Format::Jpeg => encode_jpeg(img, quality, path)?,
        Format::Webp => encode_webp(img, quality, path)?,
        Format::Png => encode_with(img, ImgFormat::Png, path)?,
        Format::Bmp => encode_with(img, ImgFormat::Bmp, path)?,
        Format::Tiff => encode_with(img, ImgFormat::Tiff, path)?,
        Format::Svg | Format::Pdf => {
            return Err(ConversionError::encode(
                path,
                format!("{format} is not a raster format"),
            ))
        }
    };

    log::debug!(
        "encoded {}x{} as {}: {} bytes",
        img.width(),
        img.height(),
        format,
        output.len()
    );
    Ok(output)
}

/// Lossless containers: keep alpha when present, normalise to 8 bits per channel.
fn encode_with(img: &DynamicImage, format: ImgFormat, path: &Path) -> Result<Vec<u8>, ConversionError> {
    let normalized = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let mut output = Vec::new();
    normalized
        .write_to(&mut Cursor::new(&mut output), format)
        .map_err(|e| ConversionError::encode(path, e))?;
    Ok(output)
}

fn encode_jpeg(img: &DynamicImage, quality: u8, path: &Path) -> Result<Vec<u8>, ConversionError> {
    let mut output = Vec::new();
    let mut cursor = Cursor::new(&mut output);

    // JPEG has no alpha channel
    let rgb_img = flatten_to_rgb(img);

    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
    encoder
        .encode(
            rgb_img.as_raw(),
            rgb_img.width(),
            rgb_img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| ConversionError::encode(path, e))?;

    Ok(output)
}

fn encode_webp(img: &DynamicImage, quality: u8, path: &Path) -> Result<Vec<u8>, ConversionError> {
    let (width, height) = img.dimensions();

    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        let encoder = webp::Encoder::from_rgba(rgba.as_raw(), width, height);
        encoder.encode_simple(false, quality as f32)
    } else {
        let rgb = img.to_rgb8();
        let encoder = webp::Encoder::from_rgb(rgb.as_raw(), width, height);
        encoder.encode_simple(false, quality as f32)
    };

    encoded
        .map(|memory| memory.to_vec())
        .map_err(|e| ConversionError::encode(path, format!("{e:?}")))
}
