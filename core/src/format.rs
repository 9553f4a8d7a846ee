use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::ConversionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Png,
    Jpeg,
    Webp,
    Bmp,
    Tiff,
    Svg,
    Pdf,
}

/// Broad representation class of a format; strategy selection keys on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatFamily {
    Raster,
    Vector,
    Document,
}

impl Format {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Format::Png),
            "jpg" | "jpeg" => Some(Format::Jpeg),
            "webp" => Some(Format::Webp),
            "bmp" => Some(Format::Bmp),
            "tiff" => Some(Format::Tiff),
            "svg" => Some(Format::Svg),
            "pdf" => Some(Format::Pdf),
            _ => None,
        }
    }

    /// Resolve the format of a path from its extension.
    ///
    /// A missing or unrecognised extension is an error rather than a default.
    pub fn from_path(path: &Path) -> Result<Self, ConversionError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConversionError::UnsupportedExtension(path.display().to_string()))?;
        Self::from_extension(ext).ok_or_else(|| ConversionError::UnsupportedExtension(ext.to_string()))
    }

    pub fn family(&self) -> FormatFamily {
        match self {
            Format::Png | Format::Jpeg | Format::Webp | Format::Bmp | Format::Tiff => {
                FormatFamily::Raster
            }
            Format::Svg => FormatFamily::Vector,
            Format::Pdf => FormatFamily::Document,
        }
    }

    /// True for targets that cannot carry an alpha channel.
    pub fn is_jpeg_family(&self) -> bool {
        matches!(self, Format::Jpeg)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Jpeg => "jpg",
            Format::Webp => "webp",
            Format::Bmp => "bmp",
            Format::Tiff => "tiff",
            Format::Svg => "svg",
            Format::Pdf => "pdf",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Png => "PNG",
            Format::Jpeg => "JPEG",
            Format::Webp => "WebP",
            Format::Bmp => "BMP",
            Format::Tiff => "TIFF",
            Format::Svg => "SVG",
            Format::Pdf => "PDF",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
