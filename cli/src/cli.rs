use std::path::PathBuf;

use clap::Parser;

use image_converter_core::ConversionConfig;

/// Convert between raster images (PNG, JPEG, WebP, BMP, TIFF), SVG and PDF
#[derive(Debug, Parser)]
#[command(name = "image_converter", version, about)]
pub struct Cli {
    /// Input file
    pub input: PathBuf,

    /// Output file; its extension selects the target format.
    /// PDF → raster writes one file per page as `{name}_page{N}.{ext}`
    pub output: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Quality for lossy formats (0-100)
    #[arg(short, long, default_value_t = 95, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub quality: u8,

    /// Resolution PDF pages are rasterized at
    #[arg(long, default_value_t = 72.0)]
    pub render_dpi: f32,

    /// Directory for intermediate files (default: system temp dir)
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Path to the pdfium shared library (default: system library)
    #[arg(long, value_name = "FILE")]
    pub pdfium_lib: Option<PathBuf>,
}

impl Cli {
    pub fn to_config(&self) -> ConversionConfig {
        ConversionConfig {
            temp_dir: self.temp_dir.clone(),
            quality: self.quality,
            render_dpi: self.render_dpi,
            pdfium_library: self.pdfium_lib.clone(),
            ..ConversionConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_positionals_are_required() {
        assert!(Cli::try_parse_from(["image_converter"]).is_err());
        assert!(Cli::try_parse_from(["image_converter", "in.png"]).is_err());
        assert!(Cli::try_parse_from(["image_converter", "a.png", "b.jpg", "c.webp"]).is_err());
    }

    #[test]
    fn defaults_match_the_engine() {
        let cli = Cli::try_parse_from(["image_converter", "photo.png", "sketch.svg"]).unwrap();
        let config = cli.to_config();
        assert_eq!(config.quality, 95);
        assert_eq!(config.render_dpi, 72.0);
        assert!(config.temp_dir.is_none());
    }

    #[test]
    fn options_reach_the_config() {
        let cli = Cli::try_parse_from([
            "image_converter",
            "report.pdf",
            "page.png",
            "--render-dpi",
            "150",
            "--temp-dir",
            "/tmp/work",
            "-q",
            "80",
        ])
        .unwrap();
        let config = cli.to_config();
        assert_eq!(config.render_dpi, 150.0);
        assert_eq!(config.quality, 80);
        assert_eq!(config.temp_dir, Some(PathBuf::from("/tmp/work")));
    }
}
