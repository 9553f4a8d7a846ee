//! Conversion engine between raster images, SVG and PDF.
//!
//! [`Converter::dispatch`] classifies the request's formats, picks one
//! [`Strategy`] and runs it. Intermediate files are [`temp::TempArtifact`]s and
//! never outlive the call; the returned [`ConversionResult`] is the only
//! record of what was written.

pub mod config;
pub mod document;
pub mod enhance;
pub mod error;
pub mod format;
pub mod pages;
pub mod pipeline;
pub mod raster;
pub mod render;
pub mod request;
pub mod temp;
pub mod vectorize;

pub use config::ConversionConfig;
pub use error::{ConversionError, ErrorKind};
pub use format::{Format, FormatFamily};
pub use pipeline::{Converter, Strategy};
pub use raster::RasterBuffer;
pub use render::DocumentRenderer;
pub use request::{ConversionRequest, ConversionResult};
