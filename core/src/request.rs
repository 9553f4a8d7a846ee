use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeMap, Serializer};
use uuid::Uuid;

use crate::error::{ConversionError, ErrorKind};
use crate::format::Format;

/// One conversion job. Formats are resolved once, at construction.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    id: Uuid,
    input: PathBuf,
    output: PathBuf,
    input_format: Format,
    output_format: Format,
}

impl ConversionRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Result<Self, ConversionError> {
        let input = input.into();
        let output = output.into();
        let input_format = Format::from_path(&input)?;
        let output_format = Format::from_path(&output)?;
        Ok(Self {
            id: Uuid::new_v4(),
            input,
            output,
            input_format,
            output_format,
        })
    }

    /// Request for an uploaded file: the output lands at
    /// `{output_dir}/{base_name}.{format}`.
    pub fn for_upload(
        input: impl Into<PathBuf>,
        output_dir: &Path,
        base_name: &str,
        format: &str,
    ) -> Result<Self, ConversionError> {
        let output = output_dir.join(format!("{base_name}.{}", format.to_ascii_lowercase()));
        Self::new(input, output)
    }

    /// Unique per request; embedded in every intermediate file name.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn input_format(&self) -> Format {
        self.input_format
    }

    pub fn output_format(&self) -> Format {
        self.output_format
    }
}

/// Outcome of a dispatch. Exactly one variant describes what is on disk.
#[derive(Debug)]
pub enum ConversionResult {
    /// One file at the requested output path.
    SingleArtifact(PathBuf),
    /// One file per document page, pages 1..N in order.
    MultiArtifact(Vec<PathBuf>),
    Failure(ConversionError),
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failure(_))
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failure(err) => Some(err.kind()),
            _ => None,
        }
    }

    /// Every file this conversion left on disk, including the pages kept by
    /// a partial multi-page failure.
    pub fn artifacts(&self) -> &[PathBuf] {
        match self {
            Self::SingleArtifact(path) => std::slice::from_ref(path),
            Self::MultiArtifact(paths) => paths,
            Self::Failure(ConversionError::PartialMultiPage { written, .. }) => written,
            Self::Failure(_) => &[],
        }
    }
}

impl Serialize for ConversionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Self::SingleArtifact(path) => {
                map.serialize_entry("status", "ok")?;
                map.serialize_entry("output_file", path)?;
            }
            Self::MultiArtifact(paths) => {
                map.serialize_entry("status", "ok")?;
                map.serialize_entry("output_files", paths)?;
            }
            Self::Failure(err) => {
                map.serialize_entry("status", "error")?;
                map.serialize_entry("kind", &err.kind())?;
                map.serialize_entry("error", &err.to_string())?;
                if let ConversionError::PartialMultiPage {
                    written,
                    failed_page,
                    ..
                } = err
                {
                    map.serialize_entry("output_files", written)?;
                    map.serialize_entry("failed_page", failed_page)?;
                }
            }
        }
        map.end()
    }
}
