use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::format::Format;

/// Failure category of a conversion, for callers that branch on the kind
/// rather than the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedExtension,
    UnsupportedCombination,
    SourceUnreadable,
    EnhancementFailure,
    VectorizationFailure,
    RenderFailure,
    PartialMultiPageFailure,
    EncodeFailure,
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("unsupported extension: {0}")]
    UnsupportedExtension(String),

    #[error("unsupported format combination: {from} → {to}")]
    UnsupportedCombination { from: Format, to: Format },

    #[error("failed to read {path}: {detail}")]
    SourceUnreadable { path: PathBuf, detail: String },

    #[error("enhancement failed: {0}")]
    Enhancement(String),

    #[error("vectorization failed: {0}")]
    Vectorization(String),

    #[error("render failed{}: {detail}", .page.map(|p| format!(" on page {p}")).unwrap_or_default())]
    Render { page: Option<usize>, detail: String },

    #[error("page {failed_page} failed after {} page(s) were written: {source}", .written.len())]
    PartialMultiPage {
        written: Vec<PathBuf>,
        failed_page: usize,
        #[source]
        source: Box<ConversionError>,
    },

    #[error("failed to encode {path}: {detail}")]
    Encode { path: PathBuf, detail: String },
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedExtension(_) => ErrorKind::UnsupportedExtension,
            Self::UnsupportedCombination { .. } => ErrorKind::UnsupportedCombination,
            Self::SourceUnreadable { .. } => ErrorKind::SourceUnreadable,
            Self::Enhancement(_) => ErrorKind::EnhancementFailure,
            Self::Vectorization(_) => ErrorKind::VectorizationFailure,
            Self::Render { .. } => ErrorKind::RenderFailure,
            Self::PartialMultiPage { .. } => ErrorKind::PartialMultiPageFailure,
            Self::Encode { .. } => ErrorKind::EncodeFailure,
        }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            detail: detail.to_string(),
        }
    }

    pub(crate) fn encode(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        Self::Encode {
            path: path.into(),
            detail: detail.to_string(),
        }
    }

    pub(crate) fn render(page: Option<usize>, detail: impl ToString) -> Self {
        Self::Render {
            page,
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_message_names_the_page() {
        let err = ConversionError::render(Some(3), "bitmap allocation failed");
        assert_eq!(err.to_string(), "render failed on page 3: bitmap allocation failed");
        let err = ConversionError::render(None, "bad document");
        assert_eq!(err.to_string(), "render failed: bad document");
    }

    #[test]
    fn partial_failure_keeps_its_own_kind() {
        let err = ConversionError::PartialMultiPage {
            written: vec![PathBuf::from("p_page1.png")],
            failed_page: 2,
            source: Box::new(ConversionError::render(Some(2), "boom")),
        };
        assert_eq!(err.kind(), ErrorKind::PartialMultiPageFailure);
        assert!(err.to_string().starts_with("page 2 failed after 1 page(s)"));
    }
}
