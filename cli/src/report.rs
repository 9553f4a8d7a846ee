use image_converter_core::{ConversionError, ConversionResult};

/// Print a human-readable summary of a conversion.
pub fn print_summary(result: &ConversionResult) {
    match result {
        ConversionResult::SingleArtifact(path) => {
            println!("✓ Converted → {}", path.display());
        }
        ConversionResult::MultiArtifact(paths) => {
            println!("✓ Converted {} page(s):", paths.len());
            for (n, path) in paths.iter().enumerate() {
                println!("  page {} → {}", n + 1, path.display());
            }
        }
        ConversionResult::Failure(err) => {
            eprintln!("✗ {:?}: {err}", err.kind());
            if let ConversionError::PartialMultiPage { written, .. } = err {
                eprintln!("  pages written before the failure:");
                for path in written {
                    eprintln!("    {}", path.display());
                }
            }
        }
    }
}

pub fn to_json(result: &ConversionResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}
