//! Shared utility helpers.

use std::path::Path;

use encoding_rs::WINDOWS_1252;

/// Read a text file as UTF-8, falling back to Windows-1252 for files saved by
/// older SQL Server tooling. A leading BOM is stripped.
pub fn read_file_with_encoding_fallback(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(err) => {
            let bytes = err.into_bytes();
            let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
            if had_errors {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "File contains invalid characters",
                ));
            }
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{FEFF}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}
