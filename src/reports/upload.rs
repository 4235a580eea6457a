//! Staging of uploaded flight exports

use crate::common::errors::{ConversionError, ConversionResult};
use crate::services::report_service::{ReportConverter, output_path_for};
use std::fs;
use std::path::Path;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A converted workbook ready to be sent back
#[derive(Debug)]
pub struct ConvertedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Final path component of a client-supplied name, or `None` when nothing usable remains
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_start_matches('.');
    if name.is_empty() {
        return None;
    }
    // Quotes and control characters cannot travel in a Content-Disposition header
    Some(
        name.chars()
            .map(|c| if c == '"' || c.is_control() { '_' } else { c })
            .collect(),
    )
}

/// Write the upload into a private directory under `upload_dir`, convert it
/// and read the result back. The directory is removed on return.
pub fn convert_upload_bytes(
    converter: &ReportConverter,
    upload_dir: &Path,
    file_name: &str,
    data: &[u8],
) -> ConversionResult<ConvertedReport> {
    let staging_error = |message: String| ConversionError::InputRead {
        path: upload_dir.join(file_name),
        message,
    };

    fs::create_dir_all(upload_dir).map_err(|e| staging_error(e.to_string()))?;
    let staging = tempfile::Builder::new()
        .prefix("upload-")
        .tempdir_in(upload_dir)
        .map_err(|e| staging_error(e.to_string()))?;

    let input = staging.path().join(file_name);
    fs::write(&input, data).map_err(|e| staging_error(e.to_string()))?;
    let output = output_path_for(&input);

    converter.convert(&input, &output)?;

    let bytes = fs::read(&output).map_err(|e| ConversionError::Save {
        path: output.clone(),
        message: e.to_string(),
    })?;
    let file_name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ConvertedReport { file_name, bytes })
}
