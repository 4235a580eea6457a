use axum::response::{IntoResponse, Redirect, Response};
use std::fmt;
use std::path::PathBuf;

/// Fatal conversion failures. Any of these aborts the run before the output is persisted.
///
/// Value-level parse problems (bad dates, bad durations) are not errors: the
/// normalizer degrades them to a fallback value instead.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// Required input fields are absent from the header
    Schema { missing: Vec<String> },
    /// Template workbook does not exist at the configured location
    TemplateNotFound { path: PathBuf },
    /// Configured worksheet is not part of the template
    SheetNotFound { name: String },
    /// Input table could not be opened or parsed
    InputRead { path: PathBuf, message: String },
    /// Template exists but could not be opened as a workbook
    TemplateRead { path: PathBuf, message: String },
    /// Workbook rejected a structural update (filter range, print area)
    Workbook { message: String },
    /// Output could not be written or moved into place
    Save { path: PathBuf, message: String },
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::Schema { missing } => {
                write!(f, "Missing columns: [{}]", quoted_list(missing))
            }
            ConversionError::TemplateNotFound { path } => {
                write!(f, "Template not found: {}", path.display())
            }
            ConversionError::SheetNotFound { name } => {
                write!(f, "Worksheet '{name}' not found in template")
            }
            ConversionError::InputRead { path, message } => {
                write!(f, "Could not read input '{}': {message}", path.display())
            }
            ConversionError::TemplateRead { path, message } => {
                write!(f, "Could not open template '{}': {message}", path.display())
            }
            ConversionError::Workbook { message } => write!(f, "Workbook error: {message}"),
            ConversionError::Save { path, message } => {
                write!(f, "Could not save '{}': {message}", path.display())
            }
        }
    }
}

impl std::error::Error for ConversionError {}

fn quoted_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("'{item}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Send the browser back to the upload form with a human-readable message
pub fn redirect_to_form(message: &str) -> Redirect {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("message", message)
        .finish();
    Redirect::to(&format!("/?{query}"))
}

/// Failed conversions surface on the upload form rather than as an error page
impl IntoResponse for ConversionError {
    fn into_response(self) -> Response {
        tracing::warn!("Conversion failed: {self}");
        redirect_to_form(&self.to_string()).into_response()
    }
}

/// Result type alias for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;
