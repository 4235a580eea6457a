use super::upload::{ConvertedReport, XLSX_CONTENT_TYPE, convert_upload_bytes, sanitize_file_name};
use crate::common::errors::redirect_to_form;
use crate::common::state::AppState;
use axum::{
    body::Bytes,
    extract::{Multipart, Query, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};

const NO_FILE_PART: &str = "No file part in request.";
const NO_FILE_SELECTED: &str = "No file selected.";

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct FormQuery {
    /// Outcome of the previous submission
    pub message: Option<String>,
}

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(upload_form))
        .routes(routes!(convert_upload))
        .with_state(state.clone())
}

/// Upload form for flight log exports
#[utoipa::path(
    get,
    path = "/",
    params(FormQuery),
    responses(
        (status = 200, description = "HTML upload form")
    ),
    tag = "reports"
)]
pub async fn upload_form(
    State(state): State<AppState>,
    Query(query): Query<FormQuery>,
) -> Html<String> {
    Html(render_form(&state.config.app_name, query.message.as_deref()))
}

/// Convert an uploaded flight log into the formatted report workbook
#[utoipa::path(
    post,
    path = "/convert",
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` part holding a CSV or spreadsheet export"),
    responses(
        (status = 200, description = "Formatted report workbook (xlsx attachment)"),
        (status = 303, description = "Conversion failed; redirect to the form with a message")
    ),
    tag = "reports"
)]
pub async fn convert_upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let (file_name, data) = match read_file_part(&mut multipart).await {
        Ok(upload) => upload,
        Err(message) => {
            tracing::debug!("Rejected upload: {message}");
            return redirect_to_form(message).into_response();
        }
    };
    tracing::info!("Received {file_name} ({} bytes)", data.len());

    let converter = state.converter.clone();
    let upload_dir = state.config.upload_dir.clone();
    let result = tokio::task::spawn_blocking(move || {
        convert_upload_bytes(&converter, &upload_dir, &file_name, &data)
    })
    .await;

    match result {
        Ok(Ok(report)) => attachment(report),
        Ok(Err(e)) => e.into_response(),
        Err(e) => {
            tracing::error!("Conversion task failed: {e}");
            redirect_to_form("Conversion failed unexpectedly.").into_response()
        }
    }
}

/// First `file` part of the form, with its sanitized name
async fn read_file_part(multipart: &mut Multipart) -> Result<(String, Bytes), &'static str> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| "Invalid form data.")?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .and_then(sanitize_file_name)
            .ok_or(NO_FILE_SELECTED)?;
        let data = field
            .bytes()
            .await
            .map_err(|_| "Could not read the uploaded file.")?;
        return Ok((file_name, data));
    }

    Err(NO_FILE_PART)
}

fn attachment(report: ConvertedReport) -> Response {
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, content_disposition(&report.file_name)),
        ],
        report.bytes,
    )
        .into_response()
}

/// Attachment header with an ASCII `filename` and, for non-ASCII names, an
/// RFC 5987 `filename*` carrying the UTF-8 name
fn content_disposition(file_name: &str) -> String {
    if file_name.is_ascii() {
        return format!("attachment; filename=\"{file_name}\"");
    }

    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    // form encoding leaves `*` bare and turns spaces into `+`; neither is an attr-char
    let encoded = url::form_urlencoded::byte_serialize(file_name.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace('*', "%2A");
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

fn render_form(title: &str, message: Option<&str>) -> String {
    let notice = message
        .filter(|message| !message.is_empty())
        .map(|message| format!("    <p class=\"message\">{}</p>\n", escape_html(message)))
        .unwrap_or_default();

    format!(
        r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{title}</title>
  </head>
  <body>
    <h1>Upload a flight log</h1>
{notice}    <form method="post" action="/convert" enctype="multipart/form-data">
      <input type="file" name="file" accept=".csv,.xlsx,.xlsm,.xls,.ods">
      <input type="submit" value="Convert">
    </form>
  </body>
</html>
"#,
        title = escape_html(title),
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
