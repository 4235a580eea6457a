use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

const DEFAULT_TEMPLATE_PATH: &str = "FORMATTED TEMPLATE.xlsx";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 30 * 1024 * 1024;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub deployment: String,
    pub template_path: PathBuf,
    /// Worksheet to fill; the workbook's active sheet when unset
    pub template_sheet: Option<String>,
    /// Staging area for uploaded tables and generated workbooks
    pub upload_dir: PathBuf,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok(); // Load from .env file if available

        Config {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "flightlog-report".to_string()),
            deployment: env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            template_path: env::var("TEMPLATE_PATH")
                .map_or_else(|_| PathBuf::from(DEFAULT_TEMPLATE_PATH), PathBuf::from),
            template_sheet: env::var("TEMPLATE_SHEET")
                .ok()
                .filter(|name| !name.trim().is_empty()),
            upload_dir: env::var("UPLOAD_DIR").map_or_else(
                |_| env::temp_dir().join("flightlog-uploads"),
                PathBuf::from,
            ),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            app_name: "flightlog-report-test".to_string(),
            deployment: "test".to_string(),
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            template_sheet: None,
            upload_dir: env::temp_dir().join("flightlog-uploads-test"),
            bind_addr: "127.0.0.1:0".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
