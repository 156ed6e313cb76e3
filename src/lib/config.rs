use std::env;
use std::path::PathBuf;

pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://litterbox.catbox.moe/resources/internals/api.php";
pub const DEFAULT_UPLOAD_RETENTION: &str = "24h";

/// Runtime settings, read from the environment (and `.env` via dotenvy in `main`)
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub output_dir: PathBuf,
    pub upload_endpoint: String,
    pub upload_retention: String,
}

impl Config {
    pub fn from_env() -> Self {
        let output_dir = env::var("MFCSV_OUTPUT_DIR").unwrap_or_else(|_| get_default_output_dir());
        Self {
            output_dir: PathBuf::from(shellexpand::tilde(&output_dir).into_owned()),
            upload_endpoint: env::var("MFCSV_UPLOAD_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_ENDPOINT.to_string()),
            upload_retention: env::var("MFCSV_UPLOAD_RETENTION")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_RETENTION.to_string()),
        }
    }
}

/// The user's desktop, where exported CSV files land by default
pub fn get_default_output_dir() -> String {
    env::var("XDG_DESKTOP_DIR").unwrap_or_else(|_| "~/Desktop".to_string())
}
