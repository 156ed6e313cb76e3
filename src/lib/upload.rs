use reqwest::multipart::{Form, Part};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;

const USER_AGENT: &str = concat!("mfcsv/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to stage image for upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("Upload request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Upload rejected with HTTP status {0}")]
    Status(u16),
    #[error("Upload response was not a URL: {0:?}")]
    MalformedBody(String),
}

/// Publishes image bytes and hands back a public URL
pub trait ImageHost {
    fn upload(&self, image: &[u8]) -> Result<String, UploadError>;
}

/// Temporary image host (litterbox) reached over a multipart form POST.
///
/// Owns a current-thread tokio runtime so callers stay synchronous.
pub struct LitterboxHost {
    endpoint: String,
    retention: String,
    staging_dir: Option<PathBuf>,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl LitterboxHost {
    pub fn new(endpoint: impl Into<String>, retention: impl Into<String>) -> Result<Self, UploadError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            retention: retention.into(),
            staging_dir: None,
            client: reqwest::Client::new(),
            runtime,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, UploadError> {
        Self::new(&config.upload_endpoint, &config.upload_retention)
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Stage temporary files in `dir` instead of the system temp directory
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    async fn post(&self, image: Vec<u8>) -> Result<String, UploadError> {
        let part = Part::bytes(image)
            .file_name("cover.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .text("reqtype", "fileupload")
            .text("time", self.retention.clone())
            .part("fileToUpload", part);

        let response = self
            .client
            .post(&self.endpoint)
            .header("User-Agent", USER_AGENT)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(UploadError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let url = body.trim();
        if !url.starts_with("https") {
            return Err(UploadError::MalformedBody(body));
        }
        Ok(url.to_string())
    }
}

impl ImageHost for LitterboxHost {
    fn upload(&self, image: &[u8]) -> Result<String, UploadError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("mfcsv-").suffix(".jpg");
        // Removed when `staged` drops, whichever way this function returns
        let mut staged = match &self.staging_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        staged.write_all(image)?;
        staged.flush()?;
        debug!("Staged {} bytes at {}", image.len(), staged.path().display());

        let payload = fs::read(staged.path())?;
        let url = self.runtime.block_on(self.post(payload))?;
        info!("Uploaded image: {}", url);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;
    use tempfile::TempDir;

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn read_request(stream: &mut std::net::TcpStream) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = find(&buf, b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                if headers.contains("transfer-encoding: chunked") {
                    if buf.ends_with(b"\r\n0\r\n\r\n") {
                        break;
                    }
                    continue;
                }
                let length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        buf
    }

    /// Answer exactly one request with a canned response, returning what was received
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{}/resources/internals/api.php", addr), handle)
    }

    fn local_host(endpoint: String, retention: &str) -> LitterboxHost {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        LitterboxHost::new(endpoint, retention).unwrap().with_client(client)
    }

    fn staged_files(dir: &TempDir) -> usize {
        fs::read_dir(dir.path()).unwrap().count()
    }

    #[test]
    fn test_upload_returns_trimmed_url() {
        let (endpoint, server) = serve_once("200 OK", "https://litter.catbox.moe/abc123.jpg\n");
        let staging = TempDir::new().unwrap();
        let host = local_host(endpoint, "24h").with_staging_dir(staging.path());

        let url = host.upload(b"jpeg bytes").unwrap();
        assert_eq!(url, "https://litter.catbox.moe/abc123.jpg");

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /resources/internals/api.php"));
        assert!(request.contains("name=\"fileToUpload\""));
        assert!(request.contains("name=\"reqtype\""));
        assert!(request.contains("fileupload"));
        assert!(request.contains("24h"));
        assert!(request.contains("jpeg bytes"));
        assert_eq!(staged_files(&staging), 0);
    }

    #[test]
    fn test_upload_server_error_is_status_failure() {
        let (endpoint, server) = serve_once("500 Internal Server Error", "oops");
        let staging = TempDir::new().unwrap();
        let host = local_host(endpoint, "24h").with_staging_dir(staging.path());

        let err = host.upload(b"jpeg bytes").unwrap_err();
        assert!(matches!(err, UploadError::Status(500)));
        server.join().unwrap();
        assert_eq!(staged_files(&staging), 0);
    }

    #[test]
    fn test_upload_non_url_body_is_malformed() {
        let (endpoint, server) = serve_once("200 OK", "File too large");
        let host = local_host(endpoint, "1h");

        let err = host.upload(b"jpeg bytes").unwrap_err();
        assert!(matches!(err, UploadError::MalformedBody(ref body) if body == "File too large"));
        assert!(server.join().unwrap().contains("1h"));
    }

    #[test]
    fn test_upload_unreachable_endpoint_is_network_failure() {
        // Bind then drop to get a port nobody listens on
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let staging = TempDir::new().unwrap();
        let host = local_host(format!("http://127.0.0.1:{}/api.php", port), "24h")
            .with_staging_dir(staging.path());

        let err = host.upload(b"jpeg bytes").unwrap_err();
        assert!(matches!(err, UploadError::Network(_)));
        assert_eq!(staged_files(&staging), 0);
    }
}
