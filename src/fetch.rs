//! Remote snapshot download.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::SyncError;

/// Archive URL for a repository and branch: `{repo}/archive/{branch}.zip`.
pub fn archive_url(repo: &str, branch: &str) -> String {
    format!("{}/archive/{}.zip", repo.trim_end_matches('/'), branch)
}

/// Downloads snapshot archives. One attempt per call, no retries.
pub struct Fetcher {
    http_client: reqwest::Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self, SyncError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shared-prompts/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Fetch(format!("could not build HTTP client: {}", e)))?;
        Ok(Self { http_client })
    }

    /// Download `url` into `dest`. Non-2xx responses, transport failures and
    /// timeouts are all `SyncError::Fetch`.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, SyncError> {
        info!(url = %url, "fetch_start");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| SyncError::Fetch(describe(url, &e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Fetch(format!("{} returned HTTP {}", url, status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SyncError::Fetch(describe(url, &e)))?;
        debug!(bytes = bytes.len(), "fetch_body_received");

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| SyncError::Fetch(format!("could not save archive: {}", e)))?;

        info!(url = %url, bytes = bytes.len(), "fetch_complete");
        Ok(bytes.len() as u64)
    }
}

fn describe(url: &str, error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("{} timed out", url)
    } else if error.is_connect() {
        format!("could not connect to {}: {}", url, error)
    } else {
        format!("{}: {}", url, error)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one HTTP response on a local port and return its base URL.
    pub(crate) async fn serve_once(status_line: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let header = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            );
            socket.write_all(header.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_archive_url() {
        assert_eq!(
            archive_url("https://github.com/acme/templates", "main"),
            "https://github.com/acme/templates/archive/main.zip"
        );
        assert_eq!(
            archive_url("https://github.com/acme/templates/", "release/v2"),
            "https://github.com/acme/templates/archive/release/v2.zip"
        );
    }

    #[tokio::test]
    async fn test_download_success() {
        let base = serve_once("200 OK", b"PK-not-really".to_vec()).await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("snapshot.zip");

        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let written = fetcher
            .download(&format!("{}/archive/main.zip", base), &dest)
            .await
            .unwrap();

        assert_eq!(written, 13);
        assert_eq!(std::fs::read(&dest).unwrap(), b"PK-not-really");
    }

    #[tokio::test]
    async fn test_download_non_success_status() {
        let base = serve_once("404 Not Found", Vec::new()).await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("snapshot.zip");

        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher
            .download(&format!("{}/archive/main.zip", base), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Fetch(ref msg) if msg.contains("404")));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_connection_refused() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let dir = TempDir::new().unwrap();

        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher
            .download(
                &format!("http://127.0.0.1:{}/archive/main.zip", port),
                &dir.path().join("snapshot.zip"),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "fetch");
    }
}
