//! Where definition payloads come from.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use super::{DefinitionOrigin, FetchError};

const USER_AGENT: &str = concat!("aegis/", env!("CARGO_PKG_VERSION"));

/// Something that can produce the raw definition payload.
pub trait DefinitionSource: Send + Sync {
    /// Fetch the raw JSON bytes of the dataset.
    fn fetch(&self) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;

    /// Provenance recorded on tables built from this source.
    fn origin(&self) -> DefinitionOrigin;
}

/// Single `GET` against the configured dataset URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }

    /// Reuse an existing client (connection pool shared with other callers).
    pub fn with_client(client: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }
}

fn map_reqwest(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Http(e)
    }
}

impl DefinitionSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(map_reqwest)?;
        Ok(body.to_vec())
    }

    fn origin(&self) -> DefinitionOrigin {
        DefinitionOrigin::Remote(self.url.clone())
    }
}

/// Local JSON file with the same shape as the remote dataset.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DefinitionSource for FileSource {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        Ok(tokio::fs::read(&self.path).await?)
    }

    fn origin(&self) -> DefinitionOrigin {
        DefinitionOrigin::File(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on localhost and return the URL.
    async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}/mitigations.json", addr)
    }

    fn response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    fn source(url: String) -> HttpSource {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpSource::with_client(client, url, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_http_success_returns_body() {
        let body = r#"[{"id": 1, "mitigation": {"physical": 5, "magical": 5}}]"#;
        let url = serve_once(response("200 OK", body)).await;

        let bytes = source(url).fetch().await.unwrap();
        assert_eq!(bytes, body.as_bytes());
    }

    #[tokio::test]
    async fn test_http_error_status_is_reported() {
        let url = serve_once(response("503 Service Unavailable", "")).await;

        let err = source(url.clone()).fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Status(503)));
        assert_eq!(source(url.clone()).origin(), DefinitionOrigin::Remote(url));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = FileSource::new("/nonexistent/aegis/mitigations.json")
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }
}
