//! Single-URL fetch: GET, validate, name, and stream the body to disk.
//!
//! [`Fetcher::fetch`] never returns an error or panics for network or
//! filesystem conditions. Every failure becomes a failed [`DownloadResult`]
//! and one `error!` log line naming the URL and the reason.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, error, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::FetchError;
use super::filename::{ensure_extension, filename_from_url, sanitize_filename};
use super::task::{DownloadResult, DownloadTask, SavedFile};
use crate::mime::{DEFAULT_IMAGE_EXTENSION, MimeTypeRegistry, normalize_content_type};
use crate::user_agent;

/// HTTP fetcher shared by every worker in a batch.
///
/// Cloning is cheap: the underlying connection pool and the mime registry are
/// both reference counted.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use image_dl::{DownloadTask, Fetcher, MimeTypeRegistry};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = Fetcher::new(Arc::new(MimeTypeRegistry::standard()))?;
/// let task = DownloadTask::new("https://example.com/cat.jpg", "./images");
/// let result = fetcher.fetch(&task).await;
/// println!("saved: {:?}", result.path());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    registry: Arc<MimeTypeRegistry>,
}

impl Fetcher {
    /// Creates a fetcher with the default 10 second connect and read timeouts.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built (for
    /// example when no TLS backend can be initialized).
    pub fn new(registry: Arc<MimeTypeRegistry>) -> Result<Self, reqwest::Error> {
        Self::with_timeouts(
            registry,
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(READ_TIMEOUT_SECS),
        )
    }

    /// Creates a fetcher with explicit connect and read timeouts.
    ///
    /// The read timeout bounds each wait for response data, not the whole
    /// transfer, so large bodies that keep arriving are not cut off.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built.
    #[instrument(level = "debug", skip(registry))]
    pub fn with_timeouts(
        registry: Arc<MimeTypeRegistry>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()?;
        Ok(Self { client, registry })
    }

    /// Fetches one task and reports its outcome.
    #[instrument(skip(self, task), fields(url = %task.url()))]
    pub async fn fetch(&self, task: &DownloadTask) -> DownloadResult {
        match self.try_fetch(task).await {
            Ok(saved) => {
                debug!(path = %saved.path.display(), bytes = saved.bytes, "download complete");
                DownloadResult::saved(task.url(), saved)
            }
            Err(e) => {
                log_failure(task.url(), &e);
                DownloadResult::failed(task.url(), e)
            }
        }
    }

    async fn try_fetch(&self, task: &DownloadTask) -> Result<SavedFile, FetchError> {
        let url = task.url();
        let parsed = parse_http_url(url)?;

        // create_dir_all treats a directory created concurrently by another
        // worker as success.
        tokio::fs::create_dir_all(task.dest_dir())
            .await
            .map_err(|e| FetchError::write(task.dest_dir(), e))?;

        let filename = match task.filename() {
            Some(name) => sanitize_filename(name),
            None => filename_from_url(&parsed),
        };
        let mut file_path = task.dest_dir().join(filename);

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::connection(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::bad_status(url, status.as_u16()));
        }

        if task.check_content_type() {
            let content_type = normalize_content_type(
                response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok()),
            );
            if !self.registry.is_image(&content_type) {
                // Dropping the response closes the connection; nothing is written.
                return Err(FetchError::invalid_content_type(url, content_type));
            }
            let canonical = self
                .registry
                .extension_for(&content_type)
                .unwrap_or(DEFAULT_IMAGE_EXTENSION);
            file_path = ensure_extension(
                file_path,
                self.registry.extensions_for(&content_type),
                canonical,
            );
        }
        debug!(path = %file_path.display(), "resolved output path");

        let bytes = write_body(response, url, &file_path).await?;
        Ok(SavedFile {
            path: file_path,
            bytes,
        })
    }
}

fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
    if matches!(parsed.scheme(), "http" | "https") {
        Ok(parsed)
    } else {
        Err(FetchError::invalid_url(url))
    }
}

/// Streams the body into `file_path`, truncating any existing file.
///
/// On failure the partial file is removed.
async fn write_body(
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, FetchError> {
    let file = File::create(file_path)
        .await
        .map_err(|e| FetchError::write(file_path, e))?;

    let result = stream_to_file(file, response, url, file_path).await;
    if result.is_err() {
        debug!(path = %file_path.display(), "cleaning up partial file after error");
        let _ = tokio::fs::remove_file(file_path).await;
    }
    result
}

async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::connection(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::write(file_path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::write(file_path, e))?;

    Ok(bytes_written)
}

fn log_failure(url: &str, error: &FetchError) {
    match error {
        FetchError::InvalidUrl { .. } => {
            error!(url = %url, "download failed: not a valid http(s) URL");
        }
        FetchError::Connection { source, .. } => {
            error!(
                url = %url,
                error = %source,
                timeout = source.is_timeout(),
                "download failed: could not reach host, does the website exist?"
            );
        }
        FetchError::BadStatus { status, .. } => {
            error!(url = %url, status, "download failed: status code {status}");
        }
        FetchError::InvalidContentType { content_type, .. } => {
            error!(
                url = %url,
                content_type = %content_type,
                "download failed: content type {content_type} not in image types"
            );
        }
        FetchError::Write { path, source } => {
            error!(
                url = %url,
                path = %path.display(),
                error = %source,
                "download failed: could not write file"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::download::FailureKind;
    use crate::test_support::socket_guard::{
        should_skip_socket_bound_test, start_mock_server_or_skip,
    };
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn fetcher() -> Fetcher {
        Fetcher::new(Arc::new(MimeTypeRegistry::standard())).unwrap()
    }

    #[test]
    fn test_parse_http_url_accepts_http_and_https() {
        assert!(parse_http_url("http://example.com/a.jpg").is_ok());
        assert!(parse_http_url("https://example.com/a.jpg").is_ok());
    }

    #[test]
    fn test_parse_http_url_rejects_other_schemes_and_garbage() {
        assert!(matches!(
            parse_http_url("ftp://example.com/a.jpg"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_http_url("not a url"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_is_failure_not_panic() {
        let temp_dir = TempDir::new().unwrap();
        let task = DownloadTask::new("not-a-valid-url", temp_dir.path());

        let result = fetcher().fetch(&task).await;

        assert_eq!(result.failure_kind(), Some(FailureKind::InvalidUrl));
    }

    #[tokio::test]
    async fn test_fetch_image_appends_extension() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/200/300"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "image/jpeg")
                    .set_body_bytes(b"jpeg bytes".to_vec()),
            )
            .mount(&mock_server)
            .await;

        let task = DownloadTask::new(format!("{}/200/300", mock_server.uri()), temp_dir.path());
        let result = fetcher().fetch(&task).await;

        assert!(result.is_success(), "Expected success, got: {result:?}");
        let saved = result.path().unwrap();
        assert_eq!(saved, temp_dir.path().join("300.jpg"));
        assert_eq!(std::fs::read(saved).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_fetch_uses_explicit_filename() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/img"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "image/png")
                    .set_body_bytes(b"png".to_vec()),
            )
            .mount(&mock_server)
            .await;

        let task = DownloadTask::new(format!("{}/img", mock_server.uri()), temp_dir.path())
            .with_filename("logo.png");
        let result = fetcher().fetch(&task).await;

        assert_eq!(result.path().unwrap(), temp_dir.path().join("logo.png"));
    }

    #[tokio::test]
    async fn test_fetch_missing_content_type_fails_validation() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/blob"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"???".to_vec()))
            .mount(&mock_server)
            .await;

        let task = DownloadTask::new(format!("{}/blob", mock_server.uri()), temp_dir.path());
        let result = fetcher().fetch(&task).await;

        match result.outcome {
            Err(crate::download::TaskFailure::Fetch(FetchError::InvalidContentType {
                content_type,
                ..
            })) => assert_eq!(content_type, crate::mime::NO_CONTENT_TYPE),
            other => panic!("Expected InvalidContentType, got: {other:?}"),
        }
        assert!(!temp_dir.path().join("blob").exists());
    }

    #[tokio::test]
    async fn test_fetch_bad_status_writes_nothing() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/gone.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let task = DownloadTask::new(format!("{}/gone.jpg", mock_server.uri()), temp_dir.path());
        let result = fetcher().fetch(&task).await;

        match result.outcome {
            Err(crate::download::TaskFailure::Fetch(FetchError::BadStatus { status, .. })) => {
                assert_eq!(status, 404);
            }
            other => panic!("Expected BadStatus, got: {other:?}"),
        }
        assert!(!temp_dir.path().join("gone.jpg").exists());
    }

    #[tokio::test]
    async fn test_fetch_read_timeout_is_connection_failure() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/slow.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "image/jpeg")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::with_timeouts(
            Arc::new(MimeTypeRegistry::standard()),
            Duration::from_secs(1),
            Duration::from_millis(300),
        )
        .unwrap();
        let task = DownloadTask::new(format!("{}/slow.jpg", mock_server.uri()), temp_dir.path());
        let result = fetcher.fetch(&task).await;

        assert_eq!(result.failure_kind(), Some(FailureKind::ConnectionFailure));
        assert!(!temp_dir.path().join("slow.jpg").exists());
    }

    #[tokio::test]
    async fn test_fetch_creates_nested_destination() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("a").join("b");

        Mock::given(method("GET"))
            .and(path("/x.gif"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "image/gif")
                    .set_body_bytes(b"GIF89a".to_vec()),
            )
            .mount(&mock_server)
            .await;

        let task = DownloadTask::new(format!("{}/x.gif", mock_server.uri()), &dest);
        let result = fetcher().fetch(&task).await;

        assert_eq!(result.path().unwrap(), dest.join("x.gif"));
    }

    #[tokio::test]
    async fn test_fetch_destination_is_regular_file_is_write_failure() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("notadir");
        std::fs::write(&dest, b"occupied").unwrap();

        let task = DownloadTask::new("http://127.0.0.1:9/pic.png", &dest);
        let result = fetcher().fetch(&task).await;

        assert_eq!(result.failure_kind(), Some(FailureKind::WriteFailure));
        assert_eq!(std::fs::read(&dest).unwrap(), b"occupied");
    }

    #[tokio::test]
    async fn test_fetch_target_path_is_directory_is_write_failure() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("pic.png")).unwrap();

        Mock::given(method("GET"))
            .and(path("/pic.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "image/png")
                    .set_body_bytes(b"png".to_vec()),
            )
            .mount(&mock_server)
            .await;

        let task = DownloadTask::new(format!("{}/pic.png", mock_server.uri()), temp_dir.path());
        let result = fetcher().fetch(&task).await;

        assert_eq!(result.failure_kind(), Some(FailureKind::WriteFailure));
        assert!(temp_dir.path().join("pic.png").is_dir());
    }

    #[tokio::test]
    async fn test_fetch_truncated_body_leaves_no_partial_file() {
        if should_skip_socket_bound_test() {
            return;
        }
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Promises 1000 bytes, sends 10, then hangs up.
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 1000\r\n\r\n0123456789",
                )
                .await;
            let _ = socket.shutdown().await;
        });

        let temp_dir = TempDir::new().unwrap();
        let task = DownloadTask::new(format!("http://{addr}/cut.png"), temp_dir.path());
        let result = fetcher().fetch(&task).await;

        assert_eq!(result.failure_kind(), Some(FailureKind::ConnectionFailure));
        assert!(!temp_dir.path().join("cut.png").exists());
    }
}
