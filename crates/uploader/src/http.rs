//! HTTP implementation of [`StorageApi`].
//!
//! Async client using `reqwest`. Negotiation and deletion go to the
//! application endpoints under `base_url`; object bytes go straight to the
//! pre-signed URL as a streamed body so progress can be reported.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use imgdrop_protocol::{
    DELETE_PATH, DeleteRequest, ErrorResponse, PresignRequest, PresignResponse, UPLOAD_PATH,
};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::storage::{ProgressFn, StorageApi};

/// Bytes handed to the transport per progress report.
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Storage collaborator reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStorage {
    http: reqwest::Client,
    base_url: String,
}

impl HttpStorage {
    /// Creates a client for the application at `base_url`.
    ///
    /// `timeout` bounds each whole request, upload included.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, StorageError> {
        let parsed = Url::parse(base_url).map_err(|e| StorageError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StorageError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn presign_inner(&self, req: PresignRequest) -> Result<PresignResponse, StorageError> {
        let resp = self
            .http
            .post(self.endpoint(UPLOAD_PATH))
            .json(&req)
            .send()
            .await?;
        let status = resp.status();

        if !status.is_success() {
            return Err(status_error(status, resp).await);
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn put_inner(
        &self,
        url: String,
        content_type: String,
        data: Bytes,
        on_progress: ProgressFn,
    ) -> Result<u16, StorageError> {
        let url = Url::parse(&url).map_err(|e| StorageError::InvalidUrl(e.to_string()))?;
        let total = data.len() as u64;

        let mut sent = 0u64;
        let body = stream::iter(split_chunks(data)).map(move |chunk| {
            sent += chunk.len() as u64;
            on_progress(sent, total);
            Ok::<_, std::io::Error>(chunk)
        });

        let resp = self
            .http
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(body))
            .send()
            .await?;

        let status = resp.status().as_u16();
        debug!(status, bytes = total, "object PUT finished");
        Ok(status)
    }

    async fn delete_inner(&self, key: String) -> Result<(), StorageError> {
        let resp = self
            .http
            .delete(self.endpoint(DELETE_PATH))
            .json(&DeleteRequest { key: key.clone() })
            .send()
            .await?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            warn!(key = %key, "object already gone, treating delete as done");
            return Ok(());
        }
        if !status.is_success() {
            return Err(status_error(status, resp).await);
        }
        Ok(())
    }
}

impl StorageApi for HttpStorage {
    fn presign(
        &self,
        req: &PresignRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PresignResponse, StorageError>> + Send + '_>> {
        Box::pin(self.presign_inner(req.clone()))
    }

    fn put_object(
        &self,
        url: &str,
        content_type: &str,
        data: Bytes,
        on_progress: ProgressFn,
    ) -> Pin<Box<dyn Future<Output = Result<u16, StorageError>> + Send + '_>> {
        Box::pin(self.put_inner(
            url.to_string(),
            content_type.to_string(),
            data,
            on_progress,
        ))
    }

    fn delete_object(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        Box::pin(self.delete_inner(key.to_string()))
    }
}

/// Builds a [`StorageError::Status`], preferring the `{"error": ..}` message.
async fn status_error(status: StatusCode, resp: reqwest::Response) -> StorageError {
    let raw = resp.text().await.unwrap_or_default();
    let body = match serde_json::from_str::<ErrorResponse>(&raw) {
        Ok(err) => err.error,
        Err(_) => raw,
    };
    StorageError::Status {
        status: status.as_u16(),
        body,
    }
}

fn split_chunks(mut data: Bytes) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(data.len().div_ceil(UPLOAD_CHUNK_SIZE));
    while !data.is_empty() {
        let n = data.len().min(UPLOAD_CHUNK_SIZE);
        chunks.push(data.split_to(n));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// What the mock server saw.
    struct Captured {
        head: String,
        body: Vec<u8>,
    }

    impl Captured {
        fn request_line(&self) -> &str {
            self.head.lines().next().unwrap_or_default()
        }
    }

    /// Reads one request, headers and `Content-Length` body.
    async fn read_request(stream: &mut TcpStream) -> Captured {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 8192];
        let head_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let len = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);

        let mut body = buf[head_end..].to_vec();
        while body.len() < len {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }

        Captured { head, body }
    }

    /// Starts a mock HTTP server that answers one request with `status` and `body`.
    async fn mock_server(status: u16, body: &str) -> (String, tokio::task::JoinHandle<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let captured = read_request(&mut stream).await;

            let resp = format!(
                "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes()).await;
            let _ = stream.shutdown().await;
            captured
        });

        (url, handle)
    }

    fn noop_progress() -> ProgressFn {
        Arc::new(|_, _| {})
    }

    #[test]
    fn new_rejects_bad_base_urls() {
        assert!(matches!(
            HttpStorage::new("not a url", None),
            Err(StorageError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpStorage::new("ftp://example.com", None),
            Err(StorageError::InvalidUrl(_))
        ));
    }

    #[test]
    fn new_trims_trailing_slash() {
        let storage = HttpStorage::new("http://localhost:3000/", None).unwrap();
        assert_eq!(storage.base_url(), "http://localhost:3000");
        assert_eq!(
            storage.endpoint(UPLOAD_PATH),
            "http://localhost:3000/api/s3/upload"
        );
    }

    #[test]
    fn split_chunks_covers_payload() {
        let data = Bytes::from(vec![7u8; UPLOAD_CHUNK_SIZE * 2 + 10]);
        let chunks = split_chunks(data);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 10);
        assert!(split_chunks(Bytes::new()).is_empty());
    }

    #[tokio::test]
    async fn presign_posts_camel_case_json() {
        let (url, handle) = mock_server(
            200,
            r#"{"presignedUrl":"https://bucket.example/u1?sig=x","key":"uploads/u1.png"}"#,
        )
        .await;

        let storage = HttpStorage::new(&url, None).unwrap();
        let req = PresignRequest {
            filename: "cat.png".into(),
            content_type: "image/png".into(),
            size: 1024,
        };
        let resp = storage.presign(&req).await.unwrap();
        assert_eq!(resp.key, "uploads/u1.png");
        assert_eq!(resp.presigned_url, "https://bucket.example/u1?sig=x");

        let captured = handle.await.unwrap();
        assert_eq!(captured.request_line(), "POST /api/s3/upload HTTP/1.1");
        let sent: serde_json::Value = serde_json::from_slice(&captured.body).unwrap();
        assert_eq!(
            sent,
            serde_json::json!({"filename": "cat.png", "contentType": "image/png", "size": 1024})
        );
    }

    #[tokio::test]
    async fn presign_error_status_uses_error_message() {
        let (url, handle) = mock_server(500, r#"{"error":"Failed to generate URL"}"#).await;

        let storage = HttpStorage::new(&url, None).unwrap();
        let req = PresignRequest {
            filename: "cat.png".into(),
            content_type: "image/png".into(),
            size: 1,
        };
        match storage.presign(&req).await {
            Err(StorageError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "Failed to generate URL");
            }
            other => panic!("expected status error, got {other:?}"),
        }
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn presign_malformed_body_is_json_error() {
        let (url, handle) = mock_server(200, r#"{"unexpected":true}"#).await;

        let storage = HttpStorage::new(&url, None).unwrap();
        let req = PresignRequest {
            filename: "a.png".into(),
            content_type: "image/png".into(),
            size: 1,
        };
        assert!(matches!(
            storage.presign(&req).await,
            Err(StorageError::Json(_))
        ));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn put_streams_bytes_and_reports_progress() {
        let (url, handle) = mock_server(200, "").await;
        let storage = HttpStorage::new(&url, None).unwrap();

        let payload = vec![0xABu8; UPLOAD_CHUNK_SIZE * 3 + 17];
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();
        let progress: ProgressFn = Arc::new(move |sent, total| {
            sink.lock().unwrap().push((sent, total));
        });

        let status = storage
            .put_object(
                &format!("{url}/bucket/u1.png?X-Amz-Signature=abc"),
                "image/png",
                Bytes::from(payload.clone()),
                progress,
            )
            .await
            .unwrap();
        assert_eq!(status, 200);

        let captured = handle.await.unwrap();
        assert!(
            captured
                .request_line()
                .starts_with("PUT /bucket/u1.png?X-Amz-Signature=abc")
        );
        assert!(
            captured
                .head
                .to_ascii_lowercase()
                .contains("content-type: image/png")
        );
        assert_eq!(captured.body, payload);

        let reports = reports.lock().unwrap();
        let total = payload.len() as u64;
        assert_eq!(reports.len(), 4);
        assert!(reports.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(reports.last().copied(), Some((total, total)));
    }

    #[tokio::test]
    async fn put_returns_non_success_status() {
        let (url, handle) = mock_server(403, "<Error>AccessDenied</Error>").await;
        let storage = HttpStorage::new(&url, None).unwrap();

        let status = storage
            .put_object(
                &format!("{url}/u1"),
                "image/png",
                Bytes::from_static(b"abc"),
                noop_progress(),
            )
            .await
            .unwrap();
        assert_eq!(status, 403);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn put_to_closed_port_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let storage = HttpStorage::new("http://127.0.0.1:1", None).unwrap();
        let result = storage
            .put_object(
                &format!("http://127.0.0.1:{port}/u1"),
                "image/png",
                Bytes::from_static(b"abc"),
                noop_progress(),
            )
            .await;
        assert!(matches!(result, Err(StorageError::Http(_))));
    }

    #[tokio::test]
    async fn put_rejects_invalid_presigned_url() {
        let storage = HttpStorage::new("http://127.0.0.1:1", None).unwrap();
        let result = storage
            .put_object("::nope::", "image/png", Bytes::new(), noop_progress())
            .await;
        assert!(matches!(result, Err(StorageError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn delete_sends_key_in_body() {
        let (url, handle) =
            mock_server(200, r#"{"message":"File deleted successfully"}"#).await;
        let storage = HttpStorage::new(&url, None).unwrap();

        storage.delete_object("uploads/u1.png").await.unwrap();

        let captured = handle.await.unwrap();
        assert_eq!(captured.request_line(), "DELETE /api/s3/delete HTTP/1.1");
        let sent: serde_json::Value = serde_json::from_slice(&captured.body).unwrap();
        assert_eq!(sent, serde_json::json!({"key": "uploads/u1.png"}));
    }

    #[tokio::test]
    async fn delete_not_found_counts_as_done() {
        let (url, handle) = mock_server(404, r#"{"error":"NoSuchKey"}"#).await;
        let storage = HttpStorage::new(&url, None).unwrap();

        assert!(storage.delete_object("gone").await.is_ok());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn delete_server_error_is_reported() {
        let (url, handle) = mock_server(500, r#"{"error":"Failed to delete file"}"#).await;
        let storage = HttpStorage::new(&url, None).unwrap();

        match storage.delete_object("uploads/u1.png").await {
            Err(StorageError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "Failed to delete file");
            }
            other => panic!("expected status error, got {other:?}"),
        }
        handle.await.unwrap();
    }
}
