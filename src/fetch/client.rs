use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a single HTTP request. Wrappers layer headers on top of a base client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// Plain `reqwest` client with a whole-request timeout.
///
/// Gzip response bodies are decoded transparently when the server sets
/// `Content-Encoding: gzip`.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .gzip(true)
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.0.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::fetch_bytes;
    use axum::Router;
    use axum::http::header::CONTENT_ENCODING;
    use axum::routing::get;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use std::net::SocketAddr;

    const BODY: &[u8] = b"\x0a\x05\x0a\x032.0";

    async fn spawn_server(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        addr
    }

    #[tokio::test]
    async fn test_slow_feed_times_out() {
        let app = Router::new().route(
            "/pb",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                BODY
            }),
        );
        let addr = spawn_server(app).await;

        let client = BasicClient::new(Duration::from_millis(200)).unwrap();
        let err = fetch_bytes(&client, &format!("http://{addr}/pb"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout), "got {err:?}");
    }

    #[tokio::test]
    async fn test_gzip_body_is_decoded() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(BODY).unwrap();
        let compressed = encoder.finish().unwrap();
        assert_ne!(compressed, BODY);

        let app = Router::new().route(
            "/pb",
            get(move || async move { ([(CONTENT_ENCODING, "gzip")], compressed) }),
        );
        let addr = spawn_server(app).await;

        let client = BasicClient::new(Duration::from_secs(5)).unwrap();
        let bytes = fetch_bytes(&client, &format!("http://{addr}/pb"))
            .await
            .unwrap();
        assert_eq!(&bytes[..], BODY);
    }
}
