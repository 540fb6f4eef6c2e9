use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderName, HeaderValue, InvalidHeaderValue, USER_AGENT};

/// Digitraffic asks every client to identify itself with this header.
pub const DIGITRAFFIC_USER: HeaderName = HeaderName::from_static("digitraffic-user");

/// An [`HttpClient`] wrapper that stamps the headers the feed provider
/// expects on every request.
///
/// `client_name` identifies this deployment to the provider; it is sent as
/// `Digitraffic-User` and as the product token of `User-Agent`. Headers the
/// caller already set are left untouched.
pub struct FeedHeaders<C> {
    inner: C,
    user_agent: HeaderValue,
    client_name: HeaderValue,
}

impl<C> FeedHeaders<C> {
    pub fn new(inner: C, client_name: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            inner,
            user_agent: HeaderValue::from_str(&format!(
                "{client_name}/{}",
                env!("CARGO_PKG_VERSION")
            ))?,
            client_name: HeaderValue::from_str(client_name)?,
        })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for FeedHeaders<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let headers = req.headers_mut();
        headers
            .entry(ACCEPT)
            .or_insert_with(|| HeaderValue::from_static("application/x-protobuf"));
        headers
            .entry(USER_AGENT)
            .or_insert_with(|| self.user_agent.clone());
        headers
            .entry(DIGITRAFFIC_USER)
            .or_insert_with(|| self.client_name.clone());
        self.inner.execute(req).await
    }
}
