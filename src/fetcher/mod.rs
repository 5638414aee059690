pub mod http_fetcher;
pub mod retry;

use async_trait::async_trait;

use crate::app::Result;

/// A fully prepared outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Raw HTTP seam. Connection-level failures surface as
/// [`BrowseError::Network`](crate::app::BrowseError::Network); any status
/// code, including errors, is returned as a response.
#[async_trait]
pub trait HttpTransport {
    async fn post(&self, request: &HttpRequest) -> Result<HttpResponse>;

    async fn get(&self, url: &str) -> Result<HttpResponse>;
}
