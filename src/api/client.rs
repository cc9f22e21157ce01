// REST API HTTP client.
// Handles default headers, base URL joining, and response status checking.

use std::time::Duration;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};

use crate::error::{FeedError, Result};

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Latency added after every response, as the demo backend is otherwise instant.
pub const DEFAULT_RESPONSE_DELAY: Duration = Duration::from_millis(1000);

/// Client for the posts/users REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    response_delay: Duration,
}

impl ApiClient {
    /// Create a new client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("postfeed/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(FeedError::Api)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            response_delay: Duration::ZERO,
        })
    }

    /// Set the artificial latency applied after each response.
    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn response_delay(&self) -> Duration {
        self.response_delay
    }

    /// Make a GET request to the API.
    pub async fn get(&self, endpoint: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        log::debug!("GET {}", url);
        let response = self.client.get(&url).send().await.map_err(FeedError::Api)?;

        check_response(response).await
    }
}

/// Check response status and convert errors.
async fn check_response(response: Response) -> Result<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => {
            let url = response.url().to_string();
            Err(FeedError::NotFound(url))
        }
        status => Err(FeedError::Http {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.response_delay(), Duration::ZERO);
    }

    #[test]
    fn test_response_delay() {
        let client = ApiClient::new(DEFAULT_BASE_URL)
            .unwrap()
            .with_response_delay(DEFAULT_RESPONSE_DELAY);
        assert_eq!(client.response_delay(), Duration::from_secs(1));
    }
}
