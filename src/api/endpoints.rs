// API endpoint functions.
// Provides typed methods for fetching posts and users.

use serde::de::DeserializeOwned;

use crate::error::{FeedError, Result};

use super::client::ApiClient;
use super::types::{AVATAR_URL, Post, User};

impl ApiClient {
    /// Get all posts.
    pub async fn get_posts(&self) -> Result<Vec<Post>> {
        self.get_json("/posts").await
    }

    /// Get a single post. Fails without a request if `id` is missing.
    pub async fn get_post(&self, id: Option<u64>) -> Result<Post> {
        let id = require_id(id, "post")?;
        self.get_json(&format!("/posts/{}", id)).await
    }

    /// Get a single user, with the local avatar URL filled in.
    pub async fn get_user(&self, id: Option<u64>) -> Result<User> {
        let id = require_id(id, "user")?;
        let mut user: User = self.get_json(&format!("/users/{}", id)).await?;
        user.avatar_url = AVATAR_URL.to_string();
        Ok(user)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let response = self.get(endpoint).await?;
        let body = response.text().await?;
        let value = serde_json::from_str(&body)?;

        if !self.response_delay().is_zero() {
            tokio::time::sleep(self.response_delay()).await;
        }
        Ok(value)
    }
}

/// Ids start at 1; zero counts as missing.
fn require_id(id: Option<u64>, resource: &'static str) -> Result<u64> {
    id.filter(|&id| id != 0)
        .ok_or(FeedError::MissingParameter(resource))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_id() {
        assert_eq!(require_id(Some(5), "user").unwrap(), 5);
        assert!(matches!(
            require_id(None, "user"),
            Err(FeedError::MissingParameter("user"))
        ));
        assert!(matches!(
            require_id(Some(0), "post"),
            Err(FeedError::MissingParameter("post"))
        ));
    }

    #[tokio::test]
    async fn test_missing_id_fails_before_network() {
        // Nothing listens on port 9; a request would fail with an Api error instead.
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(
            client.get_user(None).await,
            Err(FeedError::MissingParameter("user"))
        ));
        assert!(matches!(
            client.get_post(None).await,
            Err(FeedError::MissingParameter("post"))
        ));
    }
}
