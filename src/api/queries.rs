// Query keys and fetch functions for each API resource.
// Screens pair a key with its fetcher when evaluating a QueryHandle.

use crate::query::{FetchFn, fetch_fn};

use super::client::ApiClient;
use super::types::{Post, User};

pub fn posts_key() -> String {
    "posts".to_string()
}

pub fn post_key(id: Option<u64>) -> String {
    format!("post{}", id_fragment(id))
}

pub fn user_key(id: Option<u64>) -> String {
    format!("user{}", id_fragment(id))
}

fn id_fragment(id: Option<u64>) -> String {
    id.map_or_else(|| "undefined".to_string(), |id| id.to_string())
}

pub fn posts_fetcher(client: &ApiClient) -> FetchFn<Vec<Post>> {
    let client = client.clone();
    fetch_fn(move || {
        let client = client.clone();
        async move { client.get_posts().await }
    })
}

pub fn post_fetcher(client: &ApiClient, id: Option<u64>) -> FetchFn<Post> {
    let client = client.clone();
    fetch_fn(move || {
        let client = client.clone();
        async move { client.get_post(id).await }
    })
}

pub fn user_fetcher(client: &ApiClient, id: Option<u64>) -> FetchFn<User> {
    let client = client.clone();
    fetch_fn(move || {
        let client = client.clone();
        async move { client.get_user(id).await }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(posts_key(), "posts");
        assert_eq!(post_key(Some(3)), "post3");
        assert_eq!(user_key(Some(7)), "user7");
        assert_eq!(user_key(None), "userundefined");
        assert_ne!(post_key(Some(1)), user_key(Some(1)));
    }
}
