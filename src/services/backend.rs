use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::config::BackendConfig;
use crate::models::{Post, PostDraft};

/// Flat error taxonomy for the remote backend. A 401 is kept distinct from
/// every other failure because it drives session invalidation upstream.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend rejected the credentials or session")]
    Unauthorized,

    #[error("backend returned {0}")]
    Status(StatusCode),

    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend response did not match the expected shape: {0}")]
    Decode(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Client for the externally owned posts/upload backend.
///
/// One method per remote operation, no retries, no pagination. Mutating
/// calls replay the opaque session token as a bearer credential.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    posts_url: String,
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            posts_url: config.posts_url.trim_end_matches('/').to_string(),
            upload_url: config.upload_url.clone(),
        })
    }

    /// Unauthenticated read of the full post collection, in backend order.
    pub async fn list_posts(&self) -> BackendResult<Vec<Post>> {
        tracing::debug!("GET {}", self.posts_url);
        let response = self.client.get(&self.posts_url).send().await?;
        decode(check(response)?).await
    }

    pub async fn get_post(&self, id: i64) -> BackendResult<Post> {
        let url = self.item_url(id);
        tracing::debug!("GET {url}");
        let response = self.client.get(&url).send().await?;
        decode(check(response)?).await
    }

    pub async fn create_post(&self, draft: &PostDraft, token: &str) -> BackendResult<Post> {
        tracing::debug!("POST {}", self.posts_url);
        let response = self
            .client
            .post(&self.posts_url)
            .bearer_auth(token)
            .json(draft)
            .send()
            .await?;
        decode(check(response)?).await
    }

    /// Full replace of the editable fields; last write wins.
    pub async fn update_post(&self, id: i64, draft: &PostDraft, token: &str) -> BackendResult<Post> {
        let url = self.item_url(id);
        tracing::debug!("PUT {url}");
        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .json(draft)
            .send()
            .await?;
        decode(check(response)?).await
    }

    pub async fn delete_post(&self, id: i64, token: &str) -> BackendResult<()> {
        let url = self.item_url(id);
        tracing::debug!("DELETE {url}");
        let response = self.client.delete(&url).bearer_auth(token).send().await?;
        check(response)?;
        Ok(())
    }

    /// Exchange operator credentials for an opaque session token.
    pub async fn login(&self, username: &str, password: &str) -> BackendResult<String> {
        tracing::debug!("POST {} (login)", self.posts_url);
        let response = self
            .client
            .post(&self.posts_url)
            .json(&json!({
                "action": "login",
                "username": username,
                "password": password,
            }))
            .send()
            .await?;
        let login: LoginResponse = decode(check(response)?).await?;
        Ok(login.token)
    }

    /// Push a base64 image payload to the ingest endpoint; returns the CDN URL.
    pub async fn upload_image(&self, base64_payload: &str, filename: &str) -> BackendResult<String> {
        tracing::debug!("POST {}", self.upload_url);
        let response = self
            .client
            .post(&self.upload_url)
            .json(&json!({
                "image": base64_payload,
                "filename": filename,
            }))
            .send()
            .await?;
        let upload: UploadResponse = decode(check(response)?).await?;
        Ok(upload.url)
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/{id}", self.posts_url)
    }
}

fn check(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status == StatusCode::UNAUTHORIZED {
        Err(BackendError::Unauthorized)
    } else {
        tracing::warn!("backend responded with {status}");
        Err(BackendError::Status(status))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BackendClient {
        BackendClient::new(&BackendConfig {
            posts_url: format!("{}/posts", server.uri()),
            upload_url: format!("{}/upload", server.uri()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn post_json(id: i64, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "preview": "preview text",
            "image_url": "",
            "views": 10,
            "reactions": {},
            "created_at": "2025-01-01T00:00:00",
            "updated_at": "2025-01-01T00:00:00"
        })
    }

    #[tokio::test]
    async fn list_posts_preserves_backend_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                post_json(3, "third"),
                post_json(1, "first"),
                post_json(2, "second"),
            ])))
            .mount(&server)
            .await;

        let posts = client_for(&server).list_posts().await.unwrap();
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn create_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/posts"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(201).set_body_json(post_json(9, "created")))
            .expect(1)
            .mount(&server)
            .await;

        let draft = PostDraft {
            title: "created".into(),
            preview: "preview text".into(),
            ..Default::default()
        };
        let post = client_for(&server)
            .create_post(&draft, "secret-token")
            .await
            .unwrap();
        assert_eq!(post.id, 9);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_dedicated_variant() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/posts/4"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .delete_post(4, "stale-token")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized));
    }

    #[tokio::test]
    async fn other_failures_map_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).list_posts().await.unwrap_err();
        assert!(matches!(
            err,
            BackendError::Status(StatusCode::INTERNAL_SERVER_ERROR)
        ));
    }

    #[tokio::test]
    async fn unexpected_shape_maps_to_decode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"not": "a list"})))
            .mount(&server)
            .await;

        let err = client_for(&server).list_posts().await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[tokio::test]
    async fn login_posts_action_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/posts"))
            .and(body_json(json!({
                "action": "login",
                "username": "operator",
                "password": "hunter2",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok-123"})))
            .mount(&server)
            .await;

        let token = client_for(&server)
            .login("operator", "hunter2")
            .await
            .unwrap();
        assert_eq!(token, "tok-123");
    }

    #[tokio::test]
    async fn upload_returns_cdn_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": "https://cdn.example.com/uploads/abc.png",
                "filename": "abc.png",
                "size": 3
            })))
            .mount(&server)
            .await;

        let url = client_for(&server)
            .upload_image("aGk=", "hi.png")
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example.com/uploads/abc.png");
    }
}
