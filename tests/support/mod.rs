#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use wiremock::MockServer;

use showcase_web::config::{
    BackendConfig, ChannelConfig, Config, ServerConfig, SessionConfig, ShowcaseConfig,
};
use showcase_web::services::BackendClient;
use showcase_web::{app, AppState};

pub const SESSION_COOKIE: &str = "showcase_session";
pub const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Router wired against a wiremock double of the remote backend.
pub fn test_app(server: &MockServer) -> Router {
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        backend: BackendConfig {
            posts_url: format!("{}/posts", server.uri()),
            upload_url: format!("{}/upload", server.uri()),
            timeout_secs: 5,
        },
        channel: ChannelConfig {
            name: "Test Channel".into(),
            handle: "testchannel".into(),
            tagline: "A channel about tests".into(),
            subscribers: 42,
            avatar_url: String::new(),
        },
        showcase: ShowcaseConfig { top_posts: 3 },
        session: SessionConfig {
            cookie: SESSION_COOKIE.into(),
        },
    };
    let backend = BackendClient::new(&config.backend).unwrap();
    app(AppState { config, backend })
}

pub fn post_json(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "preview": format!("preview of {title}"),
        "image_url": "",
        "views": 10,
        "reactions": {},
        "created_at": "2025-01-01T00:00:00",
        "updated_at": "2025-01-01T00:00:00"
    })
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_authed(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("{SESSION_COOKIE}=tok-123"))
        .body(Body::empty())
        .unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Multipart admin-form request carrying the given text fields.
pub fn post_multipart(uri: &str, fields: &[(&str, &str)], authed: bool) -> Request<Body> {
    post_multipart_with_file(uri, fields, None, authed)
}

/// Same, with an optional `(filename, content_type, bytes)` file part under
/// the `image_file` field.
pub fn post_multipart_with_file(
    uri: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
    authed: bool,
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image_file\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if authed {
        builder = builder.header(header::COOKIE, format!("{SESSION_COOKIE}=tok-123"));
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// All Set-Cookie header values of a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// True when the response clears the session cookie.
pub fn clears_session(response: &Response<Body>) -> bool {
    set_cookies(response)
        .iter()
        .any(|c| c.starts_with(&format!("{SESSION_COOKIE}=")) && c.contains("Max-Age=0"))
}

/// True when the response stores the given session token.
pub fn stores_session(response: &Response<Body>, token: &str) -> bool {
    set_cookies(response)
        .iter()
        .any(|c| c.starts_with(&format!("{SESSION_COOKIE}={token}")))
}
