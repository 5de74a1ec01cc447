//! Shared harness for driving the router in-process against the in-memory
//! stores and a temporary images directory.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use shutterbox::{
    config::Config,
    middleware_layer::{auth::REMEMBER_COOKIE, csrf::CSRF_COOKIE},
    repositories::memory::{MemoryGalleryStore, MemoryUserStore},
    router,
    state::AppState,
};
use tempfile::TempDir;
use tower::ServiceExt;

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x06\0\0\0";

const BOUNDARY: &str = "shutterbox-test-boundary";

/// A browser session against a shared application instance.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    images: Arc<TempDir>,
    jar: HashMap<String, String>,
}

impl TestApp {
    pub fn new() -> Self {
        let images = Arc::new(tempfile::tempdir().expect("tempdir"));
        let config = Config {
            images_dir: images.path().to_path_buf(),
            ..Config::default()
        };
        let state = AppState::with_stores(
            config,
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryGalleryStore::new()),
        );
        Self {
            router: router::build(state.clone()),
            state,
            images,
            jar: HashMap::new(),
        }
    }

    /// A second browser with its own cookies, talking to the same app.
    pub fn new_session(&self) -> Self {
        Self {
            state: self.state.clone(),
            router: self.router.clone(),
            images: self.images.clone(),
            jar: HashMap::new(),
        }
    }

    pub fn images_dir(&self) -> &Path {
        self.images.path()
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.jar.get(name).map(String::as_str)
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.jar.insert(name.to_string(), value.to_string());
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        let request = self
            .request("GET", uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Posts a form with the session's CSRF token added.
    pub async fn submit(&mut self, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let token = self.csrf_token().await;
        let mut fields = fields.to_vec();
        fields.push(("csrf_token", &token));
        self.post_form(uri, &fields).await
    }

    /// Uploads `files` as `images` parts, with the CSRF token first.
    pub async fn upload(&mut self, uri: &str, files: &[(&str, &[u8])]) -> Response<Body> {
        let token = self.csrf_token().await;
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"csrf_token\"\r\n\r\n{token}\r\n"
            )
            .as_bytes(),
        );
        for (filename, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = self
            .request("POST", uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// The token the session's forms carry, visiting a page first if the
    /// browser has no CSRF seed yet.
    pub async fn csrf_token(&mut self) -> String {
        if self.cookie(CSRF_COOKIE).is_none() {
            self.get("/").await;
        }
        let seed = self.cookie(CSRF_COOKIE).expect("csrf seed cookie").to_string();
        self.state.csrf.token_for(&seed).as_str().to_string()
    }

    pub async fn signup(&mut self, name: &str, email: &str, password: &str) -> Response<Body> {
        self.submit(
            "/signup",
            &[("name", name), ("email", email), ("password", password)],
        )
        .await
    }

    /// Signs up and checks that the session ended up signed in.
    pub async fn signed_up(&mut self, email: &str) {
        let response = self.signup("Test", email, "longenough").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(self.cookie(REMEMBER_COOKIE).is_some());
    }

    /// Creates a gallery and returns its ID, read off the redirect.
    pub async fn create_gallery(&mut self, title: &str) -> i64 {
        let response = self.submit("/galleries", &[("title", title)]).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        location(&response)
            .trim_start_matches("/galleries/")
            .trim_end_matches("/edit")
            .parse()
            .expect("gallery id in redirect")
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.jar.is_empty() {
            let cookies = self
                .jar
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookies);
        }
        builder
    }

    async fn send(&mut self, request: Request<Body>) -> Response<Body> {
        let response = self.router.clone().oneshot(request).await.unwrap();
        for value in response.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            let mut attrs = value.split(';').map(str::trim);
            let (name, cookie_value) = attrs.next().unwrap().split_once('=').unwrap();
            if attrs.any(|attr| attr.eq_ignore_ascii_case("Max-Age=0")) {
                self.jar.remove(name);
            } else {
                self.jar.insert(name.to_string(), cookie_value.to_string());
            }
        }
        response
    }
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}
