//! In-process store for session tests.
//!
//! `RouterTransport` feeds requests straight into the store's axum router via
//! `oneshot`, so tests exercise the real handlers without sockets and can run
//! under paused tokio time. The link can be cut to simulate an outage.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::Request;
use axum::Router;
use http_body_util::BodyExt;
use todo_client::{ApiError, ClientConfig, HttpMethod, HttpRequest, HttpResponse, Session, Transport};
use todo_store::MemoryStore;
use tower::ServiceExt;

pub const BASE_URL: &str = "http://store.test";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Up,
    /// Fail immediately, like a refused connection.
    Refused,
    /// Never answer; the caller's timeout fires.
    Hanging,
}

#[derive(Clone)]
pub struct RouterTransport {
    router: Router,
    link: Arc<Mutex<Link>>,
}

impl Transport for RouterTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let link = *self.link.lock().unwrap();
        match link {
            Link::Up => {}
            Link::Refused => return Err(ApiError::Transport("connection refused".into())),
            Link::Hanging => std::future::pending::<()>().await,
        }

        let uri = request
            .path
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.path)
            .to_string();
        let method = match request.method {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        };
        let mut builder = Request::builder().method(method).uri(uri);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        let req = builder.body(request.body.unwrap_or_default()).unwrap();

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status().as_u16();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

/// A store plus a switch for the network between it and the client.
pub struct Backend {
    pub store: MemoryStore,
    link: Arc<Mutex<Link>>,
    router: Router,
}

impl Backend {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        Backend {
            router: todo_store::app(store.clone()),
            store,
            link: Arc::new(Mutex::new(Link::Up)),
        }
    }

    pub fn set_link(&self, link: Link) {
        *self.link.lock().unwrap() = link;
    }

    pub fn transport(&self) -> RouterTransport {
        RouterTransport {
            router: self.router.clone(),
            link: Arc::clone(&self.link),
        }
    }

    /// Session with the default one-second unit: probe timeout 3s, CRUD 5s,
    /// connected interval 5s, backoff capped at 30s.
    pub fn session(&self) -> Session<RouterTransport> {
        let config = ClientConfig::new(BASE_URL).with_time_unit(Duration::from_secs(1));
        Session::new(config, self.transport())
    }
}
