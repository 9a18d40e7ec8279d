//! In-process stand-in for the home cloud service.
//!
//! Records every request and answers from a queue of canned replies;
//! `{"code":0}` once the queue is empty.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    Router,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .map(|v| v.to_str().expect("ascii header").to_string())
    }
}

#[derive(Default)]
struct Inner {
    requests: Mutex<Vec<Recorded>>,
    replies: Mutex<VecDeque<(u16, String)>>,
}

#[derive(Clone)]
pub struct FakeCloud {
    pub base_url: String,
    inner: Arc<Inner>,
}

impl FakeCloud {
    /// Listen on an ephemeral port and serve `/echo/*`.
    pub async fn start() -> Self {
        let inner = Arc::new(Inner::default());
        let app = Router::new().fallback(record).with_state(inner.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        Self {
            base_url: format!("http://{}/echo", addr),
            inner,
        }
    }

    pub fn reply(&self, status: u16, body: impl Into<String>) -> &Self {
        self.inner.replies.lock().push_back((status, body.into()));
        self
    }

    pub fn reply_json(&self, body: Value) -> &Self {
        self.reply(200, body.to_string())
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.requests.lock().clone()
    }

    pub fn last(&self) -> Recorded {
        self.inner.requests.lock().last().cloned().expect("no request recorded")
    }
}

async fn record(
    State(inner): State<Arc<Inner>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    inner.requests.lock().push(Recorded {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: body.to_vec(),
    });
    let (status, body) = inner
        .replies
        .lock()
        .pop_front()
        .unwrap_or((200, r#"{"code":0}"#.to_string()));
    (StatusCode::from_u16(status).unwrap(), body)
}
