// remote2local/src/test_support.rs
//! In-process HTTP stub used by the async tests, served with `warp`.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use warp::Filter;
use warp::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use warp::http::{HeaderMap, Method, Response, StatusCode};
use warp::hyper::Body;
use warp::hyper::body::Bytes;
use warp::path::FullPath;

/// How the body goes out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    /// Whole body with an exact `Content-Length`.
    Whole,
    /// Chunked transfer encoding, no `Content-Length`.
    Chunked,
    /// Announces `announced` bytes, sends the body, then ends the stream.
    CutShort { announced: usize },
    /// Sends the body and then never finishes.
    Stall,
    /// Never answers at all.
    Silent,
}

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: &'static str,
    delivery: Delivery,
}

impl StubResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        StubResponse {
            status,
            body: body.to_string().into_bytes(),
            content_type: "application/json",
            delivery: Delivery::Whole,
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        StubResponse {
            status,
            body: body.as_bytes().to_vec(),
            content_type: "text/plain",
            delivery: Delivery::Whole,
        }
    }

    pub fn bytes(status: u16, body: Vec<u8>) -> Self {
        StubResponse {
            status,
            body,
            content_type: "application/octet-stream",
            delivery: Delivery::Whole,
        }
    }

    /// A request that is accepted but never gets a response head.
    pub fn silent() -> Self {
        StubResponse {
            delivery: Delivery::Silent,
            ..StubResponse::bytes(200, Vec::new())
        }
    }

    pub fn without_length(mut self) -> Self {
        self.delivery = Delivery::Chunked;
        self
    }

    /// Promise `announced` bytes in `Content-Length` but close after the body.
    pub fn cut_short(mut self, announced: usize) -> Self {
        self.delivery = Delivery::CutShort { announced };
        self
    }

    /// Send the body, then hold the connection open without finishing.
    pub fn stalling(mut self) -> Self {
        self.delivery = Delivery::Stall;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

struct Route {
    method: String,
    path: String,
    /// Served in order; the last one repeats.
    responses: Vec<StubResponse>,
}

#[derive(Default)]
struct StubState {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubState {
    fn record(&self, method: &Method, path: &FullPath, headers: &HeaderMap, body: &Bytes) {
        let headers = headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        self.requests.lock().expect("requests lock").push(RecordedRequest {
            method: method.as_str().to_string(),
            path: path.as_str().to_string(),
            headers,
            body: body.to_vec(),
        });
    }

    fn next_response(&self, method: &Method, path: &FullPath) -> StubResponse {
        let mut routes = self.routes.lock().expect("routes lock");
        let route = routes
            .iter_mut()
            .find(|r| r.method == method.as_str() && r.path == path.as_str());
        match route {
            Some(route) if route.responses.len() > 1 => route.responses.remove(0),
            Some(route) => route
                .responses
                .first()
                .cloned()
                .unwrap_or_else(|| StubResponse::text(404, "no such route")),
            None => StubResponse::text(404, "no such route"),
        }
    }
}

pub struct StubServer {
    addr: SocketAddr,
    state: Arc<StubState>,
    server_handle: tokio::task::JoinHandle<()>,
}

impl StubServer {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());

        let handler_state = Arc::clone(&state);
        let routes = warp::method()
            .and(warp::path::full())
            .and(warp::header::headers_cloned())
            .and(warp::body::bytes())
            .and_then(
                move |method: Method, path: FullPath, headers: HeaderMap, body: Bytes| {
                    let state = Arc::clone(&handler_state);
                    async move {
                        state.record(&method, &path, &headers, &body);
                        let response = state.next_response(&method, &path);
                        Ok::<_, warp::Rejection>(reply(response).await)
                    }
                },
            );

        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        let server_handle = tokio::spawn(server);

        StubServer {
            addr,
            state,
            server_handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn route(&self, method: &str, path: &str, responses: Vec<StubResponse>) {
        self.state.routes.lock().expect("routes lock").push(Route {
            method: method.to_string(),
            path: path.to_string(),
            responses,
        });
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().expect("requests lock").clone()
    }

    pub fn hits(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

async fn reply(response: StubResponse) -> warp::reply::Response {
    if response.delivery == Delivery::Silent {
        std::future::pending::<()>().await;
    }

    let status = StatusCode::from_u16(response.status).expect("valid stub status");
    let builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, response.content_type);

    let (builder, body) = match response.delivery {
        Delivery::Whole | Delivery::Silent => (builder, Body::from(response.body)),
        Delivery::Chunked => (builder, streamed(response.body, false)),
        Delivery::CutShort { announced } => (
            builder.header(CONTENT_LENGTH, announced),
            streamed(response.body, false),
        ),
        Delivery::Stall => (
            builder.header(CONTENT_LENGTH, response.body.len() + 1),
            streamed(response.body, true),
        ),
    };
    builder.body(body).expect("valid stub response")
}

/// Body fed through a channel so it has no size hint. With `hold_open` the
/// sender is kept alive after the data, so the body never completes.
fn streamed(data: Vec<u8>, hold_open: bool) -> Body {
    let (mut sender, body) = Body::channel();
    tokio::spawn(async move {
        if !data.is_empty() && sender.send_data(Bytes::from(data)).await.is_err() {
            return;
        }
        if hold_open {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        drop(sender);
    });
    body
}
