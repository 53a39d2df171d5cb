use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter keyed by client address.
///
/// Each client gets `max_requests` per `window`, counted from its first
/// request in the window.
#[derive(Debug, Clone)]
pub struct WriteRateLimitState {
    max_requests: usize,
    window: Duration,
    clients: Arc<Mutex<HashMap<String, RateLimitWindow>>>,
}

impl WriteRateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Counts one request for `client`.
    ///
    /// Returns `Err(retry_after)` when the client is over its limit.
    async fn check(&self, client: &str) -> Result<(), Duration> {
        let mut clients = self.clients.lock().await;
        let now = Instant::now();
        clients.retain(|_, w| now.duration_since(w.started_at) < self.window);

        let entry = clients
            .entry(client.to_string())
            .or_insert(RateLimitWindow {
                started_at: now,
                count: 0,
            });

        if entry.count >= self.max_requests {
            let elapsed = now.duration_since(entry.started_at);
            return Err(self.window.saturating_sub(elapsed));
        }

        entry.count += 1;
        Ok(())
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware limiting offer writes per client address.
///
/// Create, update and delete each have their own quota.
pub async fn enforce_write_rate_limit(
    State(rate_limit): State<WriteRateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(peer);
    let key = format!("ride-offers-{}:{client}", write_operation(req.method()));

    if let Err(retry_after) = rate_limit.check(&key).await {
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_default();
        tracing::warn!(client = %client, key = %key, "write rate limit exceeded");
        return ApiError::new(
            request_id,
            "rate_limited",
            format!(
                "Too many requests. Please try again in {} seconds.",
                retry_after.as_secs().max(1)
            ),
        )
        .into_response();
    }

    next.run(req).await
}

fn write_operation(method: &Method) -> &'static str {
    match *method {
        Method::POST => "create",
        Method::PUT | Method::PATCH => "update",
        Method::DELETE => "delete",
        _ => "other",
    }
}

/// Identifies the client by peer IP.
///
/// `x-forwarded-for` is client-controlled and is ignored.
fn client_key(peer: Option<SocketAddr>) -> String {
    peer.map_or_else(|| "unknown".to_string(), |addr| addr.ip().to_string())
}
