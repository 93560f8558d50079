use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The authenticated caller's owner id, resolved by the auth middleware and
/// stored as a request extension. Every per-offer query is scoped by it.
#[derive(Debug, Clone, Copy)]
pub struct OwnerId(pub Uuid);

/// Bearer-token auth settings: each API key maps to the owner it acts as.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashMap<String, Uuid>>,
    dev_owner: Uuid,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from `OFFERWATCH_API_KEYS`, a comma-separated list
    /// of `token:owner-uuid` pairs.
    ///
    /// In development, empty/missing keys disable auth and attribute all
    /// requests to `dev_owner`. In non-development envs, empty/missing keys
    /// fail startup.
    pub fn from_env(is_development: bool, dev_owner: Uuid) -> anyhow::Result<Self> {
        let raw = std::env::var("OFFERWATCH_API_KEYS").unwrap_or_default();
        let mut keys = HashMap::new();

        for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let Some((token, owner)) = entry.split_once(':') else {
                anyhow::bail!("OFFERWATCH_API_KEYS entries must be token:owner-uuid pairs");
            };
            let owner = owner
                .trim()
                .parse::<Uuid>()
                .map_err(|e| anyhow::anyhow!("invalid owner uuid in OFFERWATCH_API_KEYS: {e}"))?;
            keys.insert(token.trim().to_owned(), owner);
        }

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "OFFERWATCH_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self {
                    api_keys: Arc::new(HashMap::new()),
                    dev_owner,
                    enabled: false,
                });
            }

            anyhow::bail!(
                "OFFERWATCH_API_KEYS is required outside development; \
                 provide comma-separated token:owner-uuid pairs"
            );
        }

        Ok(Self {
            api_keys: Arc::new(keys),
            dev_owner,
            enabled: true,
        })
    }

    fn resolve(&self, token: &str) -> Option<Uuid> {
        self.api_keys.get(token).copied()
    }
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Sliding fixed-window limiter for simple API protection.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
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

/// Middleware enforcing bearer auth and resolving the caller's [`OwnerId`].
///
/// With auth disabled (development), all requests act as the dev owner.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        req.extensions_mut().insert(OwnerId(auth.dev_owner));
        return next.run(req).await;
    }

    let owner = extract_bearer_token(req.headers().get(AUTHORIZATION))
        .and_then(|token| auth.resolve(token));

    match owner {
        Some(owner) => {
            req.extensions_mut().insert(OwnerId(owner));
            next.run(req).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "unauthorized",
                    message: "missing or invalid bearer token",
                },
            }),
        )
            .into_response(),
    }
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "rate_limited",
                    message: "rate limit exceeded",
                },
            }),
        )
            .into_response();
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_extraction() {
        let header = HeaderValue::from_static("Bearer secret-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("secret-token"));

        let bad = HeaderValue::from_static("Basic dXNlcjpwYXNz");
        assert_eq!(extract_bearer_token(Some(&bad)), None);

        let empty = HeaderValue::from_static("Bearer ");
        assert_eq!(extract_bearer_token(Some(&empty)), None);

        assert_eq!(extract_bearer_token(None), None);
    }
}
