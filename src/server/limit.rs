//! Per-client anti-abuse limits.
//!
//! One record per client address tracks both the request-counting window
//! (applied to every API request) and the timestamp of the last accepted
//! write (used to enforce a minimum spacing between writes).

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::LimitConfig;
use crate::server::AppState;
use crate::server::client::ClientIp;
use crate::server::response::ApiError;

pub const RATE_LIMITED_MESSAGE: &str = "Demasiadas solicitudes. Intenta más tarde.";
pub const THROTTLED_MESSAGE: &str = "Espera unos segundos antes de intentar de nuevo";

/// Write-throttle entries are kept this many intervals before being swept.
const THROTTLE_RETENTION_FACTOR: u32 = 3;

#[derive(Debug, Clone, Copy)]
struct ClientRecord {
    window_start: Instant,
    count: u32,
    last_write: Option<Instant>,
}

/// Snapshot of a client's request window after a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStatus {
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

impl WindowStatus {
    /// Writes the `RateLimit-*` headers describing this window.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert("ratelimit-limit", HeaderValue::from(self.limit));
        headers.insert("ratelimit-remaining", HeaderValue::from(self.remaining));
        headers.insert("ratelimit-reset", HeaderValue::from(ceil_secs(self.reset_after)));
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

pub struct ClientLimiter {
    config: LimitConfig,
    clients: Mutex<HashMap<IpAddr, ClientRecord>>,
}

impl ClientLimiter {
    #[must_use]
    pub fn new(config: LimitConfig) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &LimitConfig {
        &self.config
    }

    fn throttle_retention(&self) -> Duration {
        self.config
            .min_interval()
            .saturating_mul(THROTTLE_RETENTION_FACTOR)
    }

    fn clients(&self) -> std::sync::MutexGuard<'_, HashMap<IpAddr, ClientRecord>> {
        self.clients.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Counts a request against the client's window.
    ///
    /// Returns `Err` with the window status once the cap is exceeded. Rejected
    /// requests still count, so hammering does not shorten the wait.
    pub fn check_request(&self, ip: IpAddr) -> Result<WindowStatus, WindowStatus> {
        self.check_request_at(ip, Instant::now())
    }

    pub fn check_request_at(&self, ip: IpAddr, now: Instant) -> Result<WindowStatus, WindowStatus> {
        let window = self.config.window();
        let limit = self.config.max_requests;

        let mut clients = self.clients();
        let record = clients.entry(ip).or_insert(ClientRecord {
            window_start: now,
            count: 0,
            last_write: None,
        });

        if now.saturating_duration_since(record.window_start) >= window {
            record.window_start = now;
            record.count = 0;
        }

        record.count = record.count.saturating_add(1);

        let status = WindowStatus {
            limit,
            remaining: limit.saturating_sub(record.count),
            reset_after: window.saturating_sub(now.saturating_duration_since(record.window_start)),
        };

        if record.count > limit {
            Err(status)
        } else {
            Ok(status)
        }
    }

    /// Accepts a write unless the client's previous accepted write is more
    /// recent than the minimum interval. On rejection returns the time left.
    pub fn check_write(&self, ip: IpAddr) -> Result<(), Duration> {
        self.check_write_at(ip, Instant::now())
    }

    pub fn check_write_at(&self, ip: IpAddr, now: Instant) -> Result<(), Duration> {
        let interval = self.config.min_interval();

        let mut clients = self.clients();
        let record = clients.entry(ip).or_insert(ClientRecord {
            window_start: now,
            count: 0,
            last_write: None,
        });

        if let Some(last) = record.last_write {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < interval {
                return Err(interval - elapsed);
            }
        }

        record.last_write = Some(now);
        Ok(())
    }

    /// Drops records whose window has ended and whose last write is older than
    /// the throttle retention. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let window = self.config.window();
        let retention = self.throttle_retention();

        let mut clients = self.clients();
        let before = clients.len();
        clients.retain(|_, record| {
            let window_live = now.saturating_duration_since(record.window_start) < window;
            let write_live = record
                .last_write
                .is_some_and(|last| now.saturating_duration_since(last) < retention);
            window_live || write_live
        });
        before - clients.len()
    }

    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.clients().len()
    }

    /// How often the background sweeper runs.
    #[must_use]
    pub fn sweep_period(&self) -> Duration {
        let retention = self.throttle_retention();
        retention.min(self.config.window()).max(Duration::from_secs(1))
    }

    /// Spawns a task that periodically sweeps stale records.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        let period = self.sweep_period();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = limiter.sweep();
                if removed > 0 {
                    tracing::debug!(removed, "Swept idle client records");
                }
            }
        })
    }
}

/// Middleware applying the request window to every request it wraps.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    request: Request,
    next: Next,
) -> Response {
    match state.limiter.check_request(ip) {
        Ok(status) => {
            let mut response = next.run(request).await;
            status.apply_headers(response.headers_mut());
            response
        }
        Err(status) => {
            tracing::warn!(client = %ip, "Rate limit exceeded");
            let mut response =
                ApiError::too_many_requests(RATE_LIMITED_MESSAGE, status.reset_after).into_response();
            status.apply_headers(response.headers_mut());
            response
        }
    }
}
