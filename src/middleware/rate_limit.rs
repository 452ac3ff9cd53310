use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;

use crate::{
    config::Config,
    utils::{error_codes, error_to_api_response},
};

const KEY_PREFIX: &str = "label:rate_limit:";

/// 基于 Redis 计数的固定窗口限流
#[derive(Clone)]
pub struct RateLimiter {
    redis: redis::Client,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(redis: redis::Client, config: &Config) -> Self {
        Self {
            redis,
            window: config.rate_limit_window(),
            max_requests: config.rate_limit_requests,
        }
    }

    fn client_ip(req: &Request<Body>) -> String {
        let remote_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string());
        // 优先使用代理转发的地址
        req.headers()
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .or_else(|| {
                req.headers()
                    .get("x-forwarded-for")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
            })
            .or(remote_ip.as_deref())
            .unwrap_or("unknown")
            .trim()
            .to_string()
    }

    async fn hit(&self, ip: &str) -> redis::RedisResult<u32> {
        let key = format!("{KEY_PREFIX}{ip}");
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let count: u32 = conn.incr(&key, 1).await?;
        if count == 1 {
            let _: () = conn.expire(&key, self.window.as_secs() as i64).await?;
        }
        Ok(count)
    }

    pub async fn check_rate_limit(&self, req: Request<Body>, next: Next) -> Response {
        let ip = Self::client_ip(&req);
        match self.hit(&ip).await {
            Ok(count) if count > self.max_requests => {
                tracing::warn!("Rate limit exceeded for {}", ip);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    error_to_api_response::<()>(
                        error_codes::RATE_LIMIT,
                        format!(
                            "too many requests, retry in {} seconds",
                            self.window.as_secs()
                        ),
                    ),
                )
                    .into_response()
            }
            Ok(_) => next.run(req).await,
            // Redis 不可用时放行
            Err(e) => {
                tracing::error!("Rate limiter unavailable: {}", e);
                next.run(req).await
            }
        }
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(headers: &[(&str, &str)], peer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/tasks");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        if let Some(peer) = peer {
            req.extensions_mut()
                .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        }
        req
    }

    #[test]
    fn proxy_headers_win_over_peer_address() {
        let req = request(&[("x-real-ip", "10.0.0.1")], Some("127.0.0.1:9000"));
        assert_eq!(RateLimiter::client_ip(&req), "10.0.0.1");

        let req = request(
            &[("x-forwarded-for", " 10.0.0.2, 10.0.0.3")],
            Some("127.0.0.1:9000"),
        );
        assert_eq!(RateLimiter::client_ip(&req), "10.0.0.2");
    }

    #[test]
    fn falls_back_to_peer_then_unknown() {
        let req = request(&[], Some("[::1]:9000"));
        assert_eq!(RateLimiter::client_ip(&req), "::1");

        assert_eq!(RateLimiter::client_ip(&request(&[], None)), "unknown");
    }
}
