use axum::http::{header, HeaderValue, Request, Response};
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Shared-cache lifetime for generated sitemaps.
pub const SITEMAP_S_MAXAGE_SECS: u64 = 3600;
/// Window during which a CDN may serve a stale sitemap while refetching.
pub const SITEMAP_STALE_WHILE_REVALIDATE_SECS: u64 = 86400;

const NO_STORE: &str = "no-store";
const FALLBACK_POLICY: &str = "public, s-maxage=3600, stale-while-revalidate=86400";

/// Stamps `Cache-Control` on successful responses so CDNs can hold them.
/// Error responses get `no-store` so a transient failure is never pinned.
#[derive(Clone)]
pub struct CacheControlLayer {
    policy: HeaderValue,
}

impl CacheControlLayer {
    pub fn new(s_maxage_secs: u64, stale_while_revalidate_secs: u64) -> Self {
        let policy = HeaderValue::from_str(&format!(
            "public, s-maxage={s_maxage_secs}, stale-while-revalidate={stale_while_revalidate_secs}"
        ))
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_POLICY));

        Self { policy }
    }
}

impl<S> Layer<S> for CacheControlLayer {
    type Service = CacheControlService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CacheControlService {
            inner,
            policy: self.policy.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CacheControlService<S> {
    inner: S,
    policy: HeaderValue,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CacheControlService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = CacheControlFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        CacheControlFuture {
            future: self.inner.call(request),
            policy: Some(self.policy.clone()),
        }
    }
}

#[pin_project::pin_project]
pub struct CacheControlFuture<F> {
    #[pin]
    future: F,
    policy: Option<HeaderValue>,
}

impl<F, ResBody, E> std::future::Future for CacheControlFuture<F>
where
    F: std::future::Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = Result<Response<ResBody>, E>;

    fn poll(self: std::pin::Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        match this.future.poll(cx) {
            Poll::Ready(Ok(mut response)) => {
                let value = if response.status().is_success() {
                    this.policy
                        .take()
                        .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_POLICY))
                } else {
                    HeaderValue::from_static(NO_STORE)
                };
                response.headers_mut().insert(header::CACHE_CONTROL, value);

                Poll::Ready(Ok(response))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => Poll::Pending,
        }
    }
}

pub fn create_sitemap_cache_layer() -> CacheControlLayer {
    CacheControlLayer::new(SITEMAP_S_MAXAGE_SECS, SITEMAP_STALE_WHILE_REVALIDATE_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn success_responses_get_the_cdn_policy() {
        let app = Router::new()
            .route("/sitemap.xml", get(|| async { "<urlset/>" }))
            .layer(create_sitemap_cache_layer());

        let response = app
            .oneshot(Request::builder().uri("/sitemap.xml").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, s-maxage=3600, stale-while-revalidate=86400"
        );
    }

    #[tokio::test]
    async fn error_responses_are_not_cached() {
        let app = Router::new()
            .route(
                "/sitemap.xml",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .layer(CacheControlLayer::new(60, 120));

        let response = app
            .oneshot(Request::builder().uri("/sitemap.xml").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.headers()[header::CACHE_CONTROL], NO_STORE);
    }
}
