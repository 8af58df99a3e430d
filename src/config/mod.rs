use std::env;
use std::net::SocketAddr;

pub mod cache;
pub mod cors;

pub use cache::create_sitemap_cache_layer;
pub use cors::create_cors_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/storefront";
const DEFAULT_XS2_API_URL: &str = "https://api.xs2event.com/v1";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Process-wide settings read once at startup.
///
/// Credentials are optional here: a missing key only disables the routes
/// that need it, and those routes fail with a configuration error.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub xs2_api_url: String,
    pub xs2_api_key: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub public_base_url: Option<String>,
    /// Shared secret callers of the cache revalidation route must present.
    pub revalidate_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            port: parse_or("PORT", DEFAULT_PORT),
            xs2_api_url: optional("XS2_API_URL")
                .unwrap_or_else(|| DEFAULT_XS2_API_URL.to_string()),
            xs2_api_key: optional("XS2_API_KEY"),
            stripe_secret_key: optional("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: optional("STRIPE_WEBHOOK_SECRET"),
            public_base_url: optional("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            revalidate_secret: optional("REVALIDATE_SECRET"),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    /// Logs which integrations are live so a misconfigured deploy is obvious.
    pub fn log_summary(&self) {
        for (name, present) in [
            ("XS2_API_KEY", self.xs2_api_key.is_some()),
            ("STRIPE_SECRET_KEY", self.stripe_secret_key.is_some()),
            ("STRIPE_WEBHOOK_SECRET", self.stripe_webhook_secret.is_some()),
            ("PUBLIC_BASE_URL", self.public_base_url.is_some()),
            ("REVALIDATE_SECRET", self.revalidate_secret.is_some()),
        ] {
            if present {
                tracing::info!(setting = name, "Configured");
            } else {
                tracing::warn!(setting = name, "Not configured; dependent routes will fail");
            }
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match optional(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {key} value '{raw}', using default {default}");
            default
        }),
        None => default,
    }
}
