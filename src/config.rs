use std::{env, path::PathBuf, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        Ok(Self {
            port,
            database_url,
            host,
        })
    }
}

/// Settings for the storefront client: where orders are posted and where the
/// cart is kept between runs.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub cart_dir: PathBuf,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let api_base_url = env::var("STOREFRONT_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
        let cart_dir = env::var("STOREFRONT_CART_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".storefront"));
        let timeout_secs = env::var("STOREFRONT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(15);
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            cart_dir,
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000".to_string(),
            cart_dir: PathBuf::from(".storefront"),
            request_timeout: Duration::from_secs(15),
        }
    }
}
