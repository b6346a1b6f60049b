//! Configuration module
//!
//! One binary covers every deployment variant: the CORS policy and the
//! auxiliary routes are switched here instead of in code.

use std::env;
use std::path::PathBuf;

use axum::http::HeaderValue;

const DEFAULT_ALLOWED_ORIGIN: &str = "https://blogproject-1-3uio.onrender.com";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Fitted vectorizer artifact
    pub vectorizer_path: PathBuf,

    /// Fitted classifier artifact
    pub model_path: PathBuf,

    /// Allowed CORS origins (`*` for any)
    pub allowed_origins: Vec<String>,

    /// Send `Access-Control-Allow-Credentials: true`
    pub allow_credentials: bool,

    /// Serve `GET /ping`
    pub enable_ping: bool,

    /// Answer `OPTIONS` on any path with `200 {}`
    pub enable_preflight: bool,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            vectorizer_path: PathBuf::from("vectorizer.json"),
            model_path: PathBuf::from("best_model.json"),
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            allow_credentials: true,
            enable_ping: true,
            enable_preflight: true,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing or unparsable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(default)
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),

            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),

            vectorizer_path: lookup("VECTORIZER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.vectorizer_path),

            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),

            allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_list(&v))
                .filter(|origins| !origins.is_empty())
                .unwrap_or(defaults.allowed_origins),

            allow_credentials: flag("CORS_ALLOW_CREDENTIALS", defaults.allow_credentials),
            enable_ping: flag("ENABLE_PING", defaults.enable_ping),
            enable_preflight: flag("ENABLE_PREFLIGHT", defaults.enable_preflight),

            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// `*` anywhere in the list opens CORS to every origin
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }

    /// Parsed origin header values. Fails on the first origin that is not a valid header.
    pub fn origin_header_values(&self) -> Result<Vec<HeaderValue>, String> {
        self.allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| format!("invalid CORS origin: {origin:?}"))
            })
            .collect()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
