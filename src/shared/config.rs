use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds before a cached entry is considered stale by `fetch`.
    pub stale_time: u64,
    /// Whether mutations emit success notifications.
    pub notify_success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:3000".to_string(),
                auth_token: None,
                request_timeout: 30,
            },
            cache: CacheConfig {
                stale_time: 60,
                notify_success: true,
            },
            logging: LoggingConfig {
                level: "scholars_lib=debug,info".to_string(),
                json: false,
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("SCHOLARS_API_URL") {
            let v = v.trim();
            if !v.is_empty() {
                cfg.api.base_url = v.trim_end_matches('/').to_string();
            }
        }
        if let Ok(v) = std::env::var("SCHOLARS_AUTH_TOKEN") {
            let v = v.trim();
            cfg.api.auth_token = if v.is_empty() {
                None
            } else {
                Some(v.to_string())
            };
        }
        if let Ok(v) = std::env::var("SCHOLARS_REQUEST_TIMEOUT_SECS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.api.request_timeout = value;
        }
        if let Ok(v) = std::env::var("SCHOLARS_CACHE_STALE_SECS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.cache.stale_time = value;
        }
        if let Ok(v) = std::env::var("SCHOLARS_NOTIFY_SUCCESS") {
            cfg.cache.notify_success = parse_bool(&v, cfg.cache.notify_success);
        }
        if let Ok(v) = std::env::var("SCHOLARS_LOG_LEVEL")
            && !v.trim().is_empty()
        {
            cfg.logging.level = v.trim().to_string();
        }
        if let Ok(v) = std::env::var("SCHOLARS_LOG_JSON") {
            cfg.logging.json = parse_bool(&v, cfg.logging.json);
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            return Err(format!(
                "API base_url must be an http(s) URL, got {}",
                self.api.base_url
            ));
        }
        if self.api.request_timeout == 0 {
            return Err("API request_timeout must be greater than 0".to_string());
        }
        if self.logging.level.trim().is_empty() {
            return Err("Logging level must not be empty".to_string());
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
