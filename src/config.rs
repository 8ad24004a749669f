use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub max_body_size: usize,
    pub log_level: String,
    pub tokens: TokenConfig,
    pub page_size: i64,
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    /// Issue a new refresh token on every refresh call.
    pub rotate_refresh_tokens: bool,
    /// When rotating, revoke the refresh token that was presented.
    pub blacklist_after_rotation: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_ttl_minutes: 60,
            refresh_ttl_days: 7,
            rotate_refresh_tokens: false,
            blacklist_after_rotation: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("USERMGMT_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid USERMGMT_HOST: {e}"))?;

        let port: u16 = env_or("USERMGMT_PORT", "8000")
            .parse()
            .map_err(|e| format!("Invalid USERMGMT_PORT: {e}"))?;

        let base_url = env_or("USERMGMT_BASE_URL", &format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        let max_body_size: usize = env_or("USERMGMT_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid USERMGMT_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("USERMGMT_LOG_LEVEL", "info");

        let tokens = TokenConfig {
            access_ttl_minutes: env_or("USERMGMT_ACCESS_TOKEN_MINUTES", "60")
                .parse()
                .map_err(|e| format!("Invalid USERMGMT_ACCESS_TOKEN_MINUTES: {e}"))?,
            refresh_ttl_days: env_or("USERMGMT_REFRESH_TOKEN_DAYS", "7")
                .parse()
                .map_err(|e| format!("Invalid USERMGMT_REFRESH_TOKEN_DAYS: {e}"))?,
            rotate_refresh_tokens: env_flag("USERMGMT_ROTATE_REFRESH_TOKENS", false)?,
            blacklist_after_rotation: env_flag("USERMGMT_BLACKLIST_AFTER_ROTATION", true)?,
        };

        let page_size: i64 = env_or("USERMGMT_PAGE_SIZE", "10")
            .parse()
            .map_err(|e| format!("Invalid USERMGMT_PAGE_SIZE: {e}"))?;
        if page_size < 1 {
            return Err("USERMGMT_PAGE_SIZE must be at least 1".to_string());
        }

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            max_body_size,
            log_level,
            tokens,
            page_size,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str, default: bool) -> Result<bool, String> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(value) => parse_flag(&value).ok_or_else(|| format!("Invalid {key}: '{value}'")),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
