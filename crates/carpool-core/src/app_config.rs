use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub geocoder_base_url: String,
    pub geocoder_user_agent: String,
    pub geocoder_timeout_secs: u64,
    pub geocoder_max_attempts: u32,
    pub geocoder_backoff_base_ms: u64,
    pub geocoder_country_codes: String,
    pub write_rate_limit: usize,
    pub write_rate_window_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("geocoder_base_url", &self.geocoder_base_url)
            .field("geocoder_user_agent", &self.geocoder_user_agent)
            .field("geocoder_timeout_secs", &self.geocoder_timeout_secs)
            .field("geocoder_max_attempts", &self.geocoder_max_attempts)
            .field("geocoder_backoff_base_ms", &self.geocoder_backoff_base_ms)
            .field("geocoder_country_codes", &self.geocoder_country_codes)
            .field("write_rate_limit", &self.write_rate_limit)
            .field("write_rate_window_secs", &self.write_rate_window_secs)
            .finish()
    }
}
