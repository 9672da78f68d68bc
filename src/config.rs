pub const DEFAULT_TAPI_URL: &str = "https://wex.nz/tapi";

#[derive(Clone, Debug)]
pub struct Config {
    pub tapi_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub timeout_secs: u64,
    /// First nonce to issue; unset means seed from the clock.
    pub nonce_start: Option<u64>,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tapi_url: DEFAULT_TAPI_URL.to_string(),
            api_key: None,
            api_secret: None,
            timeout_secs: 30,
            nonce_start: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            tapi_url: std::env::var("WEX_TAPI_URL").unwrap_or_else(|_| DEFAULT_TAPI_URL.to_string()),
            api_key: std::env::var("API_KEY").ok().filter(|v| !v.is_empty()),
            api_secret: std::env::var("API_SECRET").ok().filter(|v| !v.is_empty()),
            timeout_secs: std::env::var("WEX_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            nonce_start: std::env::var("WEX_NONCE_START").ok().and_then(|v| v.parse().ok()),
            user_agent: std::env::var("WEX_USER_AGENT").unwrap_or_else(|_| default_user_agent()),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.tapi_url = url.into();
        self
    }

    pub fn with_nonce_start(mut self, start: u64) -> Self {
        self.nonce_start = Some(start);
        self
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.api_key, &self.api_secret) {
            (Some(k), Some(s)) => Some((k.as_str(), s.as_str())),
            _ => None,
        }
    }
}

fn default_user_agent() -> String {
    format!("wex-tapi/{}", env!("CARGO_PKG_VERSION"))
}
