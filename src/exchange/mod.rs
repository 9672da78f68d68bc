use async_trait::async_trait;
use reqwest::Client;
use tokio::time::Duration;

use crate::config::Config;
use crate::error::WexError;

pub mod nonce;
pub mod signing;

/// A fully signed TAPI request, ready to POST.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub url: String,
    pub key: String,
    pub sign: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP seam of the client. Production uses [`HttpTransport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_form(&self, req: SignedRequest) -> Result<HttpReply, WexError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(cfg: &Config) -> Result<Self, WexError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(&self, req: SignedRequest) -> Result<HttpReply, WexError> {
        let resp = self.client
            .post(&req.url)
            .header("Key", &req.key)
            .header("Sign", &req.sign)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(req.body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(HttpReply { status, body })
    }
}
