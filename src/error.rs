//! Error types for the Trade API client.
//!
//! Exchange-reported failures (`success: 0`) are always a [`TradeError`] carrying
//! the literal message. Everything that goes wrong before or around that envelope
//! (transport, HTTP status, JSON shape, local preconditions) is a separate
//! [`WexError`] variant.

use std::fmt;

use thiserror::Error;

pub const NO_ORDERS: &str = "no orders";
pub const NO_TRADES: &str = "no trades";
pub const NO_TRANSACTIONS: &str = "no transactions";
pub const INVALID_ORDER: &str = "invalid order";
pub const BAD_STATUS: &str = "bad status";
pub const NO_WITHDRAW_PERMISSION: &str = "api key dont have withdraw permission";
pub const NO_COUPON_PERMISSION: &str = "api key dont have coupon permission";

/// The exchange's own error text, compared by exact string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradeError {
    msg: String,
}

impl TradeError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }

    pub fn message(&self) -> &str {
        &self.msg
    }

    /// "no orders" / "no trades" / "no transactions".
    pub fn is_empty_result(&self) -> bool {
        matches!(self.msg.as_str(), NO_ORDERS | NO_TRADES | NO_TRANSACTIONS)
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self.msg.as_str(), NO_WITHDRAW_PERMISSION | NO_COUPON_PERMISSION)
    }

    /// e.g. "It is not enough USD for purchase"
    pub fn is_insufficient_funds(&self) -> bool {
        self.msg.starts_with("It is not enough ")
    }

    /// Parses the nonce the exchange asks for in
    /// `invalid nonce parameter; on key:N, you sent:'M', you should send:K`.
    pub fn expected_nonce(&self) -> Option<u64> {
        if !self.msg.starts_with("invalid nonce parameter") {
            return None;
        }
        let (_, tail) = self.msg.rsplit_once("you should send:")?;
        let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}

impl fmt::Display for TradeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

impl std::error::Error for TradeError {}

impl PartialEq<&str> for TradeError {
    fn eq(&self, other: &&str) -> bool {
        self.msg == *other
    }
}

#[derive(Debug, Error)]
pub enum WexError {
    #[error("{0}")]
    Trade(#[from] TradeError),

    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{method}: success without return payload")]
    MissingResult { method: String },

    #[error("missing API key/secret")]
    MissingCredentials,

    #[error("signing: {0}")]
    Signing(String),

    #[error("nonce space exhausted")]
    NonceExhausted,

    #[error("{name} must be a finite number, got {value}")]
    InvalidNumber { name: &'static str, value: f64 },
}

impl WexError {
    pub fn trade_error(&self) -> Option<&TradeError> {
        match self {
            WexError::Trade(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_trade_error(&self) -> bool {
        self.trade_error().is_some()
    }
}

pub type Result<T, E = WexError> = std::result::Result<T, E>;

/// Maps an empty-result [`TradeError`] ("no orders" and friends) to `T::default()`.
pub fn empty_on_no_data<T: Default>(result: Result<T>) -> Result<T> {
    match result {
        Err(WexError::Trade(e)) if e.is_empty_result() => Ok(T::default()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_by_message() {
        assert_eq!(TradeError::new("no orders"), TradeError::new(NO_ORDERS));
        assert_ne!(TradeError::new("no orders"), TradeError::new("no trades"));
        assert_eq!(TradeError::new("bad status"), "bad status");
    }

    #[test]
    fn test_classification() {
        assert!(TradeError::new(NO_TRADES).is_empty_result());
        assert!(!TradeError::new(INVALID_ORDER).is_empty_result());
        assert!(TradeError::new(NO_COUPON_PERMISSION).is_permission_denied());
        assert!(TradeError::new("It is not enough USD for purchase").is_insufficient_funds());
    }

    #[test]
    fn test_expected_nonce() {
        let e = TradeError::new(
            "invalid nonce parameter; on key:1500000100, you sent:'12', you should send:1500000101",
        );
        assert_eq!(e.expected_nonce(), Some(1500000101));
        assert_eq!(TradeError::new("bad status").expected_nonce(), None);
    }

    #[test]
    fn test_empty_on_no_data() {
        let r: Result<Vec<u64>> = Err(TradeError::new(NO_ORDERS).into());
        assert_eq!(empty_on_no_data(r).unwrap(), Vec::<u64>::new());

        let r: Result<Vec<u64>> = Err(TradeError::new(INVALID_ORDER).into());
        let err = empty_on_no_data(r).unwrap_err();
        assert_eq!(err.trade_error(), Some(&TradeError::new(INVALID_ORDER)));
    }

    #[test]
    fn test_display_is_literal_message() {
        let err: WexError = TradeError::new("It is not enough USD for purchase").into();
        assert_eq!(err.to_string(), "It is not enough USD for purchase");
    }
}
