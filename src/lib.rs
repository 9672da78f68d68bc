//! Client for the WEX exchange's private Trade API.
//!
//! ```no_run
//! # async fn demo() -> wex_tapi::error::Result<()> {
//! use wex_tapi::{Config, TradeApi};
//!
//! let api = TradeApi::new(&Config::from_env())?;
//! let info = api.get_info_auth("KEY", "SECRET").await?;
//! println!("btc: {}", info.balance("btc"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod tapi;

pub use config::Config;
pub use error::{empty_on_no_data, TradeError, WexError};
pub use tapi::types::{
    AccountInfo, ActiveOrder, CouponResponse, Direction, HistoryFilter, OrderInfo, OrderResponse,
    OrderStatus, RedeemResponse, SortOrder, Trade, Transaction, TransactionKind, WithdrawResponse,
};
pub use tapi::TradeApi;
