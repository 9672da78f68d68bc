//! Authenticated client for the WEX private Trade API.
//!
//! Every operation is one signed POST to the TAPI endpoint. Each has an
//! `*_auth` form taking explicit credentials and a short form that uses the
//! pair stored with [`TradeApi::auth`].

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{Result, TradeError, WexError};
use crate::exchange::nonce::NonceSource;
use crate::exchange::signing::sign_tapi;
use crate::exchange::{HttpTransport, SignedRequest, Transport};
use crate::logging::{
    log_nonce_resync, log_reply, log_request, log_trade_error, log_transport_error, v_str,
    Domain, ProfileScope,
};

pub mod de;
pub mod form;
pub mod types;

use de::{flag, keyed, Keyed};
use form::FormBody;
use types::{
    AccountInfo, ActiveOrder, CouponResponse, Direction, HistoryFilter, OrderInfo,
    OrderResponse, RedeemResponse, SortOrder, Trade, Transaction, WithdrawResponse,
};

#[derive(Clone)]
pub struct Credentials {
    key: String,
    secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// `{"success": 0|1, "return": ..., "error": "..."}`
#[derive(Deserialize, Debug)]
struct Envelope {
    #[serde(deserialize_with = "flag")]
    success: bool,
    #[serde(rename = "return", default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

pub struct TradeApi<T: Transport = HttpTransport> {
    transport: T,
    url: String,
    nonce: NonceSource,
    credentials: Option<Credentials>,
}

impl TradeApi<HttpTransport> {
    pub fn new(cfg: &Config) -> Result<Self> {
        let transport = HttpTransport::new(cfg)?;
        Ok(Self::with_transport(cfg, transport))
    }
}

impl<T: Transport> TradeApi<T> {
    pub fn with_transport(cfg: &Config, transport: T) -> Self {
        let nonce = match cfg.nonce_start {
            Some(start) => NonceSource::starting_at(start),
            None => NonceSource::new(),
        };
        Self {
            transport,
            url: cfg.tapi_url.clone(),
            nonce,
            credentials: cfg.credentials().map(|(k, s)| Credentials::new(k, s)),
        }
    }

    /// Store credentials for the short-form operations.
    pub fn auth(&mut self, key: impl Into<String>, secret: impl Into<String>) {
        self.credentials = Some(Credentials::new(key, secret));
    }

    pub fn with_credentials(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.auth(key, secret);
        self
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Move the nonce forward, e.g. to the value named by
    /// [`TradeError::expected_nonce`]. Never moves it back.
    pub fn resync_nonce(&self, nonce: u64) {
        let before = self.nonce.last();
        self.nonce.advance_to(nonce);
        log_nonce_resync(before, self.nonce.last());
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn stored(&self) -> Result<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|c| (c.key.as_str(), c.secret.as_str()))
            .ok_or(WexError::MissingCredentials)
    }

    /// Sign and send one TAPI method, returning the raw `return` payload.
    pub async fn call(
        &self,
        key: &str,
        secret: &str,
        method: &str,
        params: impl FnOnce(&mut FormBody),
    ) -> Result<Value> {
        let nonce = self.nonce.next()?;
        let mut form = FormBody::new(method, nonce);
        params(&mut form);
        let body = form.finish();

        let sign = sign_tapi(&body, secret).map_err(WexError::Signing)?;
        log_request(method, nonce, body.len());

        let request = SignedRequest {
            url: self.url.clone(),
            key: key.to_string(),
            sign,
            body,
        };

        let scope = ProfileScope::with_context(Domain::Http, "tapi_call", &[("method", v_str(method))]);
        let reply = match self.transport.post_form(request).await {
            Ok(reply) => reply,
            Err(e) => {
                log_transport_error(method, &e.to_string());
                return Err(e);
            }
        };
        log_reply(method, reply.status, scope.elapsed_ms());

        let envelope: Envelope = match serde_json::from_str(&reply.body) {
            Ok(env) => env,
            Err(_) if !reply.is_success() => {
                return Err(WexError::Status {
                    status: reply.status,
                    body: reply.body,
                });
            }
            Err(e) => return Err(WexError::Decode(e)),
        };

        if !envelope.success {
            let message = envelope.error.unwrap_or_default();
            log_trade_error(method, &message);
            return Err(TradeError::new(message).into());
        }

        envelope.result.ok_or_else(|| WexError::MissingResult {
            method: method.to_string(),
        })
    }

    async fn call_as<R: DeserializeOwned>(
        &self,
        key: &str,
        secret: &str,
        method: &str,
        params: impl FnOnce(&mut FormBody),
    ) -> Result<R> {
        let value = self.call(key, secret, method, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn call_keyed<R: DeserializeOwned + Keyed>(
        &self,
        key: &str,
        secret: &str,
        method: &str,
        params: impl FnOnce(&mut FormBody),
    ) -> Result<Vec<R>> {
        let value = self.call(key, secret, method, params).await?;
        Ok(keyed(value)?)
    }

    // =========================================================================
    // Account
    // =========================================================================

    pub async fn get_info_auth(&self, key: &str, secret: &str) -> Result<AccountInfo> {
        self.call_as(key, secret, "getInfo", |_| {}).await
    }

    pub async fn get_info(&self) -> Result<AccountInfo> {
        let (key, secret) = self.stored()?;
        self.get_info_auth(key, secret).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Open orders, ascending by id. The exchange answers "no orders" when
    /// there are none.
    pub async fn active_orders_auth(&self, key: &str, secret: &str, pair: &str) -> Result<Vec<ActiveOrder>> {
        let mut orders: Vec<ActiveOrder> = self
            .call_keyed(key, secret, "ActiveOrders", |f| {
                f.push_nonempty("pair", pair);
            })
            .await?;
        orders.sort_by_key(|o| o.order_id);
        Ok(orders)
    }

    pub async fn active_orders(&self, pair: &str) -> Result<Vec<ActiveOrder>> {
        let (key, secret) = self.stored()?;
        self.active_orders_auth(key, secret, pair).await
    }

    pub async fn trade_auth(
        &self,
        key: &str,
        secret: &str,
        pair: &str,
        direction: Direction,
        rate: f64,
        amount: f64,
    ) -> Result<OrderResponse> {
        let rate = finite("rate", rate)?;
        let amount = finite("amount", amount)?;
        self.call_as(key, secret, "Trade", |f| {
            f.push("pair", pair)
                .push("type", direction)
                .push_decimal("rate", rate)
                .push_decimal("amount", amount);
        })
        .await
    }

    pub async fn trade(&self, pair: &str, direction: Direction, rate: f64, amount: f64) -> Result<OrderResponse> {
        let (key, secret) = self.stored()?;
        self.trade_auth(key, secret, pair, direction, rate, amount).await
    }

    pub async fn order_info_auth(&self, key: &str, secret: &str, order_id: u64) -> Result<HashMap<u64, OrderInfo>> {
        let orders: Vec<OrderInfo> = self
            .call_keyed(key, secret, "OrderInfo", |f| {
                f.push("order_id", order_id);
            })
            .await?;
        Ok(orders.into_iter().map(|o| (o.order_id, o)).collect())
    }

    pub async fn order_info(&self, order_id: u64) -> Result<HashMap<u64, OrderInfo>> {
        let (key, secret) = self.stored()?;
        self.order_info_auth(key, secret, order_id).await
    }

    pub async fn cancel_order_auth(&self, key: &str, secret: &str, order_id: u64) -> Result<OrderResponse> {
        self.call_as(key, secret, "CancelOrder", |f| {
            f.push("order_id", order_id);
        })
        .await
    }

    pub async fn cancel_order(&self, order_id: u64) -> Result<OrderResponse> {
        let (key, secret) = self.stored()?;
        self.cancel_order_auth(key, secret, order_id).await
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Trades in the filter's order (DESC unless set). Empty history comes
    /// back either as an empty list or as "no trades".
    pub async fn trade_history_auth(
        &self,
        key: &str,
        secret: &str,
        filter: &HistoryFilter,
        pair: &str,
    ) -> Result<Vec<Trade>> {
        let mut trades: Vec<Trade> = self
            .call_keyed(key, secret, "TradeHistory", |f| {
                filter.apply(f);
                f.push_nonempty("pair", pair);
            })
            .await?;
        sort_by_id(&mut trades, filter.effective_order());
        Ok(trades)
    }

    pub async fn trade_history(&self, filter: &HistoryFilter, pair: &str) -> Result<Vec<Trade>> {
        let (key, secret) = self.stored()?;
        self.trade_history_auth(key, secret, filter, pair).await
    }

    pub async fn transaction_history_auth(
        &self,
        key: &str,
        secret: &str,
        filter: &HistoryFilter,
    ) -> Result<Vec<Transaction>> {
        let mut txs: Vec<Transaction> = self
            .call_keyed(key, secret, "TransHistory", |f| filter.apply(f))
            .await?;
        sort_by_id(&mut txs, filter.effective_order());
        Ok(txs)
    }

    pub async fn transaction_history(&self, filter: &HistoryFilter) -> Result<Vec<Transaction>> {
        let (key, secret) = self.stored()?;
        self.transaction_history_auth(key, secret, filter).await
    }

    // =========================================================================
    // Withdrawals and coupons
    // =========================================================================

    pub async fn withdraw_coin_auth(
        &self,
        key: &str,
        secret: &str,
        currency: &str,
        amount: f64,
        address: &str,
    ) -> Result<WithdrawResponse> {
        let amount = finite("amount", amount)?;
        self.call_as(key, secret, "WithdrawCoin", |f| {
            f.push("coinName", currency)
                .push_decimal("amount", amount)
                .push("address", address);
        })
        .await
    }

    pub async fn withdraw_coin(&self, currency: &str, amount: f64, address: &str) -> Result<WithdrawResponse> {
        let (key, secret) = self.stored()?;
        self.withdraw_coin_auth(key, secret, currency, amount, address).await
    }

    pub async fn create_coupon_auth(
        &self,
        key: &str,
        secret: &str,
        currency: &str,
        amount: f64,
    ) -> Result<CouponResponse> {
        self.create_coupon_inner(key, secret, currency, amount, None).await
    }

    /// Coupon redeemable only by `receiver`.
    pub async fn create_coupon_to_auth(
        &self,
        key: &str,
        secret: &str,
        currency: &str,
        amount: f64,
        receiver: &str,
    ) -> Result<CouponResponse> {
        self.create_coupon_inner(key, secret, currency, amount, Some(receiver)).await
    }

    async fn create_coupon_inner(
        &self,
        key: &str,
        secret: &str,
        currency: &str,
        amount: f64,
        receiver: Option<&str>,
    ) -> Result<CouponResponse> {
        let amount = finite("amount", amount)?;
        self.call_as(key, secret, "CreateCoupon", |f| {
            f.push("currency", currency)
                .push_decimal("amount", amount)
                .push_opt("receiver", receiver);
        })
        .await
    }

    pub async fn create_coupon(&self, currency: &str, amount: f64) -> Result<CouponResponse> {
        let (key, secret) = self.stored()?;
        self.create_coupon_auth(key, secret, currency, amount).await
    }

    pub async fn create_coupon_to(&self, currency: &str, amount: f64, receiver: &str) -> Result<CouponResponse> {
        let (key, secret) = self.stored()?;
        self.create_coupon_to_auth(key, secret, currency, amount, receiver).await
    }

    pub async fn redeem_coupon_auth(&self, key: &str, secret: &str, coupon: &str) -> Result<RedeemResponse> {
        self.call_as(key, secret, "RedeemCoupon", |f| {
            f.push("coupon", coupon);
        })
        .await
    }

    pub async fn redeem_coupon(&self, coupon: &str) -> Result<RedeemResponse> {
        let (key, secret) = self.stored()?;
        self.redeem_coupon_auth(key, secret, coupon).await
    }
}

/// NaN and infinities have no decimal form; reject them before a nonce is spent.
fn finite(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(WexError::InvalidNumber { name, value })
    }
}

fn sort_by_id<R: Keyed>(records: &mut [R], order: SortOrder) {
    match order {
        SortOrder::Asc => records.sort_by_key(|r| r.id()),
        SortOrder::Desc => records.sort_by_key(|r| std::cmp::Reverse(r.id())),
    }
}
