use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::de::{flag, num_or_str, Keyed};
use super::form::FormBody;

pub type Funds = HashMap<String, f64>;

fn to_utc(ts: u64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(i64::try_from(ts).ok()?, 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "buy",
            Direction::Sell => "sell",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Direction::Buy),
            "sell" => Ok(Direction::Sell),
            other => Err(format!("unknown direction {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", rename_all = "snake_case")]
pub enum OrderStatus {
    Active,
    Executed,
    Cancelled,
    PartiallyCancelled,
}

impl TryFrom<u8> for OrderStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(OrderStatus::Active),
            1 => Ok(OrderStatus::Executed),
            2 => Ok(OrderStatus::Cancelled),
            3 => Ok(OrderStatus::PartiallyCancelled),
            other => Err(format!("unknown order status {}", other)),
        }
    }
}

// =============================================================================
// getInfo
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rights {
    #[serde(default, deserialize_with = "flag")]
    pub info: bool,
    #[serde(default, deserialize_with = "flag")]
    pub trade: bool,
    #[serde(default, deserialize_with = "flag")]
    pub withdraw: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub funds: Funds,
    #[serde(default)]
    pub rights: Rights,
    #[serde(default)]
    pub transaction_count: u64,
    #[serde(default)]
    pub open_orders: u64,
    pub server_time: u64,
}

impl AccountInfo {
    /// Balance for `currency` (case-insensitive), zero when unlisted.
    pub fn balance(&self, currency: &str) -> f64 {
        self.funds.get(&currency.to_ascii_lowercase()).copied().unwrap_or(0.0)
    }

    pub fn server_time_utc(&self) -> Option<DateTime<Utc>> {
        to_utc(self.server_time)
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveOrder {
    #[serde(skip_deserializing)]
    pub order_id: u64,
    pub pair: String,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub amount: f64,
    pub rate: f64,
    pub timestamp_created: u64,
    pub status: OrderStatus,
}

impl ActiveOrder {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        to_utc(self.timestamp_created)
    }
}

impl Keyed for ActiveOrder {
    fn set_id(&mut self, id: u64) {
        self.order_id = id;
    }
    fn id(&self) -> u64 {
        self.order_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderInfo {
    #[serde(skip_deserializing)]
    pub order_id: u64,
    pub pair: String,
    #[serde(rename = "type")]
    pub direction: Direction,
    #[serde(default)]
    pub start_amount: f64,
    pub amount: f64,
    pub rate: f64,
    pub timestamp_created: u64,
    pub status: OrderStatus,
}

impl OrderInfo {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        to_utc(self.timestamp_created)
    }

    pub fn executed_amount(&self) -> f64 {
        (self.start_amount - self.amount).max(0.0)
    }
}

impl Keyed for OrderInfo {
    fn set_id(&mut self, id: u64) {
        self.order_id = id;
    }
    fn id(&self) -> u64 {
        self.order_id
    }
}

/// Result of `Trade` and `CancelOrder`. `CancelOrder` only fills `order_id`
/// and `funds`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderResponse {
    #[serde(default)]
    pub order_id: u64,
    #[serde(default)]
    pub received: f64,
    #[serde(default)]
    pub remains: f64,
    #[serde(default)]
    pub funds: Funds,
}

// =============================================================================
// History
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    #[serde(skip_deserializing)]
    pub trade_id: u64,
    pub pair: String,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub amount: f64,
    pub rate: f64,
    #[serde(default)]
    pub order_id: u64,
    #[serde(default, deserialize_with = "flag")]
    pub is_your_order: bool,
    pub timestamp: u64,
}

impl Trade {
    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        to_utc(self.timestamp)
    }
}

impl Keyed for Trade {
    fn set_id(&mut self, id: u64) {
        self.trade_id = id;
    }
    fn id(&self) -> u64 {
        self.trade_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Credit,
    Debit,
    Other(u8),
}

impl From<u8> for TransactionKind {
    fn from(code: u8) -> Self {
        match code {
            1 => TransactionKind::Deposit,
            2 => TransactionKind::Withdrawal,
            4 => TransactionKind::Credit,
            5 => TransactionKind::Debit,
            other => TransactionKind::Other(other),
        }
    }
}

impl TransactionKind {
    pub fn code(&self) -> u8 {
        match self {
            TransactionKind::Deposit => 1,
            TransactionKind::Withdrawal => 2,
            TransactionKind::Credit => 4,
            TransactionKind::Debit => 5,
            TransactionKind::Other(c) => *c,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(skip_deserializing)]
    pub transaction_id: u64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub currency: String,
    #[serde(rename = "desc", default)]
    pub description: String,
    #[serde(default)]
    pub status: u8,
    pub timestamp: u64,
}

impl Transaction {
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        to_utc(self.timestamp)
    }
}

impl Keyed for Transaction {
    fn set_id(&mut self, id: u64) {
        self.transaction_id = id;
    }
    fn id(&self) -> u64 {
        self.transaction_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ASC")]
    Asc,
    #[default]
    #[serde(rename = "DESC")]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Optional paging/range parameters for `TradeHistory` and `TransHistory`.
/// Unset fields are omitted and the exchange applies its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub from: Option<u64>,
    pub count: Option<u64>,
    pub from_id: Option<u64>,
    pub end_id: Option<u64>,
    pub order: Option<SortOrder>,
    pub since: Option<u64>,
    pub end: Option<u64>,
}

impl HistoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the first `offset` records (`from`).
    pub fn offset(mut self, offset: u64) -> Self {
        self.from = Some(offset);
        self
    }

    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn from_id(mut self, id: u64) -> Self {
        self.from_id = Some(id);
        self
    }

    pub fn end_id(mut self, id: u64) -> Self {
        self.end_id = Some(id);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn since(mut self, ts: u64) -> Self {
        self.since = Some(ts);
        self
    }

    pub fn end(mut self, ts: u64) -> Self {
        self.end = Some(ts);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Order the exchange will apply.
    pub fn effective_order(&self) -> SortOrder {
        self.order.unwrap_or_default()
    }

    pub(crate) fn apply(&self, form: &mut FormBody) {
        form.push_opt("from", self.from)
            .push_opt("count", self.count)
            .push_opt("from_id", self.from_id)
            .push_opt("end_id", self.end_id)
            .push_opt("order", self.order.map(|o| o.as_str()))
            .push_opt("since", self.since)
            .push_opt("end", self.end);
    }
}

// =============================================================================
// Withdrawals and coupons
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawResponse {
    #[serde(rename = "tId")]
    pub transaction_id: u64,
    #[serde(rename = "amountSent", deserialize_with = "num_or_str")]
    pub amount_sent: f64,
    #[serde(default)]
    pub funds: Funds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponResponse {
    pub coupon: String,
    #[serde(rename = "transID")]
    pub transaction_id: u64,
    #[serde(default)]
    pub funds: Funds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemResponse {
    #[serde(rename = "couponAmount", deserialize_with = "num_or_str")]
    pub coupon_amount: f64,
    #[serde(rename = "couponCurrency")]
    pub coupon_currency: String,
    #[serde(rename = "transID")]
    pub transaction_id: u64,
    #[serde(default)]
    pub funds: Funds,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_account_info_decode() {
        let info: AccountInfo = serde_json::from_value(json!({
            "funds": {"usd": 325.0, "btc": 23.998, "ltc": 0},
            "rights": {"info": 1, "trade": 0, "withdraw": 0},
            "transaction_count": 0,
            "open_orders": 1,
            "server_time": 1342123547
        }))
        .unwrap();
        assert_eq!(info.balance("BTC"), 23.998);
        assert_eq!(info.balance("eur"), 0.0);
        assert!(info.rights.info);
        assert!(!info.rights.withdraw);
        assert_eq!(info.open_orders, 1);
        assert_eq!(info.server_time_utc().unwrap().timestamp(), 1342123547);
    }

    #[test]
    fn test_order_status_codes() {
        let o: ActiveOrder = serde_json::from_value(json!({
            "pair": "btc_usd", "type": "sell", "amount": 12.345,
            "rate": 485, "timestamp_created": 1342448420, "status": 3
        }))
        .unwrap();
        assert_eq!(o.direction, Direction::Sell);
        assert_eq!(o.status, OrderStatus::PartiallyCancelled);

        let bad = serde_json::from_value::<ActiveOrder>(json!({
            "pair": "btc_usd", "type": "sell", "amount": 1,
            "rate": 1, "timestamp_created": 1, "status": 9
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_order_info_executed_amount() {
        let o: OrderInfo = serde_json::from_value(json!({
            "pair": "btc_usd", "type": "buy", "start_amount": 13.345, "amount": 12.345,
            "rate": 485, "timestamp_created": 1342448420, "status": 0
        }))
        .unwrap();
        assert!((o.executed_amount() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_transaction_kind_preserves_unknown() {
        let t: Transaction = serde_json::from_value(json!({
            "type": 7, "amount": 1.0, "currency": "BTC", "desc": "x",
            "status": 2, "timestamp": 1342448420
        }))
        .unwrap();
        assert_eq!(t.kind, TransactionKind::Other(7));
        assert_eq!(t.kind.code(), 7);
        assert_eq!(TransactionKind::from(1), TransactionKind::Deposit);
    }

    #[test]
    fn test_redeem_quoted_amount() {
        let r: RedeemResponse = serde_json::from_value(json!({
            "couponAmount": "1", "couponCurrency": "USD", "transID": 2345,
            "funds": {"usd": 1}
        }))
        .unwrap();
        assert_eq!(r.coupon_amount, 1.0);
        assert_eq!(r.coupon_currency, "USD");
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("BUY".parse::<Direction>().unwrap(), Direction::Buy);
        assert!("hold".parse::<Direction>().is_err());
    }

    #[test]
    fn test_filter_builder() {
        let f = HistoryFilter::new().count(10).order(SortOrder::Asc);
        assert!(!f.is_empty());
        assert_eq!(f.effective_order(), SortOrder::Asc);
        assert!(HistoryFilter::default().is_empty());
        assert_eq!(HistoryFilter::default().effective_order(), SortOrder::Desc);
    }
}
