use std::fmt::Display;

use url::form_urlencoded::Serializer;

/// `application/x-www-form-urlencoded` body: `method=..&nonce=..` followed by
/// the method parameters in insertion order.
pub struct FormBody {
    inner: Serializer<'static, String>,
}

impl FormBody {
    pub fn new(method: &str, nonce: u64) -> Self {
        let mut inner = Serializer::new(String::new());
        inner.append_pair("method", method);
        inner.append_pair("nonce", &nonce.to_string());
        Self { inner }
    }

    pub fn push(&mut self, name: &str, value: impl Display) -> &mut Self {
        self.inner.append_pair(name, &value.to_string());
        self
    }

    pub fn push_opt<V: Display>(&mut self, name: &str, value: Option<V>) -> &mut Self {
        if let Some(v) = value {
            self.push(name, v);
        }
        self
    }

    /// Skipped when `value` is empty.
    pub fn push_nonempty(&mut self, name: &str, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.push(name, value);
        }
        self
    }

    pub fn push_decimal(&mut self, name: &str, value: f64) -> &mut Self {
        self.push(name, format_decimal(value))
    }

    pub fn finish(mut self) -> String {
        self.inner.finish()
    }
}

/// Shortest decimal that round-trips, never in exponent notation.
pub fn format_decimal(value: f64) -> String {
    // f64's Display already has both properties.
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_and_nonce_lead() {
        let mut f = FormBody::new("Trade", 7);
        f.push("pair", "btc_usd").push("type", "buy").push_decimal("rate", 900.0);
        assert_eq!(f.finish(), "method=Trade&nonce=7&pair=btc_usd&type=buy&rate=900");
    }

    #[test]
    fn test_optional_and_empty_skipped() {
        let mut f = FormBody::new("ActiveOrders", 1);
        f.push_opt("count", None::<u64>).push_nonempty("pair", "");
        assert_eq!(f.finish(), "method=ActiveOrders&nonce=1");
    }

    #[test]
    fn test_values_are_escaped() {
        let mut f = FormBody::new("WithdrawCoin", 1);
        f.push("address", "a b&c=d");
        assert_eq!(f.finish(), "method=WithdrawCoin&nonce=1&address=a+b%26c%3Dd");
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(0.001), "0.001");
        assert_eq!(format_decimal(1.0), "1");
        assert_eq!(format_decimal(0.00000001), "0.00000001");
        assert_eq!(format_decimal(485.123), "485.123");
    }
}
