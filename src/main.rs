use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use serde_json::Value;

use wex_tapi::logging::{log, obj, v_str, Domain, Level};
use wex_tapi::{Config, Direction, HistoryFilter, TradeApi, WexError};

const USAGE: &str = "usage: wex-tapi <command> [args]

commands:
  info
  orders [pair]
  trade <pair> <buy|sell> <rate> <amount>
  order <id>
  cancel <id>
  trades [pair] [count]
  transactions [count]
  withdraw <coin> <amount> <address>
  coupon <currency> <amount> [receiver]
  redeem <code>

credentials come from API_KEY / API_SECRET";

const COMMANDS: &[&str] = &[
    "info", "orders", "trade", "order", "cancel", "trades", "transactions", "withdraw", "coupon", "redeem",
];

/// `Ok(None)` for help, an error for anything not in [`COMMANDS`].
fn command(args: &[String]) -> Result<Option<&str>> {
    match args.get(1).map(String::as_str) {
        None | Some("help" | "-h" | "--help") => Ok(None),
        Some(cmd) if COMMANDS.contains(&cmd) => Ok(Some(cmd)),
        Some(cmd) => bail!("unknown command {:?}\n\n{}", cmd, USAGE),
    }
}

fn arg<'a>(args: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
    args.get(idx)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing <{}>\n\n{}", name, USAGE))
}

fn parse<T: std::str::FromStr>(args: &[String], idx: usize, name: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw = arg(args, idx, name)?;
    raw.parse::<T>().map_err(|e| anyhow!("bad <{}> {:?}: {}", name, raw, e))
}

fn json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

async fn run(api: &TradeApi, cmd: &str, args: &[String]) -> Result<()> {
    let out = match cmd {
        "info" => json(api.get_info().await?),
        "orders" => json(api.active_orders(args.get(2).map(String::as_str).unwrap_or("")).await?),
        "trade" => {
            let (pair, dir, rate, amount) = trade_args(args)?;
            json(api.trade(&pair, dir, rate, amount).await?)
        }
        "order" => {
            let id: u64 = parse(args, 2, "id")?;
            json(api.order_info(id).await?)
        }
        "cancel" => {
            let id: u64 = parse(args, 2, "id")?;
            json(api.cancel_order(id).await?)
        }
        "trades" => {
            let pair = args.get(2).map(String::as_str).unwrap_or("");
            let mut filter = HistoryFilter::new();
            if args.len() > 3 {
                filter = filter.count(parse(args, 3, "count")?);
            }
            json(api.trade_history(&filter, pair).await?)
        }
        "transactions" => {
            let mut filter = HistoryFilter::new();
            if args.len() > 2 {
                filter = filter.count(parse(args, 2, "count")?);
            }
            json(api.transaction_history(&filter).await?)
        }
        "withdraw" => {
            let coin = arg(args, 2, "coin")?;
            let amount: f64 = parse(args, 3, "amount")?;
            let address = arg(args, 4, "address")?;
            json(api.withdraw_coin(coin, amount, address).await?)
        }
        "coupon" => {
            let currency = arg(args, 2, "currency")?;
            let amount: f64 = parse(args, 3, "amount")?;
            match args.get(4) {
                Some(receiver) => json(api.create_coupon_to(currency, amount, receiver).await?),
                None => json(api.create_coupon(currency, amount).await?),
            }
        }
        "redeem" => {
            let code = arg(args, 2, "code")?;
            json(api.redeem_coupon(code).await?)
        }
        other => bail!("unknown command {:?}\n\n{}", other, USAGE),
    };
    println!("{}", serde_json::to_string_pretty(&out?)?);
    Ok(())
}

fn trade_args(args: &[String]) -> Result<(String, Direction, f64, f64)> {
    Ok((
        arg(args, 2, "pair")?.to_string(),
        parse(args, 3, "buy|sell")?,
        parse(args, 4, "rate")?,
        parse(args, 5, "amount")?,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(cmd) = command(&args)? else {
        println!("{}", USAGE);
        return Ok(());
    };
    let cfg = Config::from_env();
    if cfg.credentials().is_none() {
        bail!("API_KEY and API_SECRET must be set\n\n{}", USAGE);
    }
    let api = TradeApi::new(&cfg).context("building http client")?;

    log(
        Level::Debug,
        Domain::System,
        "start",
        obj(&[
            ("command", v_str(cmd)),
            ("endpoint", v_str(&cfg.tapi_url)),
        ]),
    );

    if let Err(err) = run(&api, cmd, &args).await {
        if let Some(WexError::Trade(e)) = err.downcast_ref::<WexError>() {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_help_needs_no_credentials() {
        assert_eq!(command(&argv(&["wex-tapi"])).unwrap(), None);
        assert_eq!(command(&argv(&["wex-tapi", "help"])).unwrap(), None);
        assert_eq!(command(&argv(&["wex-tapi", "--help"])).unwrap(), None);
    }

    #[test]
    fn test_known_and_unknown_commands() {
        assert_eq!(command(&argv(&["wex-tapi", "trade", "btc_usd"])).unwrap(), Some("trade"));
        let err = command(&argv(&["wex-tapi", "bogus"])).unwrap_err();
        assert!(err.to_string().contains("unknown command \"bogus\""));
    }

    #[test]
    fn test_json_of_response() {
        let v = json(Direction::Buy).unwrap();
        assert_eq!(v, Value::String("buy".to_string()));
    }
}
