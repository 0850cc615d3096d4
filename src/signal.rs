//! Decoding and validation of inbound TradingView alerts.
//!
//! Alerts arrive as free-form JSON written in TradingView's alert template,
//! so the decoder is lenient about shape (`pair`/`signal` aliases, numbers sent
//! as strings, upper-case actions) and strict about meaning. Anything that
//! fails here is reported to the caller without touching the trading API.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::types::{Symbol, TradeAction, TradeSignal};

#[derive(Debug, Default, Deserialize)]
struct RawSignal {
    #[serde(default, alias = "pair")]
    symbol: Option<String>,
    #[serde(default, alias = "signal")]
    action: Option<String>,
    #[serde(default)]
    quantity: Option<Value>,
    #[serde(default)]
    take_profit: Option<Value>,
    #[serde(default)]
    stop_loss: Option<Value>,
}

/// Acceptance rules applied to every signal.
#[derive(Clone, Debug, Default)]
pub struct SignalPolicy {
    /// Pairs as configured, reported back on `/status`.
    configured: Vec<String>,
    /// Same pairs after [`normalize_pair`], used for matching.
    normalized: Vec<String>,
}

impl SignalPolicy {
    /// An empty list accepts any non-empty symbol.
    pub fn new(supported_pairs: &[String]) -> Self {
        let mut policy = Self::default();
        for pair in supported_pairs {
            let key = normalize_pair(pair);
            if key.is_empty() || policy.normalized.contains(&key) {
                continue;
            }
            policy.configured.push(pair.trim().to_string());
            policy.normalized.push(key);
        }
        policy
    }

    pub fn decode(&self, body: &[u8]) -> Result<TradeSignal, ValidationError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ValidationError::Malformed("empty request body".into()));
        }
        let raw: RawSignal = serde_json::from_slice(body)
            .map_err(|err| ValidationError::Malformed(err.to_string()))?;
        self.validate(raw)
    }

    /// Re-runs every rule on a signal that did not come through [`Self::decode`].
    pub fn check(&self, signal: &TradeSignal) -> Result<(), ValidationError> {
        self.check_symbol(&signal.symbol.0)?;
        check_quantity(signal.quantity)?;
        check_fraction("take_profit", signal.take_profit)?;
        check_fraction("stop_loss", signal.stop_loss)?;
        Ok(())
    }

    fn validate(&self, raw: RawSignal) -> Result<TradeSignal, ValidationError> {
        let symbol = raw.symbol.ok_or(ValidationError::MissingField("symbol"))?;
        let symbol = symbol.trim();
        self.check_symbol(symbol)?;

        let action = raw.action.ok_or(ValidationError::MissingField("action"))?;
        let action =
            TradeAction::parse(&action).ok_or(ValidationError::UnknownAction(action))?;

        let quantity = number_field("quantity", raw.quantity)?;
        check_quantity(quantity)?;
        let take_profit = number_field("take_profit", raw.take_profit)?;
        check_fraction("take_profit", take_profit)?;
        let stop_loss = number_field("stop_loss", raw.stop_loss)?;
        check_fraction("stop_loss", stop_loss)?;

        Ok(TradeSignal {
            symbol: Symbol(symbol.to_string()),
            action,
            quantity,
            take_profit,
            stop_loss,
        })
    }

    pub fn supported_pairs(&self) -> &[String] {
        &self.configured
    }

    fn check_symbol(&self, symbol: &str) -> Result<(), ValidationError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        if !self.normalized.is_empty() && !self.normalized.contains(&normalize_pair(symbol)) {
            return Err(ValidationError::UnsupportedPair(symbol.to_string()));
        }
        Ok(())
    }
}

/// `BTC/USDT`, `btc_usdt` and `BTCUSDT` compare equal.
fn normalize_pair(pair: &str) -> String {
    pair.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn number_field(field: &'static str, value: Option<Value>) -> Result<Option<f64>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| ValidationError::Malformed(format!("{field} is not representable"))),
        // TradingView placeholders are usually substituted inside quotes.
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ValidationError::Malformed(format!("{field} is not a number: {s:?}"))),
        Some(other) => Err(ValidationError::Malformed(format!(
            "{field} is not a number: {other}"
        ))),
    }
}

fn check_quantity(quantity: Option<f64>) -> Result<(), ValidationError> {
    match quantity {
        Some(value) if !(value.is_finite() && value > 0.0) => Err(ValidationError::NonPositive {
            field: "quantity",
            value,
        }),
        _ => Ok(()),
    }
}

fn check_fraction(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0 && v < 1.0) => {
            Err(ValidationError::OutOfRange { field, value: v })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn open_policy() -> SignalPolicy {
        SignalPolicy::default()
    }

    #[test]
    fn decodes_minimal_buy() {
        let signal = open_policy()
            .decode(br#"{"symbol":"BTCUSDT","action":"buy","quantity":0.01}"#)
            .unwrap();
        assert_eq!(
            signal,
            TradeSignal {
                symbol: Symbol("BTCUSDT".into()),
                action: TradeAction::Buy,
                quantity: Some(0.01),
                take_profit: None,
                stop_loss: None,
            }
        );
    }

    #[test]
    fn accepts_legacy_field_names_and_string_numbers() {
        let signal = open_policy()
            .decode(br#"{"pair":"ETH/USDT","signal":"SELL","quantity":"2.5","take_profit":"0.3","stop_loss":0.15,"confidence":0.9}"#)
            .unwrap();
        assert_eq!(signal.symbol, Symbol("ETH/USDT".into()));
        assert_eq!(signal.action, TradeAction::Sell);
        assert_eq!(signal.quantity, Some(2.5));
        assert_eq!(signal.take_profit, Some(0.3));
        assert_eq!(signal.stop_loss, Some(0.15));
    }

    #[test]
    fn rejects_empty_symbol() {
        let err = open_policy()
            .decode(br#"{"symbol":"  ","action":"buy"}"#)
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptySymbol);
    }

    #[test]
    fn rejects_missing_fields() {
        assert_eq!(
            open_policy().decode(br#"{"action":"buy"}"#).unwrap_err(),
            ValidationError::MissingField("symbol")
        );
        assert_eq!(
            open_policy().decode(br#"{"symbol":"BTCUSDT"}"#).unwrap_err(),
            ValidationError::MissingField("action")
        );
    }

    #[test]
    fn rejects_unknown_action() {
        let err = open_policy()
            .decode(br#"{"symbol":"BTCUSDT","action":"hodl"}"#)
            .unwrap_err();
        assert_eq!(err, ValidationError::UnknownAction("hodl".into()));
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let err = open_policy()
            .decode(br#"{"symbol":"BTCUSDT","action":"buy","quantity":0}"#)
            .unwrap_err();
        assert!(matches!(err, ValidationError::NonPositive { field: "quantity", .. }));
    }

    #[test]
    fn rejects_percent_written_as_whole_number() {
        let err = open_policy()
            .decode(br#"{"symbol":"BTCUSDT","action":"buy","take_profit":30}"#)
            .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "take_profit", .. }));
    }

    #[test]
    fn rejects_non_json_and_non_objects() {
        assert!(matches!(
            open_policy().decode(b"not json").unwrap_err(),
            ValidationError::Malformed(_)
        ));
        assert!(matches!(
            open_policy().decode(b"[1,2,3]").unwrap_err(),
            ValidationError::Malformed(_)
        ));
        assert!(matches!(
            open_policy().decode(b"").unwrap_err(),
            ValidationError::Malformed(_)
        ));
    }

    #[test]
    fn allow_list_matches_across_pair_spellings() {
        let policy = SignalPolicy::new(&["BTC/USDT".to_string(), "ETH/USDT".to_string()]);
        assert!(policy
            .decode(br#"{"symbol":"btcusdt","action":"buy"}"#)
            .is_ok());
        assert_eq!(
            policy
                .decode(br#"{"symbol":"DOGE/USDT","action":"buy"}"#)
                .unwrap_err(),
            ValidationError::UnsupportedPair("DOGE/USDT".into())
        );
    }

    #[test]
    fn reports_pairs_as_configured() {
        let policy = SignalPolicy::new(&[
            " BTC/USDT ".to_string(),
            "btcusdt".to_string(),
            "ETH_USDT".to_string(),
            "/".to_string(),
        ]);
        assert_eq!(
            policy.supported_pairs().to_vec(),
            vec!["BTC/USDT".to_string(), "ETH_USDT".to_string()]
        );
    }

    #[test]
    fn check_applies_the_same_rules_to_built_signals() {
        let policy = SignalPolicy::new(&["BTC/USDT".to_string()]);
        let good = TradeSignal {
            symbol: Symbol("BTCUSDT".into()),
            action: TradeAction::Buy,
            quantity: Some(1.0),
            take_profit: Some(0.3),
            stop_loss: None,
        };
        assert_eq!(policy.check(&good), Ok(()));

        let mut empty = good.clone();
        empty.symbol = Symbol(" ".into());
        assert_eq!(policy.check(&empty), Err(ValidationError::EmptySymbol));

        let mut elsewhere = good.clone();
        elsewhere.symbol = Symbol("DOGE/USDT".into());
        assert_eq!(
            policy.check(&elsewhere),
            Err(ValidationError::UnsupportedPair("DOGE/USDT".into()))
        );

        let mut negative = good.clone();
        negative.quantity = Some(-5.0);
        assert!(matches!(
            policy.check(&negative),
            Err(ValidationError::NonPositive { field: "quantity", .. })
        ));

        let mut whole_percent = good;
        whole_percent.take_profit = Some(30.0);
        assert!(matches!(
            policy.check(&whole_percent),
            Err(ValidationError::OutOfRange { field: "take_profit", .. })
        ));
    }
}
