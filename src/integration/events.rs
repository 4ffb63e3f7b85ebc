//! Ledger event parsing
//!
//! Inbound event records are loosely typed JSON. Missing or unreadable fields
//! fall back to `"unknown"` / `""` / `0` instead of failing.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event kinds emitted by the lending contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    CollateralDeposited,
    DebtMinted,
    CollateralWithdrawn,
    DebtRepaid,
    PositionLiquidated,
    Unknown,
}

impl EventKind {
    /// Accepts `CollateralDeposited`, `collateral_deposited` and similar spellings
    pub fn from_name(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "collateraldeposited" => EventKind::CollateralDeposited,
            "debtminted" | "stableminted" => EventKind::DebtMinted,
            "collateralwithdrawn" => EventKind::CollateralWithdrawn,
            "debtrepaid" => EventKind::DebtRepaid,
            "positionliquidated" => EventKind::PositionLiquidated,
            _ => EventKind::Unknown,
        }
    }
}

/// Normalized ledger event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub event_type: String,
    pub identity: String,
    pub amount: u128,
    /// Unix seconds
    pub timestamp: u64,
}

impl LedgerEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from_name(&self.event_type)
    }

    /// `None` for a zero or out-of-range timestamp
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        if self.timestamp == 0 {
            return None;
        }
        let secs = i64::try_from(self.timestamp).ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }
}

/// Normalize a raw event payload
///
/// Reads `event_name`, `user` (falling back to `borrower`), `amount` and
/// `timestamp`. Numbers may be JSON numbers, decimal strings or `0x` hex.
pub fn parse_event(raw: &Value) -> LedgerEvent {
    let event_type = raw
        .get("event_name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown")
        .to_string();

    let identity = raw
        .get("user")
        .and_then(Value::as_str)
        .or_else(|| raw.get("borrower").and_then(Value::as_str))
        .unwrap_or("")
        .to_string();

    let amount = raw.get("amount").and_then(numeric).unwrap_or(0);
    let timestamp = raw
        .get("timestamp")
        .and_then(numeric)
        .and_then(|t| u64::try_from(t).ok())
        .unwrap_or(0);

    LedgerEvent {
        event_type,
        identity,
        amount,
        timestamp,
    }
}

fn numeric(value: &Value) -> Option<u128> {
    match value {
        Value::Number(n) => n.as_u64().map(u128::from),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(digits) => u128::from_str_radix(digits, 16).ok(),
                None => s.parse().ok(),
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_event() {
        let event = parse_event(&json!({
            "event_name": "CollateralDeposited",
            "user": "0x123456789abcdef",
            "amount": 250_000_000u64,
            "timestamp": 1_700_000_000u64,
        }));

        assert_eq!(event.event_type, "CollateralDeposited");
        assert_eq!(event.identity, "0x123456789abcdef");
        assert_eq!(event.amount, 250_000_000);
        assert_eq!(event.kind(), EventKind::CollateralDeposited);
        assert_eq!(
            event.occurred_at().unwrap().to_rfc3339(),
            "2023-11-14T22:13:20+00:00"
        );
    }

    #[test]
    fn test_parse_defaults() {
        let event = parse_event(&json!({}));
        assert_eq!(event.event_type, "unknown");
        assert_eq!(event.identity, "");
        assert_eq!(event.amount, 0);
        assert_eq!(event.timestamp, 0);
        assert_eq!(event.kind(), EventKind::Unknown);
        assert_eq!(event.occurred_at(), None);

        let event = parse_event(&json!("not an object"));
        assert_eq!(event.event_type, "unknown");
    }

    #[test]
    fn test_parse_string_numbers_and_borrower() {
        let event = parse_event(&json!({
            "event_name": "position_liquidated",
            "borrower": "0xabc",
            "amount": "0xde0b6b3a7640000",
            "timestamp": "1700000000",
        }));

        assert_eq!(event.identity, "0xabc");
        assert_eq!(event.amount, 1_000_000_000_000_000_000);
        assert_eq!(event.timestamp, 1_700_000_000);
        assert_eq!(event.kind(), EventKind::PositionLiquidated);
    }

    #[test]
    fn test_unreadable_numbers_default_to_zero() {
        let event = parse_event(&json!({
            "amount": -5,
            "timestamp": "yesterday",
        }));
        assert_eq!(event.amount, 0);
        assert_eq!(event.timestamp, 0);
    }
}
