//! Order filtering by completion state and date range.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::{info, warn};

/// State marking a completed order.
const COMPLETED_STATE: &str = "locked";

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DateRange {
    #[serde(rename = "start_date")]
    pub start: NaiveDate,
    #[serde(rename = "end_date")]
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds if they arrive reversed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// A range covering a single day.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Keep completed orders created within `range`.
///
/// Orders without a `createdTime` (absent, null or a blank string) are
/// dropped silently; unparseable timestamps are dropped with a warning.
pub fn filter_orders(orders: &[Value], range: DateRange) -> Vec<Value> {
    info!("Filtering orders from {}", range);

    let filtered: Vec<Value> = orders
        .iter()
        .filter(|order| order.get("state").and_then(Value::as_str) == Some(COMPLETED_STATE))
        .filter(|order| {
            let Some(created) = created_time(order) else {
                return false;
            };
            match parse_timestamp(created) {
                Some(ts) => range.contains(ts.date()),
                None => {
                    let id = order.get("orderId").unwrap_or(&Value::Null);
                    warn!("Could not parse createdTime {} of order {}", created, id);
                    false
                }
            }
        })
        .cloned()
        .collect();

    info!("Found {} completed orders in date range", filtered.len());
    filtered
}

/// The order's `createdTime`, or `None` when it carries no value at all.
fn created_time(order: &Value) -> Option<&Value> {
    order.get("createdTime").filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

/// Parse an order timestamp.
///
/// Accepts naive ISO-8601 (`2025-11-03T14:05:00`, optional fraction),
/// RFC 3339 with an offset (kept in its own local time), a bare date, or
/// epoch milliseconds.
fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.naive_utc()),
        _ => None,
    }
}
