//! Typed wrappers over the dashboard and school endpoints

mod dashboard;
mod schools;

pub use dashboard::{DashboardApi, DashboardData, DashboardSection, OverviewStats};
pub use schools::{filter_schools, School, SchoolDraft, SchoolsApi};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The API sends counts as numbers, numeric strings or null.
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Booleans arrive as `true`/`false`, `0`/`1` or `"0"`/`"1"`.
fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.trim(), "1" | "true"),
        _ => false,
    })
}
