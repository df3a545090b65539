use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown in place of a value the server did not report.
pub const PLACEHOLDER: &str = "--";

/// A single timestamped sample from the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Timestamp exactly as the server formatted it. Never parsed.
    pub datetime: String,
    pub temperature: f64,
    pub humidity: f64,
}

/// A value from `/latest`. The backend may send either a bare number or a
/// preformatted string such as `"21.5°C"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Number(n) => write!(f, "{}", n),
            DisplayValue::Text(s) => f.write_str(s),
        }
    }
}

/// Body of `GET /latest`. Both fields are optional; absent and null are the same.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestReading {
    #[serde(default)]
    pub temp: Option<DisplayValue>,
    #[serde(default)]
    pub hum: Option<DisplayValue>,
}

impl LatestReading {
    pub fn temperature_text(&self) -> String {
        display_or_placeholder(self.temp.as_ref())
    }

    pub fn humidity_text(&self) -> String {
        display_or_placeholder(self.hum.as_ref())
    }
}

fn display_or_placeholder(value: Option<&DisplayValue>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Body of `GET /history`, in server order (newest first).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistorySeries(Vec<Reading>);

impl HistorySeries {
    /// Readings in server order.
    pub fn readings(&self) -> &[Reading] {
        &self.0
    }

    /// Readings oldest first, for left-to-right plotting and export.
    pub fn chronological(&self) -> impl Iterator<Item = &Reading> {
        self.0.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Reading>> for HistorySeries {
    fn from(readings: Vec<Reading>) -> Self {
        Self(readings)
    }
}
