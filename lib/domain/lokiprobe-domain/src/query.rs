//! Query templates, time windows and the tally kept while firing them.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

pub const PATTERN_PLACEHOLDER: &str = "{pattern}";
pub const WINDOW_PLACEHOLDER: &str = "{window}";

/// Longest lookback a time window may describe (about a century).
pub const MAX_WINDOW_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Whether a query endpoint status counts as a success.
///
/// The accepted range stops at 240, not 299. Known anomaly carried over from
/// the load scripts; kept until someone confirms the intended bound.
pub fn is_success_status(code: u16) -> bool {
    (200..=240).contains(&code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Range query returning log lines.
    #[default]
    Logs,
    /// Instant query counting lines over the window.
    Count,
}

/// A lookback duration written in Loki syntax, e.g. `15m` or `6h`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeWindow {
    label: String,
    duration: Duration,
}

impl TimeWindow {
    pub fn parse(raw: &str) -> Result<Self, ProbeError> {
        let label = raw.trim();
        let split = label
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| ProbeError::Config(format!("time window `{raw}` has no unit")))?;
        let (amount, unit) = label.split_at(split);
        let amount: u64 = amount
            .parse()
            .map_err(|_| ProbeError::Config(format!("time window `{raw}` has no amount")))?;
        let unit_secs: u64 = match unit {
            "s" => 1,
            "m" => 60,
            "h" => 60 * 60,
            "d" => 24 * 60 * 60,
            "w" => 7 * 24 * 60 * 60,
            other => {
                return Err(ProbeError::Config(format!(
                    "time window `{raw}` has unknown unit `{other}`"
                )));
            }
        };
        let seconds = amount
            .checked_mul(unit_secs)
            .filter(|seconds| *seconds <= MAX_WINDOW_SECS)
            .ok_or_else(|| ProbeError::Config(format!("time window `{raw}` is too long")))?;
        if seconds == 0 {
            return Err(ProbeError::Config(format!("time window `{raw}` is empty")));
        }
        Ok(Self {
            label: label.to_string(),
            duration: Duration::from_secs(seconds),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl TryFrom<String> for TimeWindow {
    type Error = ProbeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeWindow> for String {
    fn from(window: TimeWindow) -> Self {
        window.label
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// A LogQL expression with optional `{pattern}` and `{window}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTemplate {
    pub name: String,
    #[serde(default)]
    pub kind: QueryKind,
    pub expr: String,
}

impl QueryTemplate {
    pub fn uses_pattern(&self) -> bool {
        self.expr.contains(PATTERN_PLACEHOLDER)
    }

    pub fn render(&self, window: &TimeWindow, pattern: Option<&str>) -> String {
        let expr = self.expr.replace(WINDOW_PLACEHOLDER, window.label());
        match pattern {
            Some(pattern) => expr.replace(PATTERN_PLACEHOLDER, pattern),
            None => expr,
        }
    }
}

/// A fully expanded request ready to be sent to the query endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub template: String,
    pub kind: QueryKind,
    pub expr: String,
    pub window: TimeWindow,
    pub pattern: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: u32,
}

impl QueryRequest {
    /// The LogQL actually sent; count queries wrap the selector in `count_over_time`.
    pub fn logql(&self) -> String {
        match self.kind {
            QueryKind::Logs => self.expr.clone(),
            QueryKind::Count => format!("sum(count_over_time({}[{}]))", self.expr, self.window),
        }
    }

    pub fn describe(&self) -> String {
        match &self.pattern {
            Some(pattern) => format!("{} [{}] pattern={}", self.template, self.window, pattern),
            None => format!("{} [{}]", self.template, self.window),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryTally {
    pub success: u64,
    pub errors: u64,
}

impl QueryTally {
    /// Count a response status; `None` stands for a request that never got one.
    pub fn record(&mut self, status: Option<u16>) -> bool {
        let ok = status.is_some_and(is_success_status);
        if ok {
            self.success += 1;
        } else {
            self.errors += 1;
        }
        ok
    }

    pub fn total(&self) -> u64 {
        self.success + self.errors
    }

    pub fn absorb(&mut self, other: QueryTally) {
        self.success += other.success;
        self.errors += other.errors;
    }
}
