use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::QueryTally;

/// Outcome of one configuration variant, as appended to the results file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub variant: String,
    pub tally: Option<QueryTally>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dashboard_url: Option<String>,
}

impl RunReport {
    /// Dashboard link covering the run, with Grafana-style millisecond bounds.
    pub fn dashboard_link(&self) -> Option<String> {
        let base = self.dashboard_url.as_deref()?;
        let separator = if base.contains('?') { '&' } else { '?' };
        Some(format!(
            "{base}{separator}orgId=1&from={}&to={}",
            self.started_at.timestamp_millis(),
            self.finished_at.timestamp_millis()
        ))
    }

    /// Render the block of lines written for this run, ending in a blank line.
    pub fn render(&self) -> String {
        let mut out = format!("variant: {}\n", self.variant);
        if let Some(tally) = &self.tally {
            out.push_str(&format!(
                "success: {} errors: {}\n",
                tally.success, tally.errors
            ));
        }
        if let Some(link) = self.dashboard_link() {
            out.push_str(&format!("dashboard: {link}\n"));
        }
        out.push('\n');
        out
    }
}
