//! Persistent backend-call counters.
//!
//! Total plus per-day buckets over a rolling 30-day window, stored as JSON
//! next to the config file. The pipeline only sees the `UsageSink` trait.

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sp_core::UsageSink;
use std::collections::BTreeMap;
use std::path::Path;

const RETENTION_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageCounters {
    #[serde(default)]
    pub total_calls: u64,
    #[serde(default)]
    pub daily_usage: BTreeMap<NaiveDate, u64>,
}

impl UsageCounters {
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| anyhow::anyhow!("parse usage {}: {e}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(anyhow::anyhow!("read usage {}: {e}", path.display())),
        }
    }

    pub async fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("create data dir {}: {e}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("serialize usage: {e}"))?;
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| anyhow::anyhow!("write usage {}: {e}", path.display()))?;
        Ok(())
    }

    pub fn record_on(&mut self, date: NaiveDate) {
        self.total_calls += 1;
        *self.daily_usage.entry(date).or_insert(0) += 1;
        let cutoff = date - Duration::days(RETENTION_DAYS);
        self.daily_usage.retain(|d, _| *d > cutoff);
    }

    /// Most recent `n` recorded days, oldest first.
    pub fn recent_days(&self, n: usize) -> Vec<(NaiveDate, u64)> {
        let mut days: Vec<(NaiveDate, u64)> = self
            .daily_usage
            .iter()
            .map(|(d, c)| (*d, *c))
            .collect();
        let keep = days.len().saturating_sub(n);
        days.drain(..keep);
        days
    }
}

impl UsageSink for UsageCounters {
    fn record_call(&mut self) {
        self.record_on(Utc::now().date_naive());
    }
}
