use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Running total of lines added/removed, persisted between runs.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub lines_added: u64,
    pub lines_removed: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Load the cached line counts, or a zeroed record if none exist yet.
pub fn load(path: &Path) -> StatsRecord {
    let Ok(text) = std::fs::read_to_string(path) else {
        return StatsRecord::default();
    };
    match serde_json::from_str(&text) {
        Ok(record) => record,
        Err(e) => {
            eprintln!("Warning: {} is unreadable, starting from zero: {e}", path.display());
            StatsRecord::default()
        }
    }
}

/// Replace the stored record with new totals and the current timestamp.
pub fn save(path: &Path, additions: u64, deletions: u64) -> Result<()> {
    let record = StatsRecord {
        lines_added: additions,
        lines_removed: deletions,
        last_updated: Some(Utc::now()),
    };
    let text = serde_json::to_string_pretty(&record)?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Saved stats: +{additions} / -{deletions}");
    Ok(())
}
