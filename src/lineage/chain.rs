use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{MirrorDnaError, Result};

use super::record::VersionRecord;

/// Append-only, strictly linear version history for one (domain, module)
/// stream. No forks, no out-of-order insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageChain {
    pub chain_id: String,
    pub records: Vec<VersionRecord>,
    pub created_at: DateTime<Utc>,
    pub metadata: Option<Value>,
}

impl LineageChain {
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            records: Vec::new(),
            created_at: Utc::now(),
            metadata: None,
        }
    }

    /// Appends a record. For a non-empty chain the record's predecessor must
    /// equal the URI of the current tip, otherwise the lineage is broken.
    pub fn append(&mut self, record: VersionRecord) -> Result<()> {
        if let Some(last) = self.records.last() {
            let expected = last.to_uri();
            if record.predecessor.as_deref() != Some(expected.as_str()) {
                return Err(MirrorDnaError::LineageBreak {
                    expected,
                    actual: record
                        .predecessor
                        .clone()
                        .unwrap_or_else(|| "<none>".to_string()),
                });
            }
        }

        debug!(chain_id = %self.chain_id, uri = %record.uri, "lineage record appended");
        self.records.push(record);
        Ok(())
    }

    /// The most recent record, or `None` for an empty chain.
    pub fn get_current(&self) -> Option<&VersionRecord> {
        self.records.last()
    }

    /// Index lookback: `get_ancestor(1)` is the tip's predecessor. Out of
    /// range is a normal `None`, not an error.
    pub fn get_ancestor(&self, generations_back: usize) -> Option<&VersionRecord> {
        let idx = self.records.len().checked_sub(1 + generations_back)?;
        self.records.get(idx)
    }

    /// Re-walks the whole sequence confirming every predecessor link;
    /// detects post-hoc splicing or reordering of a persisted chain.
    /// True by definition for empty and singleton chains.
    pub fn verify_integrity(&self) -> bool {
        self.records
            .windows(2)
            .all(|pair| pair[1].predecessor.as_deref() == Some(pair[0].to_uri().as_str()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
