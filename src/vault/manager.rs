use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::checksum::ChecksumEngine;
use crate::error::Result;
use crate::lineage::{LineageChain, VersionRecord};

/// A checksummed piece of vault content (memory, snapshot, config, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_id: String,
    pub vault_id: String,
    pub artifact_type: String,
    pub content: Value,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    pub metadata: Option<Value>,
}

/// Session continuity log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub session_id: String,
    pub vault_id: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultSummary {
    pub vault_id: String,
    pub total_artifacts: usize,
    pub artifact_types: BTreeMap<String, usize>,
    pub lineage_chains: usize,
    pub session_events: usize,
}

/// Owns the artifacts, lineage chains, and session log for one vault.
///
/// Chains are keyed by `{domain}/{module}` so each identity stream stays
/// strictly linear. All collections are append-only for the manager's
/// lifetime; persistence is a collaborator concern via `export_state`.
pub struct VaultManager {
    vault_id: String,
    engine: ChecksumEngine,
    artifacts: Vec<Artifact>,
    lineage_chains: BTreeMap<String, LineageChain>,
    session_log: Vec<SessionEvent>,
}

impl VaultManager {
    pub fn new(vault_id: impl Into<String>) -> Self {
        Self {
            vault_id: vault_id.into(),
            engine: ChecksumEngine::new(),
            artifacts: Vec::new(),
            lineage_chains: BTreeMap::new(),
            session_log: Vec::new(),
        }
    }

    pub fn vault_id(&self) -> &str {
        &self.vault_id
    }

    /// Creates a checksummed artifact. String content hashes as text,
    /// anything else as canonical state. The id defaults to
    /// `{artifact_type}_{index:04}`.
    pub fn create_artifact(
        &mut self,
        content: Value,
        artifact_type: &str,
        artifact_id: Option<String>,
        metadata: Option<Value>,
    ) -> &Artifact {
        let artifact_id = artifact_id
            .unwrap_or_else(|| format!("{artifact_type}_{:04}", self.artifacts.len()));
        let checksum = self.content_checksum(&content);

        debug!(vault_id = %self.vault_id, artifact_id = %artifact_id, "artifact created");
        self.artifacts.push(Artifact {
            artifact_id,
            vault_id: self.vault_id.clone(),
            artifact_type: artifact_type.to_string(),
            content,
            checksum,
            created_at: Utc::now(),
            metadata,
        });

        // Just pushed, so the vec is non-empty.
        &self.artifacts[self.artifacts.len() - 1]
    }

    pub fn get_artifact(&self, artifact_id: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.artifact_id == artifact_id)
    }

    /// Recomputes an artifact's checksum and compares it against the one
    /// stamped at creation. False for an unknown artifact.
    pub fn verify_artifact_integrity(&self, artifact_id: &str) -> bool {
        match self.get_artifact(artifact_id) {
            Some(artifact) => {
                self.content_checksum(&artifact.content) == artifact.checksum
            }
            None => false,
        }
    }

    /// Appends a version record to the chain for its `{domain}/{module}`
    /// stream, creating the chain on first use. Lineage breaks propagate.
    pub fn track_lineage(&mut self, record: VersionRecord) -> Result<&LineageChain> {
        let chain_id = format!("{}/{}", record.domain, record.module);
        let chain = self
            .lineage_chains
            .entry(chain_id.clone())
            .or_insert_with(|| LineageChain::new(chain_id));
        chain.append(record)?;
        Ok(chain)
    }

    pub fn get_lineage_chain(&self, chain_id: &str) -> Option<&LineageChain> {
        self.lineage_chains.get(chain_id)
    }

    /// Records a session continuity event (start, end, checkpoint, ...).
    pub fn log_session(
        &mut self,
        session_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: Option<Value>,
    ) -> &SessionEvent {
        self.session_log.push(SessionEvent {
            session_id: session_id.into(),
            vault_id: self.vault_id.clone(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            payload,
        });
        &self.session_log[self.session_log.len() - 1]
    }

    pub fn summary(&self) -> VaultSummary {
        let mut artifact_types: BTreeMap<String, usize> = BTreeMap::new();
        for artifact in &self.artifacts {
            *artifact_types.entry(artifact.artifact_type.clone()).or_default() += 1;
        }

        VaultSummary {
            vault_id: self.vault_id.clone(),
            total_artifacts: self.artifacts.len(),
            artifact_types,
            lineage_chains: self.lineage_chains.len(),
            session_events: self.session_log.len(),
        }
    }

    /// Exports the complete vault state for persistence by a collaborator.
    pub fn export_state(&self) -> Result<Value> {
        Ok(json!({
            "vault_id": self.vault_id,
            "artifacts": serde_json::to_value(&self.artifacts)?,
            "lineage_chains": serde_json::to_value(&self.lineage_chains)?,
            "session_log": serde_json::to_value(&self.session_log)?,
            "exported_at": Utc::now(),
        }))
    }

    fn content_checksum(&self, content: &Value) -> String {
        match content {
            Value::String(text) => self.engine.checksum_text(text),
            state => self.engine.checksum_state(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_artifact_stamps_checksum() {
        let mut vault = VaultManager::new("vault_myagent_main");
        let artifact = vault.create_artifact(
            json!({"preference": "Rust over Python"}),
            "memory",
            None,
            None,
        );

        assert_eq!(artifact.artifact_id, "memory_0000");
        assert_eq!(artifact.vault_id, "vault_myagent_main");
        assert_eq!(artifact.checksum.len(), 64);
    }

    #[test]
    fn test_verify_artifact_integrity() {
        let mut vault = VaultManager::new("vault_test");
        vault.create_artifact(json!("plain text content"), "note", Some("note_1".to_string()), None);
        assert!(vault.verify_artifact_integrity("note_1"));
        assert!(!vault.verify_artifact_integrity("missing"));
    }

    #[test]
    fn test_track_lineage_routes_by_domain_module() {
        let mut vault = VaultManager::new("vault_test");
        let v1 = VersionRecord::new("MirrorDNA", "Session", "1.0", None, None);
        let v1_uri = v1.to_uri();
        vault.track_lineage(v1).unwrap();
        vault
            .track_lineage(VersionRecord::new(
                "MirrorDNA",
                "Session",
                "2.0",
                Some(v1_uri),
                None,
            ))
            .unwrap();
        vault
            .track_lineage(VersionRecord::new("MirrorDNA", "Memory", "1.0", None, None))
            .unwrap();

        assert_eq!(vault.get_lineage_chain("MirrorDNA/Session").unwrap().len(), 2);
        assert_eq!(vault.get_lineage_chain("MirrorDNA/Memory").unwrap().len(), 1);
        assert!(vault.get_lineage_chain("MirrorDNA/Other").is_none());
    }

    #[test]
    fn test_track_lineage_propagates_break() {
        let mut vault = VaultManager::new("vault_test");
        vault
            .track_lineage(VersionRecord::new("MirrorDNA", "Session", "1.0", None, None))
            .unwrap();

        let err = vault
            .track_lineage(VersionRecord::new("MirrorDNA", "Session", "2.0", None, None))
            .unwrap_err();
        assert!(matches!(err, crate::error::MirrorDnaError::LineageBreak { .. }));
    }

    #[test]
    fn test_summary_counts() {
        let mut vault = VaultManager::new("vault_test");
        vault.create_artifact(json!({"a": 1}), "memory", None, None);
        vault.create_artifact(json!({"b": 2}), "memory", None, None);
        vault.create_artifact(json!({"c": 3}), "snapshot", None, None);
        vault.log_session("sess_1", "start", None);

        let summary = vault.summary();
        assert_eq!(summary.total_artifacts, 3);
        assert_eq!(summary.artifact_types.get("memory"), Some(&2));
        assert_eq!(summary.artifact_types.get("snapshot"), Some(&1));
        assert_eq!(summary.session_events, 1);
    }

    #[test]
    fn test_export_state_shape() {
        let mut vault = VaultManager::new("vault_test");
        vault.create_artifact(json!({"a": 1}), "memory", None, None);
        vault.log_session("sess_1", "checkpoint", Some(json!({"step": 3})));

        let state = vault.export_state().unwrap();
        assert_eq!(state["vault_id"], "vault_test");
        assert_eq!(state["artifacts"].as_array().unwrap().len(), 1);
        assert_eq!(state["session_log"][0]["event_type"], "checkpoint");
    }
}
