use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::Result;

use super::assertion::{TruthAssertion, TruthTag};

/// One detected checksum mismatch. Recorded only on mismatch, always paired
/// 1:1 with a DRIFT-tagged assertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftEvent {
    pub detected_at: DateTime<Utc>,
    pub source: String,
    pub expected_checksum: String,
    pub actual_checksum: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriftSummary {
    pub total_drift_events: usize,
    pub recent_drift: Vec<DriftEvent>,
    pub drift_sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnforcerSummary {
    pub total_assertions: usize,
    pub by_tag: HashMap<TruthTag, usize>,
    pub drift_summary: DriftSummary,
}

/// Truth-state log: append-only assertions plus an append-only drift log,
/// scoped to this instance. Nothing is ever mutated or removed; callers
/// wanting retention limits prune externally and re-seed a new enforcer.
#[derive(Debug, Default)]
pub struct TruthStateEnforcer {
    assertions: Vec<TruthAssertion>,
    drift_log: Vec<DriftEvent>,
}

impl TruthStateEnforcer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags a statement as FACT with source verification.
    pub fn assert_fact(
        &mut self,
        statement: impl Into<String>,
        source: impl Into<String>,
        checksum: Option<String>,
        metadata: Option<Value>,
    ) -> Result<&TruthAssertion> {
        let assertion = TruthAssertion::new(
            statement,
            TruthTag::Fact,
            Some(source.into()),
            None,
            checksum,
            metadata,
        )?;
        self.assertions.push(assertion);
        Ok(self.last_assertion())
    }

    /// Tags a statement as ESTIMATE with a confidence level in [0, 1].
    pub fn assert_estimate(
        &mut self,
        statement: impl Into<String>,
        confidence: f64,
        source: Option<String>,
        metadata: Option<Value>,
    ) -> Result<&TruthAssertion> {
        let assertion = TruthAssertion::new(
            statement,
            TruthTag::Estimate,
            source,
            Some(confidence),
            None,
            metadata,
        )?;
        self.assertions.push(assertion);
        Ok(self.last_assertion())
    }

    /// Explicitly tags a knowledge gap as UNKNOWN.
    pub fn assert_unknown(
        &mut self,
        statement: impl Into<String>,
        reason: Option<String>,
        metadata: Option<Value>,
    ) -> Result<&TruthAssertion> {
        let assertion =
            TruthAssertion::new(statement, TruthTag::Unknown, reason, None, None, metadata)?;
        self.assertions.push(assertion);
        Ok(self.last_assertion())
    }

    /// Compares expected vs. actual checksums. On mismatch, appends exactly
    /// one DriftEvent and one DRIFT assertion carrying both checksums and the
    /// context, and returns `true`. On match, returns `false` with no side
    /// effects. Drift is data, never an error.
    pub fn detect_drift(
        &mut self,
        expected_checksum: &str,
        actual_checksum: &str,
        source: &str,
        context: Option<&str>,
    ) -> bool {
        if expected_checksum == actual_checksum {
            return false;
        }

        let detected_at = Utc::now();
        warn!(
            source,
            expected = expected_checksum,
            actual = actual_checksum,
            "drift detected"
        );

        self.drift_log.push(DriftEvent {
            detected_at,
            source: source.to_string(),
            expected_checksum: expected_checksum.to_string(),
            actual_checksum: actual_checksum.to_string(),
            context: context.map(str::to_string),
        });

        self.assertions.push(TruthAssertion {
            statement: format!("Drift detected in {source}"),
            tag: TruthTag::Drift,
            source: Some(source.to_string()),
            confidence: None,
            checksum: None,
            verified_at: detected_at,
            metadata: Some(json!({
                "expected_checksum": expected_checksum,
                "actual_checksum": actual_checksum,
                "context": context,
            })),
        });

        true
    }

    pub fn get_by_tag(&self, tag: TruthTag) -> Vec<&TruthAssertion> {
        self.assertions.iter().filter(|a| a.tag == tag).collect()
    }

    pub fn assertions(&self) -> &[TruthAssertion] {
        &self.assertions
    }

    pub fn drift_log(&self) -> &[DriftEvent] {
        &self.drift_log
    }

    /// Drift statistics: totals, the five most recent events, and the
    /// distinct sources in first-seen order.
    pub fn drift_summary(&self) -> DriftSummary {
        let recent = self.drift_log.iter().rev().take(5).rev().cloned().collect();

        let mut sources: Vec<String> = Vec::new();
        for event in &self.drift_log {
            if !sources.contains(&event.source) {
                sources.push(event.source.clone());
            }
        }

        DriftSummary {
            total_drift_events: self.drift_log.len(),
            recent_drift: recent,
            drift_sources: sources,
        }
    }

    pub fn summary(&self) -> EnforcerSummary {
        let mut by_tag: HashMap<TruthTag, usize> = HashMap::new();
        for assertion in &self.assertions {
            *by_tag.entry(assertion.tag).or_default() += 1;
        }

        EnforcerSummary {
            total_assertions: self.assertions.len(),
            by_tag,
            drift_summary: self.drift_summary(),
        }
    }

    /// Serializes every assertion for persistence by a collaborator.
    pub fn export_assertions(&self) -> Result<Vec<Value>> {
        self.assertions
            .iter()
            .map(|a| serde_json::to_value(a).map_err(Into::into))
            .collect()
    }

    fn last_assertion(&self) -> &TruthAssertion {
        // Only called right after a push.
        &self.assertions[self.assertions.len() - 1]
    }
}
