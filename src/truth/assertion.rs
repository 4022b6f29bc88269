use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MirrorDnaError, Result};

/// Truth-state classification for a statement.
///
/// FACT is verified against a named source; ESTIMATE is a reasoned inference
/// with a confidence level; UNKNOWN is an acknowledged gap; DRIFT marks a
/// detected deviation from an expected checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TruthTag {
    Fact,
    Estimate,
    Unknown,
    Drift,
}

impl TruthTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TruthTag::Fact => "FACT",
            TruthTag::Estimate => "ESTIMATE",
            TruthTag::Unknown => "UNKNOWN",
            TruthTag::Drift => "DRIFT",
        }
    }
}

/// A statement with explicit epistemic status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthAssertion {
    pub statement: String,
    pub tag: TruthTag,
    pub source: Option<String>,
    pub confidence: Option<f64>,
    pub checksum: Option<String>,
    pub verified_at: DateTime<Utc>,
    pub metadata: Option<Value>,
}

impl TruthAssertion {
    /// Builds an assertion, enforcing the per-tag field rules:
    /// FACT requires a source; ESTIMATE requires a confidence in [0, 1].
    pub fn new(
        statement: impl Into<String>,
        tag: TruthTag,
        source: Option<String>,
        confidence: Option<f64>,
        checksum: Option<String>,
        metadata: Option<Value>,
    ) -> Result<Self> {
        if tag == TruthTag::Fact && source.is_none() {
            return Err(MirrorDnaError::Validation(
                "FACT assertions must include a source".to_string(),
            ));
        }
        if tag == TruthTag::Estimate {
            match confidence {
                None => {
                    return Err(MirrorDnaError::Validation(
                        "ESTIMATE assertions must include a confidence".to_string(),
                    ))
                }
                Some(c) if !(0.0..=1.0).contains(&c) => {
                    return Err(MirrorDnaError::Validation(format!(
                        "confidence must be within [0.0, 1.0], got {c}"
                    )))
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            statement: statement.into(),
            tag,
            source,
            confidence,
            checksum,
            verified_at: Utc::now(),
            metadata,
        })
    }
}
