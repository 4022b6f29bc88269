use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::checksum::ChecksumEngine;
use crate::error::{MirrorDnaError, Result};

const URI_SCHEME: &str = "AMOS://";

/// One generation of a versioned state stream, addressed by an `AMOS://` URI
/// and linked to its predecessor.
///
/// Immutable once minted. The checksum covers every field except itself,
/// `created_at` included: it fingerprints the mint event, so two records with
/// identical content minted at different instants hash differently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub uri: String,
    pub domain: String,
    pub module: String,
    pub version: String,
    pub predecessor: Option<String>,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    pub metadata: Option<Value>,
}

impl VersionRecord {
    /// Mints a record stamped with the current instant.
    pub fn new(
        domain: impl Into<String>,
        module: impl Into<String>,
        version: impl Into<String>,
        predecessor: Option<String>,
        metadata: Option<Value>,
    ) -> Self {
        Self::at(Utc::now(), domain, module, version, predecessor, metadata)
    }

    /// Mints a record at an explicit instant.
    pub fn at(
        created_at: DateTime<Utc>,
        domain: impl Into<String>,
        module: impl Into<String>,
        version: impl Into<String>,
        predecessor: Option<String>,
        metadata: Option<Value>,
    ) -> Self {
        let domain = domain.into();
        let module = module.into();
        let version = version.into();
        let uri = format!("{URI_SCHEME}{domain}/{module}/v{version}");

        let checksum = ChecksumEngine::new().checksum_state(&json!({
            "uri": uri,
            "domain": domain,
            "module": module,
            "version": version,
            "predecessor": predecessor,
            "created_at": created_at,
            "metadata": metadata,
        }));

        Self {
            uri,
            domain,
            module,
            version,
            predecessor,
            checksum,
            created_at,
            metadata,
        }
    }

    /// Renders `AMOS://{domain}/{module}/v{version}`.
    pub fn to_uri(&self) -> String {
        self.uri.clone()
    }

    /// Parses an `AMOS://` URI into a freshly minted record. `domain` and
    /// `module` exclude `/`; `version` is the remainder after `v` and may
    /// itself contain `.` or `/`.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let malformed = || MirrorDnaError::MalformedUri(uri.to_string());

        let rest = uri.strip_prefix(URI_SCHEME).ok_or_else(malformed)?;
        let (domain, rest) = rest.split_once('/').ok_or_else(malformed)?;
        let (module, version_part) = rest.split_once('/').ok_or_else(malformed)?;
        let version = version_part.strip_prefix('v').ok_or_else(malformed)?;

        if domain.is_empty() || module.is_empty() || version.is_empty() {
            return Err(malformed());
        }

        Ok(Self::new(domain, module, version, None, None))
    }
}
