pub mod checksum;
pub mod error;
pub mod lineage;
pub mod store;
pub mod truth;
pub mod vault;

pub use checksum::{canonical_json, ChecksumEngine, ChecksumInput, ChecksumKind};
pub use error::{MirrorDnaError, Result};
pub use lineage::{LineageChain, VersionRecord};
pub use store::{CollectionStore, Record};
pub use truth::{DriftEvent, DriftSummary, EnforcerSummary, TruthAssertion, TruthStateEnforcer, TruthTag};
pub use vault::{Artifact, SessionEvent, VaultManager, VaultSummary};
