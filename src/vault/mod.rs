mod manager;

pub use manager::{Artifact, SessionEvent, VaultManager, VaultSummary};
