mod canonical;
mod engine;

pub use canonical::canonical_json;
pub use engine::{ChecksumEngine, ChecksumInput, ChecksumKind};
