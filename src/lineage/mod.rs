mod chain;
mod record;

pub use chain::LineageChain;
pub use record::VersionRecord;
