mod assertion;
mod enforcer;

pub use assertion::{TruthAssertion, TruthTag};
pub use enforcer::{DriftEvent, DriftSummary, EnforcerSummary, TruthStateEnforcer};
