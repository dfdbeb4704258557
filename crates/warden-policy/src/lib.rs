pub mod context;
pub mod decision;
pub mod engine;
pub mod error;
pub mod intent_context;
pub mod path;
pub mod registry;
pub mod scope;

pub use context::{ContextProvider, NoContext, StaticContext};
pub use decision::{
    Allowance, Decision, DenialReason, GovernanceWarning, PostOutcome, SkipReason,
    TraceAppendFailure,
};
pub use engine::GovernanceEngine;
pub use error::GovernanceError;
pub use intent_context::IntentContext;
pub use registry::SessionRegistry;
pub use scope::{authorize, Scope, ScopeDecision, ScopeDenial};
