//! Intent dispatch: deterministic rules first, probabilistic fallback
//! second, quote retrieval as the default.

pub mod mapper;
pub mod normalize;
pub mod presets;
pub mod rules;

pub use mapper::{to_command, Confidence, IntentDecision, IntentMapper};
pub use normalize::normalize;
pub use rules::{classify, extract_name, Command, IntentRule};
