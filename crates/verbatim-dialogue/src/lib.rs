//! Turn orchestration: sessions, grounded fact answering, and the
//! assistant loop tying speakers, intents, and retrieval together.

pub mod engine;
pub mod facts;
pub mod manager;
pub mod session;

pub use engine::{Assistant, TurnOutcome, TurnProviders};
pub use facts::{answer_from_fact, join_names, FactAnswer};
pub use manager::DialogueManager;
pub use session::{Session, SessionStore};
