//! Speaker identification, enrollment, and session routing.

pub mod enroll;
pub mod profile;
pub mod router;

pub use enroll::ENROLL_PROMPTS;
pub use profile::{SpeakerProfile, SpeakerRegistry};
pub use router::{
    is_followup_shaped, self_announced_name, Recognition, RouterState, SpeakerRouter,
    DEFAULT_SESSION,
};
