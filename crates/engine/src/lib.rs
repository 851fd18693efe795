//! # Parley Engine
//!
//! The conversation session engine: for each caller action it mutates one
//! session's transcript, and for `send_message` it renders bounded context,
//! makes one provider call and records the reply or a classified failure.
//!
//! ```text
//! SessionEngine ──► ContextBuilder   (transcript → prompt text)
//!               ──► GenerationAdapter (prompt → GenerationOutcome)
//!               ──► classifier        (GenerationFailure → error Turn)
//! ```

pub mod adapter;
pub mod classifier;
pub mod context;
pub mod session;

pub use adapter::{
    EMPTY_REPLY_TEXT, FailureKind, GenerationAdapter, GenerationFailure, GenerationOutcome,
};
pub use classifier::{classify, error_message};
pub use context::ContextBuilder;
pub use session::{DEFAULT_PLACEHOLDER, SessionAction, SessionEngine};
