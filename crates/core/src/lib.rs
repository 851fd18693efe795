//! # Parley Core
//!
//! Domain types, traits, and error definitions for the Parley conversation
//! session engine. This crate has **zero framework dependencies**; it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The collaborators of the engine (generation provider, session storage)
//! are defined as traits here. Implementations live in their respective
//! crates, so tests can swap in stubs and the dependency graph points
//! inward on core.

pub mod error;
pub mod provider;
pub mod session;
pub mod transcript;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, SessionError, TranscriptError};
pub use provider::{
    BlockThreshold, GenerationConfig, GenerationRequest, HarmCategory, Provider, ProviderReply,
    SafetySetting,
};
pub use session::{SessionId, SessionStore};
pub use transcript::{DEFAULT_RETENTION_BOUND, MIN_RETENTION_BOUND, Transcript};
pub use turn::{Role, Turn};
