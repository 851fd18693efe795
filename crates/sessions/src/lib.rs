//! Session storage implementations for Parley.
//!
//! Transcripts live only as long as the process; there is no durable
//! backend.

pub mod in_memory;
pub mod locks;

pub use in_memory::InMemorySessionStore;
pub use locks::SessionLocks;
