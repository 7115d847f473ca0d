//! VIR (Verifiable Issuance/Revocation Registry) library implementation
//! in Rust.
//!
//! Provides a content-addressed, append-only transaction event log store
//! with an in-memory registry state cache, credential persistence with
//! sad pathed signature sets, and a store and forward enveloping engine
//! for delivering signed events to a recipient via its witnesses or
//! mailboxes.

// Error handling module
mod errors;

// Re-export Error types
pub use crate::errors::MatterError;

pub mod cesr;
pub mod hio;
pub mod vir;

pub use crate::cesr::Matter;
pub use crate::vir::VIRError;
