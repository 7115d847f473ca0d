//! Cooperative scheduling utilities
//!
//! The core runs as single threaded cooperative tasks. A Doer advances one
//! unit of work per step; a Doist drives all doers round robin. Decks are
//! the only inter task channels.

pub mod decking;
pub mod doing;
pub mod hicting;
