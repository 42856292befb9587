//! Data models for the Candidate Search backend.
//!
//! Candidate records keep the directory's field names; view and queue bodies use
//! camelCase for the frontend.

mod candidate;
mod queue;
mod roster;

pub use candidate::*;
pub use queue::*;
pub use roster::*;
