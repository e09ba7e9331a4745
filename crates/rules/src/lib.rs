//! Board legality adapter for gambit.
//!
//! Thin wrapper around the `chess` crate. The rest of the workspace never
//! touches engine types directly; positions cross this boundary as FEN
//! strings and moves as coordinate pairs.
//!
//! ## Types
//!
//! - [`Position`] — Serialized board state (FEN)
//! - [`Side`] — White or Black
//! - [`Rules`] — Stateless legality, application, and verdict queries
//! - [`Applied`] — Result of a legal move application
//! - [`Verdict`] — Terminal-position classification
mod engine;
mod position;

pub use engine::*;
pub use position::*;
