//! Async runtime for live chess matches.
//!
//! One [`Session`] task owns each match: every move, exit, and clock expiry
//! funnels through its command channel, so nothing else ever mutates match
//! state. The session consults the rules adapter, persists through a
//! [`MatchStore`], keeps both clocks honest, and fans events out through the
//! [`Hub`].
//!
//! ## Architecture
//!
//! - [`Game`] — Match state: sides, status, position, clocks consumed
//! - [`Session`] — Actor task serializing {join, move, exit, timer} events
//! - [`Clocks`] — Inactivity and per-side budget deadlines
//! - [`Hub`] — Per-match connection membership and best-effort fan-out
//! - [`Elo`] — Paired rating update on terminal results
//!
//! ## Wire
//!
//! - [`ServerMessage`] — INIT_GAME / MOVE / GAME_ENDED broadcasts
//! - [`ClientMessage`] — MOVE / EXIT_GAME submissions
//!
//! ## Persistence
//!
//! - [`MatchStore`] — Transactional create/append/finalize contract
//! - [`MemoryStore`] — In-memory store for tests and database-less runs
mod clock;
mod game;
mod hub;
mod memory;
mod protocol;
mod rating;
mod record;
mod repository;
mod session;

pub use clock::*;
pub use game::*;
pub use hub::*;
pub use memory::*;
pub use protocol::*;
pub use rating::*;
pub use record::*;
pub use repository::*;
pub use session::*;
