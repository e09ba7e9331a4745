//! Match hosting: the registry of live sessions and the WebSocket bridge.
//!
//! The [`Lobby`] owns every running match task. Creating a match spawns a
//! session; connecting to one attaches the socket to the session's hub and
//! forwards client frames into its command channel. Sessions clean
//! themselves out of the registry when they end, and matches that are still
//! in storage but no longer in memory are rehydrated on demand.
//!
//! ## Components
//!
//! - [`Lobby`] — Session registry: create, look up, rehydrate, evict
//! - [`bridge`] — Pump between one WebSocket and one match

mod bridge;
mod lobby;

pub use bridge::*;
pub use lobby::*;
