//! Authentication, sessions, and player identity.
//!
//! JWT-based authentication with Argon2 password hashing. Every connection
//! resolves to an identity: a registered [`Member`] when the presented token
//! verifies, or a freshly minted [`Lurker`] guest otherwise. Resolution
//! never fails; downstream code branches on the [`User`] variant instead of
//! catching errors.
//!
//! ## Identity Types
//!
//! - [`Member`] — Registered user with rating and win/loss/draw record
//! - [`Lurker`] — Guest identity minted on missing or invalid credentials
//! - [`User`] — Two-variant identity used by the match engine
//! - [`Session`] — Active login session with expiry
//!
//! ## Security
//!
//! - [`Crypto`] — JWT signing and verification
//! - [`Claims`] — JWT payload structure
//! - [`password`] — Argon2 hashing and verification
mod claims;
mod crypto;
mod dto;
mod handlers;
mod identity;
mod lurker;
mod member;
mod middleware;
pub mod password;
mod repository;
mod session;

pub use claims::*;
pub use crypto::*;
pub use dto::*;
pub use handlers::*;
pub use identity::*;
pub use lurker::*;
pub use member::*;
pub use middleware::*;
pub use repository::*;
pub use session::*;
