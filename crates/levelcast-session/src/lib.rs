//! Player state for Levelcast.
//!
//! This crate tracks who is connected and what they last told us:
//!
//! 1. **Identity** — which transport connection maps to which
//!    server-assigned [`PlayerId`](levelcast_protocol::PlayerId)
//! 2. **Cached state** — username, appearance and last render frame,
//!    kept so late joiners can be brought up to date
//!
//! # How it fits in the stack
//!
//! ```text
//! Session manager (levelcast)  ← owns this store and the room registry
//!     ↕
//! Player store (this crate)    ← identity + cached player state, no rooms
//!     ↕
//! Protocol (below)             ← PlayerId, Appearance, RenderFrame
//! ```

mod error;
mod player;
mod store;

pub use error::SessionError;
pub use player::Player;
pub use store::PlayerStore;
