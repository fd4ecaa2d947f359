//! Room membership for Levelcast.
//!
//! A room is the set of players currently playing one level. Rooms are
//! plain data owned by the session manager: created on first join,
//! dropped the moment the last occupant leaves.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — room → occupants, player → room
//! - [`RoomConfig`] — capacity limit
//! - [`RoomInfo`] — read-only summary for listings and stats

mod config;
mod error;
mod registry;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::RoomInfo;
