//! Wire protocol for Levelcast.
//!
//! This crate defines what clients and the relay say to each other:
//!
//! - **Codec** ([`codec::decode`], [`codec::encode`], [`Packet`]) — the
//!   type-length-payload frame every message travels in.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`], [`Tag`]) — the
//!   typed payloads inside a frame.
//! - **Types** ([`PlayerId`], [`RoomId`], [`Appearance`], [`RenderFrame`]).
//! - **Errors** ([`FrameError`], [`ProtocolError`]).
//!
//! It is pure: no I/O, no state. It doesn't know about connections or
//! rooms.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Session (player state)
//! ```

pub mod codec;
mod error;
mod message;
mod types;

pub use codec::{Packet, HEADER_LEN};
pub use error::{FrameError, ProtocolError};
pub use message::{ClientMessage, ServerMessage, Tag};
pub use types::{Appearance, PlayerId, RenderFrame, RoomId};
