//! Identity and payload types that travel on the wire.
//!
//! Every multi-byte field is fixed-width little-endian. The `read`
//! helpers assume the caller already checked the payload length, so
//! they never see a short buffer.

use std::fmt;

use bytes::{Buf, BufMut};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Server-assigned player identity.
///
/// Dense and increasing, handed out on connect. This is the only
/// identity clients ever see; transport connection ids stay server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A room, keyed by the game's level id.
///
/// The value comes from the client and is opaque to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(pub i32);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Appearance
// ---------------------------------------------------------------------------

/// Cosmetic icon and colour selection.
///
/// The server caches and forwards this verbatim; none of the values
/// mean anything to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Appearance {
    pub ship: i32,
    pub ball: i32,
    pub bird: i32,
    pub dart: i32,
    pub robot: i32,
    pub spider: i32,
    pub glow: i32,
    pub color: i32,
    pub color2: i32,
}

impl Appearance {
    /// Encoded size in bytes.
    pub const WIRE_LEN: usize = 9 * 4;

    pub(crate) fn write(&self, buf: &mut impl BufMut) {
        for field in [
            self.ship,
            self.ball,
            self.bird,
            self.dart,
            self.robot,
            self.spider,
            self.glow,
            self.color,
            self.color2,
        ] {
            buf.put_i32_le(field);
        }
    }

    pub(crate) fn read(buf: &mut impl Buf) -> Self {
        Self {
            ship: buf.get_i32_le(),
            ball: buf.get_i32_le(),
            bird: buf.get_i32_le(),
            dart: buf.get_i32_le(),
            robot: buf.get_i32_le(),
            spider: buf.get_i32_le(),
            glow: buf.get_i32_le(),
            color: buf.get_i32_le(),
            color2: buf.get_i32_le(),
        }
    }
}

// ---------------------------------------------------------------------------
// RenderFrame
// ---------------------------------------------------------------------------

/// One pose snapshot of a player's avatar.
///
/// The default frame has no flags set, so it is not [`VISIBLE`](Self::VISIBLE):
/// clients hide avatars that have not reported a real position yet.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderFrame {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale: f32,
    /// Game mode the avatar is rendered in (cube, ship, ball, ...).
    pub mode: u8,
    /// Bit set of [`VISIBLE`](Self::VISIBLE), [`FLIPPED`](Self::FLIPPED),
    /// [`DUAL`](Self::DUAL).
    pub flags: u8,
}

impl RenderFrame {
    /// Encoded size in bytes.
    pub const WIRE_LEN: usize = 4 * 4 + 2;

    pub const VISIBLE: u8 = 0x01;
    pub const FLIPPED: u8 = 0x02;
    pub const DUAL: u8 = 0x04;

    /// A visible frame at the given position with unit scale.
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            scale: 1.0,
            flags: Self::VISIBLE,
            ..Self::default()
        }
    }

    pub fn is_visible(&self) -> bool {
        self.flags & Self::VISIBLE != 0
    }

    pub(crate) fn write(&self, buf: &mut impl BufMut) {
        buf.put_f32_le(self.x);
        buf.put_f32_le(self.y);
        buf.put_f32_le(self.rotation);
        buf.put_f32_le(self.scale);
        buf.put_u8(self.mode);
        buf.put_u8(self.flags);
    }

    pub(crate) fn read(buf: &mut impl Buf) -> Self {
        Self {
            x: buf.get_f32_le(),
            y: buf.get_f32_le(),
            rotation: buf.get_f32_le(),
            scale: buf.get_f32_le(),
            mode: buf.get_u8(),
            flags: buf.get_u8(),
        }
    }
}
