//! Typed relay messages and their payload layouts.
//!
//! Client → server messages are [`ClientMessage`]; server → client
//! messages are [`ServerMessage`]. Both sides can encode and decode
//! both directions, so test clients and the server share one codec.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use levelcast_transport::Channel;

use crate::codec::{self, Packet};
use crate::{Appearance, PlayerId, ProtocolError, RenderFrame, RoomId};

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

/// The tag byte at the front of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    JoinLevel = 0x01,
    LeaveLevel = 0x02,
    RenderData = 0x03,
    Appearance = 0x04,
    Username = 0x05,
    Welcome = 0x80,
    PlayerJoined = 0x81,
    PlayerLeft = 0x82,
    RenderDataRelay = 0x83,
    AppearanceRelay = 0x84,
    UsernameRelay = 0x85,
}

impl Tag {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x01 => Self::JoinLevel,
            0x02 => Self::LeaveLevel,
            0x03 => Self::RenderData,
            0x04 => Self::Appearance,
            0x05 => Self::Username,
            0x80 => Self::Welcome,
            0x81 => Self::PlayerJoined,
            0x82 => Self::PlayerLeft,
            0x83 => Self::RenderDataRelay,
            0x84 => Self::AppearanceRelay,
            0x85 => Self::UsernameRelay,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::JoinLevel => "JOIN_LEVEL",
            Self::LeaveLevel => "LEAVE_LEVEL",
            Self::RenderData => "RENDER_DATA",
            Self::Appearance => "APPEARANCE",
            Self::Username => "USERNAME",
            Self::Welcome => "WELCOME",
            Self::PlayerJoined => "PLAYER_JOINED",
            Self::PlayerLeft => "PLAYER_LEFT",
            Self::RenderDataRelay => "RENDER_DATA_RELAY",
            Self::AppearanceRelay => "APPEARANCE_RELAY",
            Self::UsernameRelay => "USERNAME_RELAY",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// A message a client sends to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Enter the room for this level.
    JoinLevel { room_id: RoomId },
    /// Leave the current room.
    LeaveLevel,
    /// Latest avatar pose.
    RenderData(RenderFrame),
    /// Latest icon/colour selection.
    Appearance(Appearance),
    /// Display name.
    Username(String),
}

impl ClientMessage {
    pub fn tag(&self) -> Tag {
        match self {
            Self::JoinLevel { .. } => Tag::JoinLevel,
            Self::LeaveLevel => Tag::LeaveLevel,
            Self::RenderData(_) => Tag::RenderData,
            Self::Appearance(_) => Tag::Appearance,
            Self::Username(_) => Tag::Username,
        }
    }

    /// Decodes one framed client message.
    ///
    /// # Errors
    /// Any [`ProtocolError`]: bad frame, unknown or server-only tag,
    /// wrong payload size, or non-UTF-8 username.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        Self::from_packet(&codec::decode(data)?)
    }

    /// Interprets an already-split frame.
    pub fn from_packet(packet: &Packet) -> Result<Self, ProtocolError> {
        let tag = match Tag::from_u8(packet.tag) {
            Some(
                tag @ (Tag::JoinLevel
                | Tag::LeaveLevel
                | Tag::RenderData
                | Tag::Appearance
                | Tag::Username),
            ) => tag,
            _ => return Err(ProtocolError::UnknownTag(packet.tag)),
        };
        let mut payload = packet.payload.as_ref();

        let msg = match tag {
            Tag::JoinLevel => {
                expect_len(tag, payload, 4)?;
                Self::JoinLevel {
                    room_id: RoomId(payload.get_i32_le()),
                }
            }
            Tag::LeaveLevel => {
                expect_len(tag, payload, 0)?;
                Self::LeaveLevel
            }
            Tag::RenderData => {
                expect_len(tag, payload, RenderFrame::WIRE_LEN)?;
                Self::RenderData(RenderFrame::read(&mut payload))
            }
            Tag::Appearance => {
                expect_len(tag, payload, Appearance::WIRE_LEN)?;
                Self::Appearance(Appearance::read(&mut payload))
            }
            Tag::Username => Self::Username(read_string(tag, payload)?),
            _ => return Err(ProtocolError::UnknownTag(packet.tag)),
        };
        Ok(msg)
    }

    pub fn to_packet(&self) -> Packet {
        let mut buf = BytesMut::new();
        match self {
            Self::JoinLevel { room_id } => buf.put_i32_le(room_id.0),
            Self::LeaveLevel => {}
            Self::RenderData(frame) => frame.write(&mut buf),
            Self::Appearance(appearance) => appearance.write(&mut buf),
            Self::Username(name) => put_string(&mut buf, name),
        }
        Packet::new(self.tag().as_u8(), buf.freeze())
    }

    /// Encodes as one complete frame.
    pub fn encode(&self) -> Bytes {
        codec::encode(&self.to_packet())
    }
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// A message the server sends to a client.
///
/// Everything except [`Welcome`](Self::Welcome) is about some *other*
/// player, identified by `player_id`.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Your own id, sent once on connect.
    Welcome { player_id: PlayerId },
    /// A player entered your room.
    PlayerJoined { player_id: PlayerId },
    /// A player left your room (or disconnected).
    PlayerLeft { player_id: PlayerId },
    RenderDataRelay {
        player_id: PlayerId,
        frame: RenderFrame,
    },
    AppearanceRelay {
        player_id: PlayerId,
        appearance: Appearance,
    },
    UsernameRelay {
        player_id: PlayerId,
        username: String,
    },
}

impl ServerMessage {
    pub fn tag(&self) -> Tag {
        match self {
            Self::Welcome { .. } => Tag::Welcome,
            Self::PlayerJoined { .. } => Tag::PlayerJoined,
            Self::PlayerLeft { .. } => Tag::PlayerLeft,
            Self::RenderDataRelay { .. } => Tag::RenderDataRelay,
            Self::AppearanceRelay { .. } => Tag::AppearanceRelay,
            Self::UsernameRelay { .. } => Tag::UsernameRelay,
        }
    }

    /// The player this message is about.
    pub fn player_id(&self) -> PlayerId {
        match self {
            Self::Welcome { player_id }
            | Self::PlayerJoined { player_id }
            | Self::PlayerLeft { player_id }
            | Self::RenderDataRelay { player_id, .. }
            | Self::AppearanceRelay { player_id, .. }
            | Self::UsernameRelay { player_id, .. } => *player_id,
        }
    }

    /// Pose relays go out unreliably; a newer one is always on its way.
    pub fn channel(&self) -> Channel {
        match self {
            Self::RenderDataRelay { .. } => Channel::Unreliable,
            _ => Channel::Reliable,
        }
    }

    /// Decodes one framed server message.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        Self::from_packet(&codec::decode(data)?)
    }

    pub fn from_packet(packet: &Packet) -> Result<Self, ProtocolError> {
        let tag = match Tag::from_u8(packet.tag) {
            Some(
                tag @ (Tag::Welcome
                | Tag::PlayerJoined
                | Tag::PlayerLeft
                | Tag::RenderDataRelay
                | Tag::AppearanceRelay
                | Tag::UsernameRelay),
            ) => tag,
            _ => return Err(ProtocolError::UnknownTag(packet.tag)),
        };
        let mut payload = packet.payload.as_ref();

        let msg = match tag {
            Tag::Welcome => {
                expect_len(tag, payload, 4)?;
                Self::Welcome {
                    player_id: PlayerId(payload.get_u32_le()),
                }
            }
            Tag::PlayerJoined => {
                expect_len(tag, payload, 4)?;
                Self::PlayerJoined {
                    player_id: PlayerId(payload.get_u32_le()),
                }
            }
            Tag::PlayerLeft => {
                expect_len(tag, payload, 4)?;
                Self::PlayerLeft {
                    player_id: PlayerId(payload.get_u32_le()),
                }
            }
            Tag::RenderDataRelay => {
                expect_len(tag, payload, 4 + RenderFrame::WIRE_LEN)?;
                Self::RenderDataRelay {
                    player_id: PlayerId(payload.get_u32_le()),
                    frame: RenderFrame::read(&mut payload),
                }
            }
            Tag::AppearanceRelay => {
                expect_len(tag, payload, 4 + Appearance::WIRE_LEN)?;
                Self::AppearanceRelay {
                    player_id: PlayerId(payload.get_u32_le()),
                    appearance: Appearance::read(&mut payload),
                }
            }
            Tag::UsernameRelay => {
                if payload.len() < 4 {
                    return Err(ProtocolError::LengthMismatch {
                        tag,
                        expected: 4 + 2,
                        actual: payload.len(),
                    });
                }
                let player_id = PlayerId(payload.get_u32_le());
                Self::UsernameRelay {
                    player_id,
                    username: read_string(tag, payload)?,
                }
            }
            _ => return Err(ProtocolError::UnknownTag(packet.tag)),
        };
        Ok(msg)
    }

    pub fn to_packet(&self) -> Packet {
        let mut buf = BytesMut::new();
        buf.put_u32_le(self.player_id().0);
        match self {
            Self::Welcome { .. } | Self::PlayerJoined { .. } | Self::PlayerLeft { .. } => {}
            Self::RenderDataRelay { frame, .. } => frame.write(&mut buf),
            Self::AppearanceRelay { appearance, .. } => appearance.write(&mut buf),
            Self::UsernameRelay { username, .. } => put_string(&mut buf, username),
        }
        Packet::new(self.tag().as_u8(), buf.freeze())
    }

    /// Encodes as one complete frame.
    pub fn encode(&self) -> Bytes {
        codec::encode(&self.to_packet())
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn expect_len(tag: Tag, payload: &[u8], expected: usize) -> Result<(), ProtocolError> {
    if payload.len() != expected {
        return Err(ProtocolError::LengthMismatch {
            tag,
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

/// Reads a `u16`-length-prefixed UTF-8 string that must fill `payload`.
fn read_string(tag: Tag, mut payload: &[u8]) -> Result<String, ProtocolError> {
    if payload.len() < 2 {
        return Err(ProtocolError::LengthMismatch {
            tag,
            expected: 2,
            actual: payload.len(),
        });
    }
    let declared = payload.get_u16_le() as usize;
    if payload.len() != declared {
        return Err(ProtocolError::LengthMismatch {
            tag,
            expected: 2 + declared,
            actual: 2 + payload.len(),
        });
    }
    let text = std::str::from_utf8(payload).map_err(ProtocolError::InvalidUtf8)?;
    Ok(text.to_owned())
}

/// Writes `text` with a `u16` length prefix, cutting at a char boundary
/// if it would not fit.
fn put_string(buf: &mut BytesMut, text: &str) {
    let mut end = text.len().min(u16::MAX as usize);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    buf.put_u16_le(end as u16);
    buf.put_slice(&text.as_bytes()[..end]);
}
