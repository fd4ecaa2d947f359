//! Type-length-payload framing.
//!
//! ```text
//! ┌────────┬──────────────────┬─────────────────────┐
//! │ tag u8 │ length u32 (LE)  │ payload [length]    │
//! └────────┴──────────────────┴─────────────────────┘
//! ```
//!
//! One frame per transport message. The codec only checks that the
//! declared length matches the buffer; what the payload means is the
//! message layer's job.

use bytes::{BufMut, Bytes, BytesMut};

use crate::FrameError;

/// Size of the fixed header: one tag byte plus a `u32` length.
pub const HEADER_LEN: usize = 1 + 4;

/// A raw frame: a tag byte and an uninterpreted payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub tag: u8,
    pub payload: Bytes,
}

impl Packet {
    pub fn new(tag: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            tag,
            payload: payload.into(),
        }
    }

    /// Payload length as written in the header.
    pub fn length(&self) -> u32 {
        self.payload.len() as u32
    }
}

/// Splits one complete frame out of `data`.
///
/// # Errors
/// - [`FrameError::Empty`] if `data` is shorter than [`HEADER_LEN`]
/// - [`FrameError::Truncated`] if the payload is shorter than declared
/// - [`FrameError::TrailingBytes`] if there is anything after the payload
pub fn decode(data: &[u8]) -> Result<Packet, FrameError> {
    if data.len() < HEADER_LEN {
        return Err(FrameError::Empty);
    }

    let tag = data[0];
    let declared = u32::from_le_bytes([data[1], data[2], data[3], data[4]]) as usize;
    let available = data.len() - HEADER_LEN;

    if available < declared {
        return Err(FrameError::Truncated {
            declared,
            available,
        });
    }
    if available > declared {
        return Err(FrameError::TrailingBytes {
            extra: available - declared,
        });
    }

    Ok(Packet {
        tag,
        payload: Bytes::copy_from_slice(&data[HEADER_LEN..]),
    })
}

/// Writes `packet` as one frame.
pub fn encode(packet: &Packet) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + packet.payload.len());
    buf.put_u8(packet.tag);
    buf.put_u32_le(packet.length());
    buf.put_slice(&packet.payload);
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_writes_header_then_payload() {
        let packet = Packet::new(0x03, vec![0xAA, 0xBB]);

        let bytes = encode(&packet);

        assert_eq!(bytes.as_ref(), &[0x03, 2, 0, 0, 0, 0xAA, 0xBB]);
    }

    #[test]
    fn test_decode_empty_payload_frame() {
        let packet = decode(&[0x02, 0, 0, 0, 0]).expect("header-only frame is valid");

        assert_eq!(packet.tag, 0x02);
        assert_eq!(packet.length(), 0);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let packet = Packet::new(0x85, vec![1, 2, 3, 4, 5]);
        assert_eq!(decode(&encode(&packet)), Ok(packet));
    }

    #[test]
    fn test_decode_short_header_returns_empty() {
        assert_eq!(decode(&[]), Err(FrameError::Empty));
        assert_eq!(decode(&[0x01, 4, 0, 0]), Err(FrameError::Empty));
    }

    #[test]
    fn test_decode_short_payload_returns_truncated() {
        let result = decode(&[0x01, 4, 0, 0, 0, 9, 9]);

        assert_eq!(
            result,
            Err(FrameError::Truncated {
                declared: 4,
                available: 2
            })
        );
    }

    #[test]
    fn test_decode_huge_declared_length_is_truncated_not_panic() {
        let result = decode(&[0x01, 0xFF, 0xFF, 0xFF, 0xFF]);

        assert!(matches!(result, Err(FrameError::Truncated { available: 0, .. })));
    }

    #[test]
    fn test_decode_extra_bytes_returns_trailing() {
        let result = decode(&[0x02, 0, 0, 0, 0, 7]);

        assert_eq!(result, Err(FrameError::TrailingBytes { extra: 1 }));
    }
}
