//! # Record Header Decoding

use steamworks_bridge::{EventKind, PointerWidth, RecordBuf, UserHandle, WireLayout};

use crate::error::{DecodeError, DecodeResult};

/// A decoded record header. Lives for one drain iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordHeader {
    /// User that owns the record.
    pub user: UserHandle,
    /// Event kind identifier.
    pub kind: EventKind,
    /// Payload base address (native memory).
    pub payload_address: u64,
    /// Payload length as carried on the wire.
    pub payload_len: i32,
}

impl RecordHeader {
    /// Payload length, rejecting negative values.
    ///
    /// # Errors
    ///
    /// [`DecodeError::NegativeLength`] if the wire value is below zero.
    pub fn payload_size(&self) -> DecodeResult<usize> {
        usize::try_from(self.payload_len).map_err(|_| DecodeError::NegativeLength {
            kind: self.kind,
            len: self.payload_len,
        })
    }
}

/// Decodes the header at the start of `raw`.
///
/// Reads `layout.header_len()` bytes; anything after is ignored.
#[must_use]
pub fn decode_header(raw: &RecordBuf, layout: WireLayout) -> RecordHeader {
    let b = raw.bytes();
    let order = layout.byte_order;

    let user = order.i32([b[0], b[1], b[2], b[3]]);
    let kind = order.i32([b[4], b[5], b[6], b[7]]);

    let payload_address = match layout.pointer_width {
        PointerWidth::Four => u64::from(order.u32([b[8], b[9], b[10], b[11]])),
        PointerWidth::Eight => {
            order.u64([b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]])
        }
    };

    let at = layout.len_offset();
    let payload_len = order.i32([b[at], b[at + 1], b[at + 2], b[at + 3]]);

    RecordHeader {
        user: UserHandle(user),
        kind: EventKind(kind),
        payload_address,
        payload_len,
    }
}
