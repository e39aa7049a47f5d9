//! # Payload Decoding
//!
//! Each supported event kind has an entry in a static table: its name, the
//! packed size of its fields and a function that reads them in order.
//! Kinds missing from the table are not errors; they decode to `None`.

use std::fmt;

use steamworks_bridge::{ByteOrder, EResult, EventKind, SteamId};

use super::view::RawPayloadView;
use crate::error::{DecodeError, DecodeResult};

/// Arguments of a stats-received notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserStatsReceived {
    /// Game the stats belong to.
    pub game_id: u64,
    /// Outcome of the request.
    pub result: EResult,
    /// User whose stats were received.
    pub user: SteamId,
}

/// A payload decoded into typed fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodedEvent {
    /// `UserStatsReceived_t`.
    UserStatsReceived(UserStatsReceived),
}

impl DecodedEvent {
    /// Kind this event was decoded from.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::UserStatsReceived(_) => EventKind::USER_STATS_RECEIVED,
        }
    }
}

/// Sequential reader over packed fixed-width fields.
#[derive(Debug)]
pub struct FieldReader<'v> {
    bytes: &'v [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'v> FieldReader<'v> {
    /// Reader positioned at the start of `view`.
    #[must_use]
    pub const fn new(view: &RawPayloadView<'v>, order: ByteOrder) -> Self {
        Self {
            bytes: view.as_bytes(),
            pos: 0,
            order,
        }
    }

    /// Bytes consumed so far.
    #[inline]
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.pos
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let chunk: [u8; N] = self.bytes.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(chunk)
    }

    /// Next 4-byte signed field.
    pub fn read_i32(&mut self) -> Option<i32> {
        self.take::<4>().map(|b| self.order.i32(b))
    }

    /// Next 8-byte unsigned field.
    pub fn read_u64(&mut self) -> Option<u64> {
        self.take::<8>().map(|b| self.order.u64(b))
    }
}

/// Decode table entry.
pub struct PayloadLayout {
    /// Kind this entry decodes.
    pub kind: EventKind,
    /// Human-readable kind name used in errors.
    pub name: &'static str,
    /// Packed size of all fields.
    pub size: usize,
    decode: fn(&mut FieldReader<'_>) -> Option<DecodedEvent>,
}

impl fmt::Debug for PayloadLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadLayout")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl PayloadLayout {
    /// Decodes `view` with this layout.
    ///
    /// Bytes past `size` are ignored.
    ///
    /// # Errors
    ///
    /// [`DecodeError::PayloadTooShort`] if `view` is shorter than `size`.
    pub fn decode(&self, view: &RawPayloadView<'_>, order: ByteOrder) -> DecodeResult<DecodedEvent> {
        let too_short = || DecodeError::PayloadTooShort {
            kind: self.kind,
            name: self.name,
            expected: self.size,
            actual: view.len(),
        };
        if view.len() < self.size {
            return Err(too_short());
        }

        let mut reader = FieldReader::new(view, order);
        let event = (self.decode)(&mut reader).ok_or_else(too_short)?;
        debug_assert_eq!(reader.consumed(), self.size);
        Ok(event)
    }
}

fn decode_user_stats_received(reader: &mut FieldReader<'_>) -> Option<DecodedEvent> {
    let game_id = reader.read_u64()?;
    let result = EResult(reader.read_i32()?);
    let user = SteamId::from_raw(reader.read_u64()?);
    Some(DecodedEvent::UserStatsReceived(UserStatsReceived {
        game_id,
        result,
        user,
    }))
}

static PAYLOAD_LAYOUTS: [PayloadLayout; 1] = [PayloadLayout {
    kind: EventKind::USER_STATS_RECEIVED,
    name: "UserStatsReceived",
    size: 8 + 4 + 8,
    decode: decode_user_stats_received,
}];

/// Table entry for `kind`, if the kind is supported.
#[must_use]
pub fn payload_layout(kind: EventKind) -> Option<&'static PayloadLayout> {
    PAYLOAD_LAYOUTS.iter().find(|layout| layout.kind == kind)
}

/// Decodes a payload by kind.
///
/// Returns `Ok(None)` for kinds with no table entry; nothing is read.
///
/// # Errors
///
/// [`DecodeError::PayloadTooShort`] naming the kind if `view` is shorter
/// than the kind's fields.
pub fn decode_payload(
    kind: EventKind,
    view: &RawPayloadView<'_>,
    order: ByteOrder,
) -> DecodeResult<Option<DecodedEvent>> {
    match payload_layout(kind) {
        Some(layout) => layout.decode(view, order).map(Some),
        None => Ok(None),
    }
}
