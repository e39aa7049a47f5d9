//! # Record Wire Layout
//!
//! Fixed binary layout of a queued record header:
//!
//! ```text
//! ┌──────────────┬──────────────┬──────────────────────┬──────────────┐
//! │ user (4)     │ kind (4)     │ payload addr (4 | 8) │ payload len  │
//! │ i32          │ i32          │ pointer-width uint   │ (4) i32      │
//! └──────────────┴──────────────┴──────────────────────┴──────────────┘
//! ```
//!
//! Byte order and pointer width differ between platform builds of the SDK,
//! so both are carried in a [`WireLayout`] resolved once at initialization.
//! One layout governs a whole record: header and payload.

use std::fmt;

use serde::Deserialize;

/// Size of the header block handed to [`NativeBridge::next_record`](crate::NativeBridge::next_record).
///
/// Room for the widest header (8-byte addresses).
pub const RECORD_BUF_LEN: usize = 20;

/// Byte order of every multi-byte field in a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl ByteOrder {
    /// Byte order of the compilation target.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// Reads a `u32`.
    #[inline]
    #[must_use]
    pub const fn u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        }
    }

    /// Reads an `i32`.
    #[inline]
    #[must_use]
    pub const fn i32(self, bytes: [u8; 4]) -> i32 {
        match self {
            Self::Little => i32::from_le_bytes(bytes),
            Self::Big => i32::from_be_bytes(bytes),
        }
    }

    /// Reads a `u64`.
    #[inline]
    #[must_use]
    pub const fn u64(self, bytes: [u8; 8]) -> u64 {
        match self {
            Self::Little => u64::from_le_bytes(bytes),
            Self::Big => u64::from_be_bytes(bytes),
        }
    }

    /// Writes an `i32`.
    #[inline]
    #[must_use]
    pub const fn i32_bytes(self, value: i32) -> [u8; 4] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }

    /// Writes a `u32`.
    #[inline]
    #[must_use]
    pub const fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }

    /// Writes a `u64`.
    #[inline]
    #[must_use]
    pub const fn u64_bytes(self, value: u64) -> [u8; 8] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }
}

/// Width of the payload address field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u8")]
pub enum PointerWidth {
    /// 32-bit addresses.
    Four,
    /// 64-bit addresses.
    Eight,
}

impl PointerWidth {
    /// Pointer width of the compilation target.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(target_pointer_width = "32") {
            Self::Four
        } else {
            Self::Eight
        }
    }

    /// Width in bytes.
    #[inline]
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Four => 4,
            Self::Eight => 8,
        }
    }
}

impl TryFrom<u8> for PointerWidth {
    type Error = String;

    fn try_from(width: u8) -> Result<Self, Self::Error> {
        match width {
            4 => Ok(Self::Four),
            8 => Ok(Self::Eight),
            other => Err(format!("pointer width must be 4 or 8, got {other}")),
        }
    }
}

/// Byte order and pointer width of a record stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct WireLayout {
    /// Byte order of header and payload fields.
    pub byte_order: ByteOrder,
    /// Width of the payload address in the header.
    pub pointer_width: PointerWidth,
}

impl WireLayout {
    /// Offset of the owning user handle.
    pub const USER_OFFSET: usize = 0;
    /// Offset of the event kind.
    pub const KIND_OFFSET: usize = 4;
    /// Offset of the payload address.
    pub const ADDRESS_OFFSET: usize = 8;

    /// Layout of the compilation target.
    #[must_use]
    pub const fn host() -> Self {
        Self {
            byte_order: ByteOrder::host(),
            pointer_width: PointerWidth::host(),
        }
    }

    /// Creates a layout.
    #[must_use]
    pub const fn new(byte_order: ByteOrder, pointer_width: PointerWidth) -> Self {
        Self {
            byte_order,
            pointer_width,
        }
    }

    /// Offset of the payload length.
    #[inline]
    #[must_use]
    pub const fn len_offset(self) -> usize {
        Self::ADDRESS_OFFSET + self.pointer_width.bytes()
    }

    /// Total header size in bytes (16 or 20).
    #[inline]
    #[must_use]
    pub const fn header_len(self) -> usize {
        self.len_offset() + 4
    }
}

impl Default for WireLayout {
    fn default() -> Self {
        Self::host()
    }
}

impl fmt::Display for WireLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = match self.byte_order {
            ByteOrder::Little => "little-endian",
            ByteOrder::Big => "big-endian",
        };
        write!(f, "{order}/{}-byte pointers", self.pointer_width.bytes())
    }
}

/// Caller-owned memory a bridge writes one header into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordBuf(pub [u8; RECORD_BUF_LEN]);

impl RecordBuf {
    /// All-zero buffer.
    #[must_use]
    pub const fn zeroed() -> Self {
        Self([0u8; RECORD_BUF_LEN])
    }

    /// Raw bytes.
    #[inline]
    #[must_use]
    pub const fn bytes(&self) -> &[u8; RECORD_BUF_LEN] {
        &self.0
    }
}

impl Default for RecordBuf {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Header fields before they are packed into a [`RecordBuf`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawRecord {
    /// Owning user handle.
    pub user: i32,
    /// Event kind identifier.
    pub kind: i32,
    /// Payload base address (externally owned).
    pub address: u64,
    /// Payload length in bytes.
    pub len: i32,
}

/// Packs `record` into `buf` under `layout`.
///
/// With 4-byte pointers only the low 32 bits of the address are written.
/// Bytes past the header are zeroed.
pub fn encode_header(layout: WireLayout, record: &RawRecord, buf: &mut RecordBuf) {
    let order = layout.byte_order;
    let out = &mut buf.0;
    out.fill(0);

    out[WireLayout::USER_OFFSET..WireLayout::USER_OFFSET + 4]
        .copy_from_slice(&order.i32_bytes(record.user));
    out[WireLayout::KIND_OFFSET..WireLayout::KIND_OFFSET + 4]
        .copy_from_slice(&order.i32_bytes(record.kind));

    match layout.pointer_width {
        PointerWidth::Four => {
            #[allow(clippy::cast_possible_truncation)]
            let low = record.address as u32;
            out[WireLayout::ADDRESS_OFFSET..WireLayout::ADDRESS_OFFSET + 4]
                .copy_from_slice(&order.u32_bytes(low));
        }
        PointerWidth::Eight => {
            out[WireLayout::ADDRESS_OFFSET..WireLayout::ADDRESS_OFFSET + 8]
                .copy_from_slice(&order.u64_bytes(record.address));
        }
    }

    let len_at = layout.len_offset();
    out[len_at..len_at + 4].copy_from_slice(&order.i32_bytes(record.len));
}
