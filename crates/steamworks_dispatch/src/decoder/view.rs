//! # Raw Payload View
//!
//! Read-only window over a payload the native side owns.
//!
//! ## Safety Note
//!
//! This module builds slices from addresses found in record headers.
//! The view never copies, never writes, and carries the lifetime of the
//! borrow it was created under; in the dispatch loop that borrow ends at
//! the record's release.

#![allow(unsafe_code)]

use std::ptr::NonNull;

use super::header::RecordHeader;
use crate::error::{DecodeError, DecodeResult};

/// Non-owning, bounded view of a record payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawPayloadView<'rec> {
    bytes: &'rec [u8],
}

impl<'rec> RawPayloadView<'rec> {
    /// A zero-length view.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self { bytes: &[] }
    }

    /// A view over bytes the caller already borrows.
    #[inline]
    #[must_use]
    pub const fn from_slice(bytes: &'rec [u8]) -> Self {
        Self { bytes }
    }

    /// A view over `len` bytes at `address`.
    ///
    /// # Safety
    ///
    /// `address` must point to `len` readable bytes that stay valid and are
    /// not written for all of `'rec`.
    #[inline]
    #[must_use]
    pub unsafe fn from_raw_parts(address: NonNull<u8>, len: usize) -> Self {
        // SAFETY: upheld by the caller.
        let bytes = unsafe { std::slice::from_raw_parts(address.as_ptr(), len) };
        Self { bytes }
    }

    /// The payload a decoded header points at.
    ///
    /// A zero length yields an empty view without looking at the address.
    ///
    /// # Errors
    ///
    /// Negative lengths, null addresses with a non-zero length and addresses
    /// wider than this platform's pointers.
    ///
    /// # Safety
    ///
    /// The header must come from a record that is fetched and not yet
    /// released for all of `'rec`.
    pub unsafe fn for_record(header: &RecordHeader) -> DecodeResult<Self> {
        let len = header.payload_size()?;
        if len == 0 {
            return Ok(Self::empty());
        }

        // Only reachable where usize is narrower than 64 bits.
        let address = usize::try_from(header.payload_address).map_err(|_| {
            DecodeError::AddressOverflow {
                kind: header.kind,
                address: header.payload_address,
            }
        })?;
        let Some(base) = NonNull::new(address as *mut u8) else {
            return Err(DecodeError::NullPayload {
                kind: header.kind,
                len,
            });
        };

        // SAFETY: the caller guarantees the record is live; the bridge
        // contract guarantees (address, len) is readable while it is.
        Ok(unsafe { Self::from_raw_parts(base, len) })
    }

    /// Length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-length payload.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The viewed bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &'rec [u8] {
        self.bytes
    }
}
