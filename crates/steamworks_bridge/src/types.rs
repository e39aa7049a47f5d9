//! # Steam Handle and Id Types
//!
//! Thin newtypes over the integers the SDK hands out. None of them are
//! validated: the native side is authoritative for their values.

use std::fmt;

/// Handle of the pipe to the Steam client. Addresses the callback queue.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipeHandle(pub i32);

impl PipeHandle {
    /// Returns true if this is the SDK's "no pipe" value.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Handle of the user that owns a queued record.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserHandle(pub i32);

/// Numeric callback identifier carried in every record header.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKind(pub i32);

impl EventKind {
    /// Base of the user-stats callback range.
    pub const USER_STATS_BASE: i32 = 1100;

    /// Stats and achievements for a user were received.
    pub const USER_STATS_RECEIVED: Self = Self(Self::USER_STATS_BASE + 1);
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result code reported by the SDK.
///
/// The native enumeration is open-ended; unknown values pass through.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EResult(pub i32);

impl EResult {
    /// No result.
    pub const NONE: Self = Self(0);
    /// Success.
    pub const OK: Self = Self(1);
    /// Generic failure.
    pub const FAIL: Self = Self(2);

    /// Returns true for [`EResult::OK`].
    #[inline]
    #[must_use]
    pub const fn is_ok(self) -> bool {
        self.0 == Self::OK.0
    }

    /// Name of a recognized code.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("None"),
            1 => Some("OK"),
            2 => Some("Fail"),
            _ => None,
        }
    }
}

impl From<i32> for EResult {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for EResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "EResult({})", self.0),
        }
    }
}

/// 64-bit Steam user id.
///
/// Bit layout (low to high): account id (32), instance (20),
/// account type (4), universe (8).
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SteamId(pub u64);

impl SteamId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw 64-bit value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Account id (low 32 bits).
    #[inline]
    #[must_use]
    pub const fn account_id(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }

    /// Account instance.
    #[inline]
    #[must_use]
    pub const fn account_instance(self) -> u32 {
        ((self.0 >> 32) & 0xF_FFFF) as u32
    }

    /// Account type.
    #[inline]
    #[must_use]
    pub const fn account_type(self) -> u8 {
        ((self.0 >> 52) & 0xF) as u8
    }

    /// Universe.
    #[inline]
    #[must_use]
    pub const fn universe(self) -> u8 {
        (self.0 >> 56) as u8
    }
}

impl fmt::Display for SteamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
