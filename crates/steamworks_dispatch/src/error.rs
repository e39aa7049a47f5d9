//! # Dispatch Error Types
//!
//! Every error names the operation it came from, so callers can tell a
//! missing pipe from a corrupt queue without inspecting the bridge.

use steamworks_bridge::{BridgeError, EventKind, WireLayout};
use thiserror::Error;

/// A record that could not be turned into callback arguments.
///
/// The record is still released before this error is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload is shorter than the kind's field total.
    #[error("{name} (callback {kind}): payload too short, expected {expected} bytes, got {actual}")]
    PayloadTooShort {
        /// Event kind being decoded.
        kind: EventKind,
        /// Name of the event kind.
        name: &'static str,
        /// Bytes the layout needs.
        expected: usize,
        /// Bytes the record carried.
        actual: usize,
    },

    /// Header carried a negative payload length.
    #[error("callback {kind}: negative payload length {len}")]
    NegativeLength {
        /// Event kind of the record.
        kind: EventKind,
        /// Length as found in the header.
        len: i32,
    },

    /// Header carried a null payload address with a non-zero length.
    #[error("callback {kind}: null payload with length {len}")]
    NullPayload {
        /// Event kind of the record.
        kind: EventKind,
        /// Declared length.
        len: usize,
    },

    /// Payload address does not fit this platform's pointers.
    #[error("callback {kind}: payload address {address:#x} out of range")]
    AddressOverflow {
        /// Event kind of the record.
        kind: EventKind,
        /// Address as found in the header.
        address: u64,
    },
}

/// Errors returned by [`Dispatch`](crate::Dispatch).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Manual dispatch could not be set up.
    #[error("ManualDispatch_Init: {0}")]
    Init(#[source] BridgeError),

    /// Configured layout disagrees with what the bridge writes.
    #[error("wire layout mismatch: configured {configured}, bridge writes {native}")]
    LayoutMismatch {
        /// Layout from the dispatch config.
        configured: WireLayout,
        /// Layout the bridge declares.
        native: WireLayout,
    },

    /// No pipe to address the queue. Nothing was touched.
    #[error("SteamPipe: {0}")]
    SessionUnavailable(#[source] BridgeError),

    /// The native frame step failed. The queue was not drained.
    #[error("Steam RunFrame: {0}")]
    FrameAdvance(#[source] BridgeError),

    /// Fetching a record failed mid-drain. Nothing was acquired.
    #[error("GetNextCallback after {drained} records: {source}")]
    Fetch {
        /// Records fully handled earlier in this call.
        drained: usize,
        /// Bridge failure.
        #[source]
        source: BridgeError,
    },

    /// A fetched record could not be decoded. It was released.
    #[error("decode after {drained} records: {source}")]
    Decode {
        /// Records fully handled earlier in this call.
        drained: usize,
        /// Decode failure.
        #[source]
        source: DecodeError,
    },
}

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid.
    #[error("invalid dispatch config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
