//! # Native Bridge Interface
//!
//! The five manual-dispatch operations the dispatch loop needs from the SDK.
//! The trait is `unsafe` to implement: implementors vouch for payload memory.

#![allow(unsafe_code)]

use crate::error::BridgeResult;
use crate::types::PipeHandle;
use crate::wire::{RecordBuf, WireLayout};

/// Manual-dispatch entry points of the native SDK.
///
/// A bridge is a single-consumer queue: only one caller may drain a pipe at
/// a time, and it must not be mixed with any automatic dispatch mechanism
/// on the same pipe.
///
/// # Safety
///
/// When [`next_record`](Self::next_record) returns `Ok(true)`, the header it
/// wrote describes a payload (address, length) of readable bytes. Those
/// bytes must stay valid and unmodified until the next call to
/// [`free_last_record`](Self::free_last_record) on this bridge. Consumers
/// build borrowed slices over that memory without copying.
pub unsafe trait NativeBridge {
    /// Prepares manual dispatch.
    ///
    /// # Errors
    ///
    /// [`BridgeError::NotInitialized`](crate::BridgeError::NotInitialized) if the SDK is not initialized,
    /// [`BridgeError::AlreadyInitialized`](crate::BridgeError::AlreadyInitialized) on a second call.
    fn init_manual_dispatch(&mut self) -> BridgeResult<()>;

    /// Returns the active pipe.
    ///
    /// # Errors
    ///
    /// [`BridgeError::NotInitialized`](crate::BridgeError::NotInitialized) before manual dispatch is set up,
    /// [`BridgeError::NoSession`](crate::BridgeError::NoSession) if no session exists.
    fn session_handle(&self) -> BridgeResult<PipeHandle>;

    /// Drives one iteration of the native loop. May enqueue records.
    ///
    /// # Errors
    ///
    /// [`BridgeError::FrameFailed`](crate::BridgeError::FrameFailed) if the native step fails. Nothing is
    /// enqueued in that case.
    fn run_frame(&mut self, pipe: PipeHandle) -> BridgeResult<()>;

    /// Writes the next queued header into `header`.
    ///
    /// Returns `Ok(false)` when the queue is empty.
    ///
    /// # Errors
    ///
    /// [`BridgeError::QueueCorrupted`](crate::BridgeError::QueueCorrupted) if the native queue is in a bad
    /// state. No record is held after an error.
    fn next_record(&mut self, pipe: PipeHandle, header: &mut RecordBuf) -> BridgeResult<bool>;

    /// Frees the most recently fetched record.
    ///
    /// Called exactly once per `Ok(true)` from [`next_record`](Self::next_record).
    fn free_last_record(&mut self, pipe: PipeHandle);

    /// Layout this bridge writes headers and payloads in.
    fn wire_layout(&self) -> WireLayout {
        WireLayout::host()
    }
}
