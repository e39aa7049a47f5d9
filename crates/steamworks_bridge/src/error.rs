//! # Bridge Error Types
//!
//! Failures reported by the native side of the dispatch loop.

use thiserror::Error;

/// Errors raised by a [`NativeBridge`](crate::NativeBridge) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The SDK has not been initialized by the application.
    #[error("steam api is not initialized")]
    NotInitialized,

    /// Manual dispatch was already set up on this bridge.
    #[error("manual dispatch already initialized")]
    AlreadyInitialized,

    /// There is no active pipe to the Steam client.
    #[error("no active steam pipe")]
    NoSession,

    /// One step of the native loop failed.
    #[error("native frame failed: {0}")]
    FrameFailed(String),

    /// The native callback queue is in a bad state.
    #[error("callback queue corrupted: {0}")]
    QueueCorrupted(String),
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
