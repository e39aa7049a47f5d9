//! # Steamworks Bridge
//!
//! The native side of manual callback dispatch.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐  RecordBuf   ┌─────────────────┐
//! │  Steam client   │ ──────────▶  │  NativeBridge   │ ──▶ steamworks_dispatch
//! │  (callback Q)   │ ◀──────────  │  (this crate)   │
//! └─────────────────┘   release    └─────────────────┘
//! ```
//!
//! A bridge fetches one record header at a time into caller-owned memory and
//! frees the native record when told to. The payload stays in native memory;
//! consumers borrow it between fetch and release.
//!
//! ## Features
//!
//! - `steam-api`: [`SteamApi`], the adapter over the SDK's flat C entry points.
//! - `simulation`: [`SimulatedBridge`], a scripted producer for tests.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod native;
pub mod types;
pub mod wire;

#[cfg(feature = "steam-api")]
pub mod ffi;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use error::{BridgeError, BridgeResult};
pub use native::NativeBridge;
pub use types::{EResult, EventKind, PipeHandle, SteamId, UserHandle};
pub use wire::{ByteOrder, PointerWidth, RawRecord, RecordBuf, WireLayout, RECORD_BUF_LEN};

#[cfg(feature = "steam-api")]
pub use ffi::SteamApi;

#[cfg(feature = "simulation")]
pub use simulation::{BridgeProbe, ProbeLog, SimulatedBridge, SimulatedItem, SimulatedRecord};
