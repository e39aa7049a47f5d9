//! # Steamworks Dispatch
//!
//! Manual callback dispatch: the application drains the Steam client's
//! callback queue on its own thread, once per frame.
//!
//! ## Data Flow
//!
//! ```text
//! ┌──────────────┐ next_record ┌──────────────┐ header ┌──────────────┐
//! │ NativeBridge │ ──────────▶ │   Dispatch   │ ─────▶ │   decoder    │
//! │              │ ◀────────── │  (one frame) │ ◀───── │ (zero copy)  │
//! └──────────────┘   release   └──────┬───────┘ event  └──────────────┘
//!                                     │
//!                                     ▼
//!                              ┌──────────────┐
//!                              │  Callbacks   │ ──▶ closures / channel
//!                              └──────────────┘
//! ```
//!
//! ## Threading
//!
//! [`Dispatch::process_callbacks`] must be driven by a single caller, and
//! the same pipe must not be drained by any other dispatch mechanism.
//! Callbacks run synchronously on the calling thread. Use
//! [`Callbacks::forwarding`] to hand events to other threads.
//!
//! ## Guarantees
//!
//! - Payloads are read in place; nothing is copied out of native memory
//!   except the decoded scalar fields.
//! - Every fetched record is released exactly once, whatever the outcome.
//! - Records of unknown kinds are released without being read.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod callbacks;
pub mod config;
pub mod decoder;
pub mod dispatch;
pub mod error;
pub mod stats;

pub use callbacks::{Callbacks, UserStatsReceivedFn};
pub use config::DispatchConfig;
pub use decoder::{
    decode_header, decode_payload, payload_layout, DecodedEvent, FieldReader, PayloadLayout,
    RawPayloadView, RecordHeader, UserStatsReceived,
};
pub use dispatch::Dispatch;
pub use error::{ConfigError, DecodeError, DecodeResult, DispatchError, DispatchResult};
pub use stats::{DispatchStats, StatsSnapshot};

pub use steamworks_bridge::{
    ByteOrder, EResult, EventKind, NativeBridge, PointerWidth, SteamId, UserHandle, WireLayout,
};

/// Dispatch over the linked Steamworks SDK.
#[cfg(feature = "steam-api")]
pub type SteamDispatch = Dispatch<steamworks_bridge::SteamApi>;
