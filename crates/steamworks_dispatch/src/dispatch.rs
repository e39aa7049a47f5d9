//! # Dispatch Loop
//!
//! Drains the native queue once per frame and routes each record to its
//! callback slot.
//!
//! ```text
//! process_callbacks
//!   ├─ session_handle           fails → SessionUnavailable, nothing touched
//!   ├─ run_frame                fails → FrameAdvance, queue untouched
//!   └─ loop next_record
//!        ├─ Err                 → Fetch, nothing acquired
//!        ├─ Ok(false)           → done
//!        └─ Ok(true)  ── RecordGuard ──┐
//!              decode header          │
//!              view payload           │  released on drop:
//!              decode fields          │  success, error, or unwind
//!              invoke slot            │
//!                          ◀──────────┘
//! ```
//!
//! ## Safety Note
//!
//! Payload views are built from header addresses. Each view borrows the
//! [`RecordGuard`] of its record, so it cannot outlive the release.

#![allow(unsafe_code)]

use std::fmt;
use std::sync::Arc;

use steamworks_bridge::{NativeBridge, PipeHandle, RecordBuf, WireLayout};

use crate::callbacks::Callbacks;
use crate::config::DispatchConfig;
use crate::decoder::{decode_header, decode_payload, payload_layout, RawPayloadView, RecordHeader};
use crate::error::{DecodeResult, DispatchError, DispatchResult};
use crate::stats::{DispatchStats, StatsSnapshot};

/// Owns one fetched record and frees it when dropped.
struct RecordGuard<'b, B: NativeBridge> {
    bridge: &'b mut B,
    pipe: PipeHandle,
}

impl<B: NativeBridge> RecordGuard<'_, B> {
    /// View of this record's payload.
    fn payload(&self, header: &RecordHeader) -> DecodeResult<RawPayloadView<'_>> {
        // SAFETY: the record stays fetched until `self` drops, and the view
        // borrows `self`. `NativeBridge` guarantees the payload is readable
        // until then.
        unsafe { RawPayloadView::for_record(header) }
    }
}

impl<B: NativeBridge> Drop for RecordGuard<'_, B> {
    fn drop(&mut self) {
        self.bridge.free_last_record(self.pipe);
    }
}

enum Delivery {
    Invoked,
    Unhandled,
    UnknownKind,
}

/// The manual dispatch loop over a native bridge.
///
/// Not `Sync`: one thread drives a pipe. Do not mix with automatic callback
/// dispatch on the same pipe.
///
/// ## Usage
///
/// ```rust,ignore
/// let callbacks = Callbacks::new().on_user_stats_received(|game_id, result, user| {
///     tracing::info!(game_id, %result, %user, "stats ready");
/// });
/// let mut dispatch = Dispatch::new(SteamApi::new(), callbacks)?;
///
/// loop {
///     dispatch.process_callbacks()?;
///     // ... frame ...
/// }
/// ```
pub struct Dispatch<B: NativeBridge> {
    bridge: B,
    callbacks: Callbacks,
    layout: WireLayout,
    log_unknown_kinds: bool,
    stats: Arc<DispatchStats>,
}

impl<B: NativeBridge> fmt::Debug for Dispatch<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("callbacks", &self.callbacks)
            .field("layout", &self.layout)
            .field("log_unknown_kinds", &self.log_unknown_kinds)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

impl<B: NativeBridge> Dispatch<B> {
    /// Initializes manual dispatch with the default config.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Init`] if the bridge refuses manual dispatch.
    pub fn new(bridge: B, callbacks: Callbacks) -> DispatchResult<Self> {
        Self::with_config(bridge, callbacks, &DispatchConfig::default())
    }

    /// Initializes manual dispatch.
    ///
    /// # Errors
    ///
    /// [`DispatchError::LayoutMismatch`] if `config` pins a layout the
    /// bridge does not write, [`DispatchError::Init`] if the bridge refuses
    /// manual dispatch.
    pub fn with_config(
        mut bridge: B,
        callbacks: Callbacks,
        config: &DispatchConfig,
    ) -> DispatchResult<Self> {
        let layout = config.resolve_layout(bridge.wire_layout())?;
        bridge.init_manual_dispatch().map_err(DispatchError::Init)?;

        tracing::info!(%layout, header_len = layout.header_len(), "manual dispatch ready");

        Ok(Self {
            bridge,
            callbacks,
            layout,
            log_unknown_kinds: config.log_unknown_kinds,
            stats: Arc::new(DispatchStats::default()),
        })
    }

    /// Advances one native frame and drains every queued record.
    ///
    /// Every fetched record is released exactly once before this returns,
    /// including when decoding fails or a callback panics. Records queued
    /// after a failure stay queued for the next call.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::SessionUnavailable`]: no pipe; nothing touched.
    /// - [`DispatchError::FrameAdvance`]: frame step failed; queue untouched.
    /// - [`DispatchError::Fetch`]: fetch failed; earlier records delivered.
    /// - [`DispatchError::Decode`]: a record was malformed; it was released.
    pub fn process_callbacks(&mut self) -> DispatchResult<()> {
        let pipe = self
            .bridge
            .session_handle()
            .map_err(DispatchError::SessionUnavailable)?;
        self.bridge
            .run_frame(pipe)
            .map_err(DispatchError::FrameAdvance)?;
        DispatchStats::bump(&self.stats.frames);

        let mut buf = RecordBuf::zeroed();
        let mut drained = 0usize;

        loop {
            match self.bridge.next_record(pipe, &mut buf) {
                Ok(true) => {}
                Ok(false) => break,
                Err(source) => {
                    DispatchStats::bump(&self.stats.fetch_failures);
                    tracing::warn!(drained, error = %source, "fetching callback record failed");
                    return Err(DispatchError::Fetch { drained, source });
                }
            }

            let header = decode_header(&buf, self.layout);
            tracing::trace!(
                user = header.user.0,
                kind = %header.kind,
                len = header.payload_len,
                "callback record"
            );

            let guard = RecordGuard {
                bridge: &mut self.bridge,
                pipe,
            };
            let outcome = deliver(&guard, &header, self.layout, &mut self.callbacks);
            drop(guard);
            DispatchStats::bump(&self.stats.records_drained);

            match outcome {
                Ok(Delivery::Invoked) => DispatchStats::bump(&self.stats.callbacks_invoked),
                Ok(Delivery::Unhandled) => {
                    DispatchStats::bump(&self.stats.unhandled_kinds);
                    tracing::debug!(kind = %header.kind, "no callback registered");
                }
                Ok(Delivery::UnknownKind) => {
                    DispatchStats::bump(&self.stats.unknown_kinds);
                    if self.log_unknown_kinds {
                        tracing::debug!(kind = %header.kind, "unknown callback kind");
                    }
                }
                Err(source) => {
                    DispatchStats::bump(&self.stats.decode_failures);
                    tracing::warn!(drained, error = %source, "callback record could not be decoded");
                    return Err(DispatchError::Decode { drained, source });
                }
            }
            drained += 1;
        }

        Ok(())
    }

    /// The callback registry.
    pub fn callbacks_mut(&mut self) -> &mut Callbacks {
        &mut self.callbacks
    }

    /// Layout records are decoded with.
    #[must_use]
    pub const fn layout(&self) -> WireLayout {
        self.layout
    }

    /// Shared counters, readable from other threads.
    #[must_use]
    pub fn stats(&self) -> Arc<DispatchStats> {
        Arc::clone(&self.stats)
    }

    /// Current counter values.
    #[must_use]
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// The underlying bridge.
    #[must_use]
    pub const fn bridge(&self) -> &B {
        &self.bridge
    }
}

fn deliver<B: NativeBridge>(
    guard: &RecordGuard<'_, B>,
    header: &RecordHeader,
    layout: WireLayout,
    callbacks: &mut Callbacks,
) -> DecodeResult<Delivery> {
    if payload_layout(header.kind).is_none() {
        return Ok(Delivery::UnknownKind);
    }
    if !callbacks.handles(header.kind) {
        return Ok(Delivery::Unhandled);
    }

    let view = guard.payload(header)?;
    match decode_payload(header.kind, &view, layout.byte_order)? {
        Some(event) if callbacks.invoke(event) => Ok(Delivery::Invoked),
        Some(_) => Ok(Delivery::Unhandled),
        None => Ok(Delivery::UnknownKind),
    }
}
