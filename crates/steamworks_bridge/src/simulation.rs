//! # Simulated Bridge
//!
//! In-process stand-in for the Steam client's callback queue.
//!
//! Records are scripted per frame and become visible after the matching
//! [`run_frame`](NativeBridge::run_frame). Payload memory is owned by the
//! bridge and stays put until the record is released, exactly like the
//! native side. Every fetch and release is recorded in a [`BridgeProbe`]
//! that tests keep after handing the bridge to a consumer.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut bridge = SimulatedBridge::new();
//! let probe = bridge.probe();
//! bridge.push_frame([
//!     SimulatedRecord::user_stats_received(ByteOrder::host(), UserHandle(1), 1001, EResult::OK, SteamId(555)),
//! ]);
//!
//! // ... drain through the dispatch loop ...
//!
//! assert_eq!(probe.snapshot().outstanding(), 0);
//! ```

#![allow(unsafe_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{BridgeError, BridgeResult};
use crate::native::NativeBridge;
use crate::types::{EResult, EventKind, PipeHandle, SteamId, UserHandle};
use crate::wire::{encode_header, ByteOrder, PointerWidth, RawRecord, RecordBuf, WireLayout};

/// One scripted record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulatedRecord {
    user: UserHandle,
    kind: EventKind,
    payload: Option<Box<[u8]>>,
    declared_len: i32,
}

impl SimulatedRecord {
    /// A record whose payload is `payload`.
    ///
    /// # Panics
    ///
    /// Panics if the payload is longer than `i32::MAX` bytes.
    #[must_use]
    pub fn new(user: UserHandle, kind: EventKind, payload: Vec<u8>) -> Self {
        let declared_len = i32::try_from(payload.len()).expect("payload fits the i32 length field");
        Self {
            user,
            kind,
            payload: Some(payload.into_boxed_slice()),
            declared_len,
        }
    }

    /// A record with a null payload address and zero length.
    #[must_use]
    pub const fn empty(user: UserHandle, kind: EventKind) -> Self {
        Self {
            user,
            kind,
            payload: None,
            declared_len: 0,
        }
    }

    /// A record with a null payload address and an arbitrary declared length.
    ///
    /// Models malformed native state; nothing is backing the length.
    #[must_use]
    pub const fn unbacked(user: UserHandle, kind: EventKind, declared_len: i32) -> Self {
        Self {
            user,
            kind,
            payload: None,
            declared_len,
        }
    }

    /// A stats-received record laid out as `[game id: 8][result: 4][user: 8]`.
    #[must_use]
    pub fn user_stats_received(
        order: ByteOrder,
        owner: UserHandle,
        game_id: u64,
        result: EResult,
        user: SteamId,
    ) -> Self {
        let mut payload = Vec::with_capacity(20);
        payload.extend_from_slice(&order.u64_bytes(game_id));
        payload.extend_from_slice(&order.i32_bytes(result.0));
        payload.extend_from_slice(&order.u64_bytes(user.raw()));
        Self::new(owner, EventKind::USER_STATS_RECEIVED, payload)
    }

    /// Event kind of this record.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }
}

/// One step in a scripted frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimulatedItem {
    /// A record to hand out.
    Record(SimulatedRecord),
    /// `next_record` fails with this error when it reaches this slot.
    FetchFailure(BridgeError),
}

impl From<SimulatedRecord> for SimulatedItem {
    fn from(record: SimulatedRecord) -> Self {
        Self::Record(record)
    }
}

#[derive(Debug)]
enum Frame {
    Items(Vec<SimulatedItem>),
    Fail(BridgeError),
}

/// Everything a [`SimulatedBridge`] has observed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProbeLog {
    /// Successful `run_frame` calls.
    pub frames: usize,
    /// Kinds of records handed out, in fetch order.
    pub fetched: Vec<EventKind>,
    /// Kinds of records released, in release order.
    pub released: Vec<EventKind>,
    /// Fetches that returned an error.
    pub fetch_failures: usize,
    /// Fetches made while the previous record was still held.
    pub double_fetches: usize,
    /// Releases with no record held.
    pub spurious_releases: usize,
}

impl ProbeLog {
    /// Records fetched but not yet released.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.fetched.len().saturating_sub(self.released.len())
    }
}

/// Shared view of a simulated bridge's accounting.
#[derive(Clone, Debug, Default)]
pub struct BridgeProbe {
    log: Arc<Mutex<ProbeLog>>,
}

impl BridgeProbe {
    /// Copy of the current log.
    #[must_use]
    pub fn snapshot(&self) -> ProbeLog {
        self.log.lock().clone()
    }
}

/// Scripted [`NativeBridge`] for tests and benchmarks.
#[derive(Debug)]
pub struct SimulatedBridge {
    layout: WireLayout,
    pipe: PipeHandle,
    sdk_initialized: bool,
    dispatch_initialized: bool,
    connected: bool,
    script: VecDeque<Frame>,
    queue: VecDeque<SimulatedItem>,
    /// Kind and payload of the record currently handed out.
    held: Option<(EventKind, Option<Box<[u8]>>)>,
    /// Payloads superseded by a double fetch. Kept alive until drop.
    abandoned: Vec<Box<[u8]>>,
    probe: BridgeProbe,
}

impl SimulatedBridge {
    /// An initialized SDK with an open pipe, writing the host layout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            layout: WireLayout::host(),
            pipe: PipeHandle(1),
            sdk_initialized: true,
            dispatch_initialized: false,
            connected: true,
            script: VecDeque::new(),
            queue: VecDeque::new(),
            held: None,
            abandoned: Vec::new(),
            probe: BridgeProbe::default(),
        }
    }

    /// Writes headers in `layout` instead of the host layout.
    #[must_use]
    pub fn with_layout(mut self, layout: WireLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Simulates an application that never initialized the SDK.
    #[must_use]
    pub fn uninitialized(mut self) -> Self {
        self.sdk_initialized = false;
        self
    }

    /// Drops the session; `session_handle` fails from now on.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Scripts the records the next frame enqueues.
    pub fn push_frame<I, T>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SimulatedItem>,
    {
        self.script
            .push_back(Frame::Items(items.into_iter().map(Into::into).collect()));
        self
    }

    /// Scripts a failing frame.
    pub fn push_frame_failure(&mut self, error: BridgeError) -> &mut Self {
        self.script.push_back(Frame::Fail(error));
        self
    }

    /// Items enqueued and not yet fetched.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Handle on this bridge's accounting.
    #[must_use]
    pub fn probe(&self) -> BridgeProbe {
        self.probe.clone()
    }

    fn check_pipe(&self, pipe: PipeHandle) -> BridgeResult<()> {
        if pipe == self.pipe {
            Ok(())
        } else {
            Err(BridgeError::QueueCorrupted(format!("unknown pipe {}", pipe.0)))
        }
    }
}

impl Default for SimulatedBridge {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: payloads are boxed slices owned by `held` until `free_last_record`
// (or by `abandoned` until drop). Moving a Box does not move its heap data,
// and nothing writes through it while held.
unsafe impl NativeBridge for SimulatedBridge {
    fn init_manual_dispatch(&mut self) -> BridgeResult<()> {
        if !self.sdk_initialized {
            return Err(BridgeError::NotInitialized);
        }
        if self.dispatch_initialized {
            return Err(BridgeError::AlreadyInitialized);
        }
        self.dispatch_initialized = true;
        Ok(())
    }

    fn session_handle(&self) -> BridgeResult<PipeHandle> {
        if !self.sdk_initialized || !self.dispatch_initialized {
            return Err(BridgeError::NotInitialized);
        }
        if !self.connected {
            return Err(BridgeError::NoSession);
        }
        Ok(self.pipe)
    }

    fn run_frame(&mut self, pipe: PipeHandle) -> BridgeResult<()> {
        self.check_pipe(pipe)?;
        match self.script.pop_front() {
            Some(Frame::Fail(error)) => return Err(error),
            Some(Frame::Items(items)) => self.queue.extend(items),
            None => {}
        }
        self.probe.log.lock().frames += 1;
        Ok(())
    }

    fn next_record(&mut self, pipe: PipeHandle, header: &mut RecordBuf) -> BridgeResult<bool> {
        self.check_pipe(pipe)?;

        if let Some((_, payload)) = self.held.take() {
            tracing::warn!("record fetched before the previous one was released");
            self.abandoned.extend(payload);
            self.probe.log.lock().double_fetches += 1;
        }

        let record = match self.queue.pop_front() {
            None => return Ok(false),
            Some(SimulatedItem::FetchFailure(error)) => {
                self.probe.log.lock().fetch_failures += 1;
                return Err(error);
            }
            Some(SimulatedItem::Record(record)) => record,
        };

        let address = record
            .payload
            .as_ref()
            .map_or(0, |bytes| bytes.as_ptr() as usize as u64);
        if self.layout.pointer_width == PointerWidth::Four && address > u64::from(u32::MAX) {
            return Err(BridgeError::QueueCorrupted(format!(
                "payload address {address:#x} does not fit a 4-byte pointer"
            )));
        }

        encode_header(
            self.layout,
            &RawRecord {
                user: record.user.0,
                kind: record.kind.0,
                address,
                len: record.declared_len,
            },
            header,
        );

        self.probe.log.lock().fetched.push(record.kind);
        self.held = Some((record.kind, record.payload));
        Ok(true)
    }

    fn free_last_record(&mut self, _pipe: PipeHandle) {
        let mut log = self.probe.log.lock();
        match self.held.take() {
            Some((kind, _payload)) => log.released.push(kind),
            None => log.spurious_releases += 1,
        }
    }

    fn wire_layout(&self) -> WireLayout {
        self.layout
    }
}
