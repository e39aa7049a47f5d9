//! # Flat API Adapter
//!
//! [`NativeBridge`] over the SDK's C entry points. The application links the
//! `steam_api` library and calls `SteamAPI_Init` before creating a bridge.
//!
//! ## Safety Note
//!
//! Every call here crosses into C. The SDK documents that the parameter
//! block of a fetched callback stays valid until
//! `SteamAPI_ManualDispatch_FreeLastCallback`, which is what the
//! [`NativeBridge`] contract asks for.

#![allow(unsafe_code)]

use std::os::raw::c_int;

use crate::error::{BridgeError, BridgeResult};
use crate::native::NativeBridge;
use crate::types::PipeHandle;
use crate::wire::{encode_header, RawRecord, RecordBuf, WireLayout};

/// Native `CallbackMsg_t`.
#[repr(C)]
struct CallbackMsg {
    user: i32,
    callback: c_int,
    param: *mut u8,
    param_len: c_int,
}

extern "C" {
    fn SteamAPI_GetHSteamPipe() -> i32;
    fn SteamAPI_ManualDispatch_Init();
    fn SteamAPI_ManualDispatch_RunFrame(pipe: i32);
    fn SteamAPI_ManualDispatch_GetNextCallback(pipe: i32, msg: *mut CallbackMsg) -> bool;
    fn SteamAPI_ManualDispatch_FreeLastCallback(pipe: i32);
}

/// Bridge over the linked Steamworks SDK.
///
/// Headers are repacked in the host layout, which is also what
/// [`wire_layout`](NativeBridge::wire_layout) reports.
#[derive(Debug, Default)]
pub struct SteamApi {
    initialized: bool,
}

impl SteamApi {
    /// Creates an adapter. Does not touch the SDK.
    #[must_use]
    pub const fn new() -> Self {
        Self { initialized: false }
    }

    fn pipe() -> PipeHandle {
        // SAFETY: no arguments; returns 0 when the SDK is not initialized.
        PipeHandle(unsafe { SteamAPI_GetHSteamPipe() })
    }
}

// SAFETY: payload pointers come straight from the SDK's callback message and
// remain valid until FreeLastCallback.
unsafe impl NativeBridge for SteamApi {
    fn init_manual_dispatch(&mut self) -> BridgeResult<()> {
        if self.initialized {
            return Err(BridgeError::AlreadyInitialized);
        }
        if Self::pipe().is_null() {
            return Err(BridgeError::NotInitialized);
        }
        // SAFETY: the SDK is initialized (non-null pipe).
        unsafe { SteamAPI_ManualDispatch_Init() };
        self.initialized = true;
        tracing::info!("steam manual dispatch initialized");
        Ok(())
    }

    fn session_handle(&self) -> BridgeResult<PipeHandle> {
        if !self.initialized {
            return Err(BridgeError::NotInitialized);
        }
        let pipe = Self::pipe();
        if pipe.is_null() {
            return Err(BridgeError::NoSession);
        }
        Ok(pipe)
    }

    fn run_frame(&mut self, pipe: PipeHandle) -> BridgeResult<()> {
        // SAFETY: pipe was obtained from the SDK and manual dispatch is on.
        unsafe { SteamAPI_ManualDispatch_RunFrame(pipe.0) };
        Ok(())
    }

    fn next_record(&mut self, pipe: PipeHandle, header: &mut RecordBuf) -> BridgeResult<bool> {
        let mut msg = CallbackMsg {
            user: 0,
            callback: 0,
            param: std::ptr::null_mut(),
            param_len: 0,
        };
        // SAFETY: msg is a valid, writable CallbackMsg_t.
        let fetched = unsafe { SteamAPI_ManualDispatch_GetNextCallback(pipe.0, &mut msg) };
        if !fetched {
            return Ok(false);
        }

        encode_header(
            WireLayout::host(),
            &RawRecord {
                user: msg.user,
                kind: msg.callback,
                address: msg.param as usize as u64,
                len: msg.param_len,
            },
            header,
        );
        Ok(true)
    }

    fn free_last_record(&mut self, pipe: PipeHandle) {
        // SAFETY: only called after a successful GetNextCallback on this pipe.
        unsafe { SteamAPI_ManualDispatch_FreeLastCallback(pipe.0) };
    }
}
