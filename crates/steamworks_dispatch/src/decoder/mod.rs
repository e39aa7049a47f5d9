//! # Record Decoder
//!
//! Turns a fetched record into typed values.
//!
//! ```text
//! RecordBuf ──decode_header──▶ RecordHeader ──for_record──▶ RawPayloadView
//!                                                               │
//!                                             decode_payload ◀──┘
//!                                                  │
//!                                                  ▼
//!                                  Option<DecodedEvent> (None = unknown kind)
//! ```
//!
//! One [`WireLayout`](steamworks_bridge::WireLayout) applies to the whole
//! record: the header is decoded with it and its byte order is passed on to
//! the payload.

mod header;
mod payload;
mod view;

pub use header::{decode_header, RecordHeader};
pub use payload::{
    decode_payload, payload_layout, DecodedEvent, FieldReader, PayloadLayout, UserStatsReceived,
};
pub use view::RawPayloadView;
