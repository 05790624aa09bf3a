//! lobby-protocol
//!
//! Wire-level encoding/decoding for the lobby coordinator.
//!
//! This crate is responsible for turning logical lobby messages
//! (`lobby_core::ClientEvent` / `ServerEvent`) into JSON envelopes and
//! back again.
//!
//! - [`wire_types`] : event-name table and envelope shapes
//! - [`json_codec`] : envelope encode/decode

pub mod wire_types;
pub mod json_codec;

pub use wire_types::WireEvent;

pub use json_codec::{
    ProtocolError,
    decode_client_event,
    encode_client_event,
    decode_server_event,
    encode_server_event,
};
