//! JSON encoding/decoding for lobby messages.
//!
//! This module converts between:
//! - raw text/binary frames (`&[u8]`)
//! - high-level `lobby_core::ClientEvent` / `ServerEvent`
//!
//! Every frame carries one envelope:
//!
//! ```text
//! { "event": "joinLobby", "data": { "machine": {...}, "code": "ABCD", "password": "" } }
//! ```
//!
//! Decoding an inbound envelope happens in two steps: the envelope is
//! parsed with an untyped `data`, the event name is resolved against
//! [`WireEvent`], and only then is `data` deserialized into that event's
//! payload type. A missing or `null` `data` reads as `{}`.
//!
//! NOTE: This module handles **one message per buffer**. Framing is the
//! transport's job (one WebSocket message per envelope).

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use lobby_core::{ClientEvent, ServerEvent};

use crate::wire_types::{Envelope, RawEnvelope, WireEvent};

/// Errors that can arise when encoding/decoding an envelope.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Not JSON, or not an object with the expected field types.
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("envelope has no event")]
    MissingEvent,

    /// No handler is registered under this name.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// `data` does not fit the event's payload type.
    #[error("invalid {event} payload: {source}")]
    InvalidPayload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),
}

// ============================================================================
// INPUT: client → server
// ============================================================================

/// Decode a single client envelope.
pub fn decode_client_event(buf: &[u8]) -> Result<ClientEvent, ProtocolError> {
    let raw: RawEnvelope = serde_json::from_slice(buf).map_err(ProtocolError::Malformed)?;
    let name = raw.event.ok_or(ProtocolError::MissingEvent)?;
    let event = WireEvent::from_name(&name).ok_or(ProtocolError::UnknownEvent(name))?;

    Ok(match event {
        WireEvent::CreateLobby => ClientEvent::CreateLobby(payload(event, raw.data)?),
        WireEvent::JoinLobby => ClientEvent::JoinLobby(payload(event, raw.data)?),
        WireEvent::UpdateMachine => ClientEvent::UpdateMachine(payload(event, raw.data)?),
        WireEvent::SelectSong => ClientEvent::SelectSong(payload(event, raw.data)?),
        WireEvent::LeaveLobby => ClientEvent::LeaveLobby,
        WireEvent::SpectateLobby => ClientEvent::SpectateLobby(payload(event, raw.data)?),
        WireEvent::SearchLobby => ClientEvent::SearchLobby,
        WireEvent::LobbyState => ClientEvent::LobbyState,
    })
}

/// Encode a client event as envelope text.
pub fn encode_client_event(event: &ClientEvent) -> Result<String, ProtocolError> {
    let data = match event {
        ClientEvent::CreateLobby(p) => to_value(p)?,
        ClientEvent::JoinLobby(p) => to_value(p)?,
        ClientEvent::UpdateMachine(p) => to_value(p)?,
        ClientEvent::SelectSong(p) => to_value(p)?,
        ClientEvent::SpectateLobby(p) => to_value(p)?,
        ClientEvent::LeaveLobby | ClientEvent::SearchLobby | ClientEvent::LobbyState => {
            Value::Object(Map::new())
        }
    };

    let envelope = Envelope {
        event: WireEvent::of(event).as_str(),
        data,
    };
    serde_json::to_string(&envelope).map_err(ProtocolError::Encode)
}

// ============================================================================
// OUTPUT: server → client
// ============================================================================

/// Encode a server event as envelope text.
pub fn encode_server_event(event: &ServerEvent) -> Result<String, ProtocolError> {
    serde_json::to_string(event).map_err(ProtocolError::Encode)
}

/// Decode a server envelope (used by clients and tests).
pub fn decode_server_event(buf: &[u8]) -> Result<ServerEvent, ProtocolError> {
    serde_json::from_slice(buf).map_err(ProtocolError::Malformed)
}

// ============================================================================
// Helpers
// ============================================================================

fn payload<T: DeserializeOwned>(event: WireEvent, data: Value) -> Result<T, ProtocolError> {
    let data = match data {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(data).map_err(|source| ProtocolError::InvalidPayload {
        event: event.as_str(),
        source,
    })
}

fn to_value<T: Serialize>(payload: &T) -> Result<Value, ProtocolError> {
    serde_json::to_value(payload).map_err(ProtocolError::Encode)
}
