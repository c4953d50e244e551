//! Text-frame codec for the tagged JSON envelope.
//!
//! Decoding is tolerant by design: a well-formed frame whose `type` is not
//! in [`KNOWN_EVENT_KINDS`] decodes to [`Decoded::Unknown`] so a newer
//! server never breaks an older client. Only structurally broken frames
//! (invalid JSON, missing `type`, bad payload for a known kind) are errors.

use serde_json::Value;

use crate::command::ClientCommand;
use crate::error::{Result, WireError};
use crate::event::{KNOWN_EVENT_KINDS, ServerEvent};

/// Result of decoding one inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    /// A recognized event.
    Event(ServerEvent),
    /// A well-formed frame of a kind this client does not understand.
    /// Logged and discarded by the caller.
    Unknown {
        /// The unrecognized `type` discriminator.
        kind: String,
    },
}

/// Encode an outbound command as a text frame.
pub fn encode_command(command: &ClientCommand) -> Result<String> {
    Ok(serde_json::to_string(command)?)
}

/// Decode one inbound text frame.
pub fn decode_event(text: &str) -> Result<Decoded> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| WireError::Malformed(e.to_string()))?;

    let Some(kind) = value.get("type").and_then(Value::as_str) else {
        return Err(WireError::Malformed("missing string `type` field".into()));
    };

    if !KNOWN_EVENT_KINDS.contains(&kind) {
        return Ok(Decoded::Unknown { kind: kind.into() });
    }

    let event: ServerEvent = serde_json::from_value(value)?;
    Ok(Decoded::Event(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn encode_ping() {
        let json = encode_command(&ClientCommand::Ping).unwrap();
        assert_eq!(json, r#"{"type":"ping"}"#);
    }

    #[test]
    fn encode_then_decode_is_not_symmetric_by_design() {
        // Commands and events are disjoint sets; a command kind arriving
        // inbound is simply unknown.
        let json = encode_command(&ClientCommand::Ping).unwrap();
        let decoded = decode_event(&json).unwrap();
        assert_eq!(
            decoded,
            Decoded::Unknown {
                kind: "ping".into()
            }
        );
    }

    #[test]
    fn decode_known_event() {
        let decoded = decode_event(r#"{"type":"pong"}"#).unwrap();
        assert_eq!(decoded, Decoded::Event(ServerEvent::Pong));
    }

    #[test]
    fn decode_unknown_kind_is_not_an_error() {
        let decoded = decode_event(r#"{"type":"hologram_sync","data":[1,2]}"#).unwrap();
        assert_eq!(
            decoded,
            Decoded::Unknown {
                kind: "hologram_sync".into()
            }
        );
    }

    #[test]
    fn decode_invalid_json_is_malformed() {
        let err = decode_event("not json").unwrap_err();
        assert_matches!(err, WireError::Malformed(_));
    }

    #[test]
    fn decode_missing_type_is_malformed() {
        let err = decode_event(r#"{"message_id":"m1"}"#).unwrap_err();
        assert_matches!(err, WireError::Malformed(_));
    }

    #[test]
    fn decode_non_string_type_is_malformed() {
        let err = decode_event(r#"{"type":42}"#).unwrap_err();
        assert_matches!(err, WireError::Malformed(_));
    }

    #[test]
    fn decode_known_kind_bad_payload_is_json_error() {
        // `message_ack` without its required field is a broken frame, not an
        // unknown kind.
        let err = decode_event(r#"{"type":"message_ack"}"#).unwrap_err();
        assert_matches!(err, WireError::Json(_));
    }

    #[test]
    fn decode_array_frame_is_malformed() {
        let err = decode_event("[1,2,3]").unwrap_err();
        assert_matches!(err, WireError::Malformed(_));
    }
}
