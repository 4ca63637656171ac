use exchange_error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Wrapper applied to every structured payload before it is stored in a
/// transport slot. The counterpart endpoint strips it on decode.
#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Serialize `payload` inside the `{"data": ...}` envelope.
pub fn encode<T: Serialize>(payload: &T) -> Result<String> {
    Ok(serde_json::to_string(&Envelope { data: payload })?)
}

/// Deserialize an envelope produced by [`encode`] and strip the wrapper.
///
/// Only this protocol's own writer produces these strings, so a payload
/// that fails to decode is a protocol error, not a recoverable state.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(raw)?;
    Ok(envelope.data)
}
