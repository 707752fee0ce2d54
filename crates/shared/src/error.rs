use thiserror::Error;

/// Failure modes when decoding an incoming frame at the protocol boundary.
///
/// `UnknownType` is kept separate from the other variants because it is the
/// one case that gets surfaced to the user by name; everything else is
/// dropped quietly by the connection manager.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message has no `type` field")]
    MissingType,
    #[error("unknown message type `{0}`")]
    UnknownType(String),
    #[error("malformed `{tag}` payload: {source}")]
    Payload {
        tag: String,
        source: serde_json::Error,
    },
}
