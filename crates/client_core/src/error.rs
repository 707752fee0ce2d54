use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket connect failed: {0}")]
    Connect(#[source] tungstenite::Error),
    #[error("a control connection is already open")]
    AlreadyConnected,
    #[error("not connected to a control backend")]
    NotConnected,
    #[error("no settings synced from the server yet")]
    NotSynced,
    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("websocket send failed: {0}")]
    Send(#[source] tungstenite::Error),
}
