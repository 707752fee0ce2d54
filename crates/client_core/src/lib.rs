use std::sync::Arc;

use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use shared::{
    error::ProtocolError,
    protocol::{decode_server_event, ClientCommand, JobSettings},
};
use tokio::{
    net::TcpStream,
    sync::{broadcast, Mutex},
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};

pub mod error;
pub mod session;
pub mod ui;

pub use error::ClientError;
pub use session::{folder_display_name, SessionState, SettingsForm};
pub use ui::{FieldGates, JobControls, UiState};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Where the control backend lives. The port is appended only when
/// present, matching how the served page derives it from its own location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlEndpoint {
    pub host: String,
    pub port: Option<u16>,
    pub secure: bool,
}

impl ControlEndpoint {
    pub fn url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        match self.port {
            Some(port) => format!("{scheme}://{}:{port}/websocket", self.host),
            None => format!("{scheme}://{}/websocket", self.host),
        }
    }
}

/// Rendered changes fanned out to frontends. Subscribers apply each event
/// wholesale; the client never emits partial enablement updates.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Ui(UiState),
    Settings(SettingsForm),
    Console(String),
    Gallery(String),
    Notice(String),
    ProtocolError(String),
    Disconnected,
}

/// Owns the single control WebSocket: sends the `initialize` handshake on
/// open, applies incoming messages to the session mirror and forwards user
/// actions as command envelopes.
pub struct ControlClient {
    session: Mutex<SessionState>,
    sink: Mutex<Option<WsSink>>,
    events: broadcast::Sender<ClientEvent>,
}

impl ControlClient {
    pub fn new() -> Arc<ControlClient> {
        let (events, _) = broadcast::channel(256);
        Arc::new(ControlClient {
            session: Mutex::new(SessionState::default()),
            sink: Mutex::new(None),
            events,
        })
    }

    /// Open the control connection, send `initialize` and start the reader
    /// task. A failure here is terminal for the session; there is no
    /// retry, and connection loss later is only reported, never repaired.
    pub async fn connect(
        self: &Arc<Self>,
        endpoint: &ControlEndpoint,
    ) -> Result<(), ClientError> {
        let url = endpoint.url();
        let mut guard = self.sink.lock().await;
        if guard.is_some() {
            return Err(ClientError::AlreadyConnected);
        }
        let (stream, _) = connect_async(&url).await.map_err(ClientError::Connect)?;
        info!("control socket connected url={url}");
        let (sink, source) = stream.split();
        *guard = Some(sink);
        drop(guard);

        self.send(ClientCommand::Initialize {}).await?;

        let client = Arc::clone(self);
        tokio::spawn(async move {
            client.read_loop(source).await;
        });
        Ok(())
    }

    async fn read_loop(self: Arc<Self>, mut source: WsSource) {
        while let Some(frame) = source.next().await {
            match frame {
                Ok(Message::Text(text)) => self.dispatch_frame(&text).await,
                Ok(Message::Close(_)) => {
                    info!("server closed the control socket");
                    break;
                }
                // ping/pong/binary frames are not part of the protocol
                Ok(_) => {}
                Err(err) => {
                    warn!("control socket read failed: {err}");
                    break;
                }
            }
        }
        self.sink.lock().await.take();
        warn!("control connection lost; no automatic reconnect, restart the client to resync");
        let _ = self.events.send(ClientEvent::Disconnected);
    }

    async fn dispatch_frame(&self, raw: &str) {
        match decode_server_event(raw) {
            Ok(event) => {
                let changes = self.session.lock().await.apply(event);
                for change in changes {
                    let _ = self.events.send(change);
                }
            }
            Err(err @ ProtocolError::UnknownType(_)) => {
                warn!("{err}");
                let _ = self.events.send(ClientEvent::ProtocolError(err.to_string()));
            }
            Err(err) => {
                // fail closed: drop the frame, keep the handler chain alive
                warn!("dropping malformed frame: {err}");
            }
        }
    }

    async fn send(&self, command: ClientCommand) -> Result<(), ClientError> {
        let frame = serde_json::to_string(&command)?;
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(ClientError::NotConnected)?;
        sink.send(Message::Text(frame))
            .await
            .map_err(ClientError::Send)
    }

    async fn form_payload(&self) -> Result<JobSettings, ClientError> {
        self.session
            .lock()
            .await
            .form_payload()
            .ok_or(ClientError::NotSynced)
    }

    /// Assemble the current form and start a classification run.
    pub async fn start_job(&self) -> Result<(), ClientError> {
        let payload = self.form_payload().await?;
        self.send(ClientCommand::StartJob(payload)).await
    }

    /// Assemble the current form and put the backend into listening mode.
    pub async fn start_listening(&self) -> Result<(), ClientError> {
        let payload = self.form_payload().await?;
        self.send(ClientCommand::Listen(payload)).await
    }

    /// Push the current form without starting anything.
    pub async fn update_settings(&self) -> Result<(), ClientError> {
        let payload = self.form_payload().await?;
        self.send(ClientCommand::UpdateSettings(payload)).await
    }

    pub async fn kill_job(&self) -> Result<(), ClientError> {
        self.send(ClientCommand::kill_job()).await
    }

    pub async fn change_directory(&self, path: impl Into<String>) -> Result<(), ClientError> {
        self.send(ClientCommand::ChangeDirectory(path.into())).await
    }

    pub async fn request_gallery(&self, gallery_number: i64) -> Result<(), ClientError> {
        self.send(ClientCommand::GetGallery { gallery_number }).await
    }

    /// Edit the locally held form fields; the next assembling command
    /// picks the edits up.
    pub async fn edit_settings(
        &self,
        edit: impl FnOnce(&mut JobSettings),
    ) -> Result<(), ClientError> {
        let mut session = self.session.lock().await;
        if session.edit_fields(edit) {
            Ok(())
        } else {
            Err(ClientError::NotSynced)
        }
    }

    pub async fn ui_state(&self) -> UiState {
        self.session.lock().await.ui_state()
    }

    pub async fn settings_form(&self) -> Option<SettingsForm> {
        self.session.lock().await.form()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
