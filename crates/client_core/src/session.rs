//! Client-side mirror of the server session and the canonical
//! message-handling table.

use shared::protocol::{JobSettings, ServerEvent, SettingsSnapshot};
use tracing::info;

use crate::{
    ui::{self, FieldGates, JobControls, UiState},
    ClientEvent,
};

pub const START_NOTICE: &str = "You successfully started a job";
pub const KILL_NOTICE: &str =
    "A user has killed the current job. It will finish after the current cycle is complete.";

/// Form view handed to renderers on every settings resync.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
    pub warp_folder: String,
    pub folder_name: String,
    pub force_abinit: bool,
    pub fields: JobSettings,
}

fn form_view(snapshot: &SettingsSnapshot) -> SettingsForm {
    SettingsForm {
        warp_folder: snapshot.warp_folder.clone(),
        folder_name: folder_display_name(&snapshot.warp_folder).to_string(),
        force_abinit: snapshot.force_abinit,
        fields: snapshot.settings.clone(),
    }
}

/// Everything the client knows is server-pushed; this struct only caches
/// the last full resync plus the transient status line and kill latch.
#[derive(Debug, Default)]
pub struct SessionState {
    snapshot: Option<SettingsSnapshot>,
    status_line: String,
    kill_latched: bool,
    console: String,
    gallery: String,
}

impl SessionState {
    /// Apply one decoded server message and return the changes to fan out,
    /// in render order. Each message is handled to completion before the
    /// next is applied.
    pub fn apply(&mut self, event: ServerEvent) -> Vec<ClientEvent> {
        match event {
            ServerEvent::Init {
                settings,
                gallery_data,
            } => {
                let mut changes = self.sync_settings(settings);
                self.gallery = gallery_data.clone();
                changes.push(ClientEvent::Gallery(gallery_data));
                changes
            }
            ServerEvent::SettingsUpdate { settings } => self.sync_settings(settings),
            ServerEvent::GalleryUpdate { gallery_data } => {
                self.gallery = gallery_data.clone();
                vec![ClientEvent::Gallery(gallery_data)]
            }
            ServerEvent::ConsoleUpdate { data } => {
                // full snapshot, not an append
                self.console = data.clone();
                vec![ClientEvent::Console(data)]
            }
            ServerEvent::JobStarted => {
                self.status_line = "Started".to_string();
                vec![
                    ClientEvent::Notice(START_NOTICE.to_string()),
                    ClientEvent::Ui(self.ui_state()),
                ]
            }
            ServerEvent::JobFinished => {
                self.status_line = "Stopped".to_string();
                vec![ClientEvent::Ui(self.ui_state())]
            }
            ServerEvent::KillReceived => {
                self.kill_latched = true;
                self.status_line = "Waiting to Kill".to_string();
                vec![
                    ClientEvent::Notice(KILL_NOTICE.to_string()),
                    ClientEvent::Ui(self.ui_state()),
                ]
            }
            ServerEvent::Alert { data } => vec![ClientEvent::Notice(data)],
        }
    }

    fn sync_settings(&mut self, snapshot: SettingsSnapshot) -> Vec<ClientEvent> {
        info!(
            "settings synced status={} folder={}",
            snapshot.job_status.as_str(),
            snapshot.warp_folder
        );
        // A server-confirmed status wins over any transient label or kill
        // latch.
        self.kill_latched = false;
        self.status_line = ui::status_label(snapshot.job_status).to_string();
        let form = form_view(&snapshot);
        self.snapshot = Some(snapshot);
        vec![
            ClientEvent::Settings(form),
            ClientEvent::Ui(self.ui_state()),
        ]
    }

    pub fn ui_state(&self) -> UiState {
        let Some(snapshot) = &self.snapshot else {
            return UiState {
                status_label: self.status_line.clone(),
                controls: JobControls::LOCKED,
                form_enabled: false,
                gates: FieldGates::LOCKED,
            };
        };
        let mut state = ui::project(
            snapshot.job_status,
            snapshot.settings.classification_type,
        );
        state.status_label = self.status_line.clone();
        if self.kill_latched {
            state.controls = JobControls::LOCKED;
        }
        state
    }

    pub fn form(&self) -> Option<SettingsForm> {
        self.snapshot.as_ref().map(form_view)
    }

    /// The outbound assembler: current form fields with the display-only
    /// ones stripped. `None` until the first settings sync.
    pub fn form_payload(&self) -> Option<JobSettings> {
        self.snapshot
            .as_ref()
            .map(|snapshot| snapshot.settings.form_payload())
    }

    /// Edit the locally held form fields. Returns false before the first
    /// settings sync, when there is no form to edit.
    pub fn edit_fields(&mut self, edit: impl FnOnce(&mut JobSettings)) -> bool {
        match &mut self.snapshot {
            Some(snapshot) => {
                edit(&mut snapshot.settings);
                true
            }
            None => false,
        }
    }

    pub fn console(&self) -> &str {
        &self.console
    }

    pub fn gallery(&self) -> &str {
        &self.gallery
    }
}

/// Display name for the warp directory: its last non-empty path segment.
pub fn folder_display_name(path: &str) -> &str {
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}
