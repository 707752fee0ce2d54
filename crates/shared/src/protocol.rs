//! Wire types for the processing-control socket, both directions.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{ClassificationType, JobStatus},
    error::ProtocolError,
};

/// Fixed payload the backend expects on a kill request.
pub const KILL_JOB_PAYLOAD: &str = "Kill this job!";

/// Flat job-configuration record.
///
/// The twelve form fields are passed through as opaque strings and booleans;
/// the backend is the sole validator. `neural_net` and `pixel_size` are
/// echoed by the server for display and never assembled back into an
/// outbound payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSettings {
    pub classification_type: ClassificationType,
    pub mask_radius: String,
    pub high_res_initial: String,
    pub high_res_final: String,
    pub run_count_startup: String,
    pub run_count_refine: String,
    pub particle_count_initial: String,
    pub particle_count_update: String,
    pub class_number: String,
    pub particles_per_class: String,
    pub autocenter: bool,
    pub automask: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neural_net: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_size: Option<f64>,
}

impl JobSettings {
    /// The outbound form assembly: the same record with the display-only
    /// fields stripped, so a resynced snapshot round-trips to the exact
    /// payload the form would submit.
    pub fn form_payload(&self) -> JobSettings {
        JobSettings {
            neural_net: None,
            pixel_size: None,
            ..self.clone()
        }
    }
}

/// The `settings` payload of `init` and `settings_update` messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    pub warp_folder: String,
    pub job_status: JobStatus,
    #[serde(default)]
    pub force_abinit: bool,
    pub settings: JobSettings,
}

/// Client-to-server command envelope: `{"command": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "data", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Sole connection handshake, sent once on open. Carries an empty map.
    Initialize {},
    StartJob(JobSettings),
    Listen(JobSettings),
    UpdateSettings(JobSettings),
    KillJob(String),
    ChangeDirectory(String),
    GetGallery { gallery_number: i64 },
}

impl ClientCommand {
    pub fn kill_job() -> ClientCommand {
        ClientCommand::KillJob(KILL_JOB_PAYLOAD.to_string())
    }
}

/// Server-to-client envelope, dispatched on the `type` tag. Payload keys
/// vary per type, matching the backend's ad-hoc message shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Init {
        settings: SettingsSnapshot,
        gallery_data: String,
    },
    SettingsUpdate {
        settings: SettingsSnapshot,
    },
    GalleryUpdate {
        gallery_data: String,
    },
    ConsoleUpdate {
        data: String,
    },
    JobStarted,
    JobFinished,
    KillReceived,
    Alert {
        data: String,
    },
}

const SERVER_EVENT_TAGS: &[&str] = &[
    "init",
    "settings_update",
    "gallery_update",
    "console_update",
    "job_started",
    "job_finished",
    "kill_received",
    "alert",
];

/// Decode one incoming text frame, validating at the boundary before
/// dispatch. Unknown tags are rejected explicitly rather than falling
/// through to a generic deserialization error.
pub fn decode_server_event(raw: &str) -> Result<ServerEvent, ProtocolError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let tag = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or(ProtocolError::MissingType)?
        .to_string();
    if !SERVER_EVENT_TAGS.contains(&tag.as_str()) {
        return Err(ProtocolError::UnknownType(tag));
    }
    serde_json::from_value(value).map_err(|source| ProtocolError::Payload { tag, source })
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
