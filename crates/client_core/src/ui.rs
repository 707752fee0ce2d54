//! Pure projection from server-pushed job state onto UI enablement.

use shared::domain::{ClassificationType, JobStatus};

/// Enablement of the four job-control actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobControls {
    pub change_directory: bool,
    pub start_job: bool,
    pub start_listening: bool,
    pub stop_job: bool,
}

impl JobControls {
    /// Every job-control action refused. Applied while a kill is pending
    /// and before the first settings sync.
    pub const LOCKED: JobControls = JobControls {
        change_directory: false,
        start_job: false,
        start_listening: false,
        stop_job: false,
    };
}

pub fn job_controls(status: JobStatus) -> JobControls {
    match status {
        JobStatus::Running => JobControls {
            change_directory: false,
            start_job: false,
            start_listening: false,
            stop_job: true,
        },
        JobStatus::Listening => JobControls {
            change_directory: false,
            start_job: true,
            start_listening: false,
            stop_job: true,
        },
        JobStatus::Stopped => JobControls {
            change_directory: true,
            start_job: true,
            start_listening: true,
            stop_job: false,
        },
        JobStatus::Killed => JobControls::LOCKED,
    }
}

pub fn status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Running => "Running",
        JobStatus::Listening => "Waiting for New Particles",
        JobStatus::Stopped => "Ready for New Runs",
        JobStatus::Killed => "Waiting to Kill",
    }
}

/// The settings form is editable only while the backend can accept a new
/// run configuration.
pub fn form_enabled(status: JobStatus) -> bool {
    matches!(status, JobStatus::Listening | JobStatus::Stopped)
}

/// Enablement of the numeric fields gated by the classification type,
/// independent of job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldGates {
    pub run_count_startup: bool,
    pub high_res_initial: bool,
    pub particles_per_class: bool,
    pub class_number: bool,
}

impl FieldGates {
    pub const LOCKED: FieldGates = FieldGates {
        run_count_startup: false,
        high_res_initial: false,
        particles_per_class: false,
        class_number: false,
    };
}

pub fn field_gates(kind: ClassificationType) -> FieldGates {
    match kind {
        ClassificationType::Abinit => FieldGates {
            run_count_startup: true,
            high_res_initial: true,
            particles_per_class: true,
            class_number: true,
        },
        ClassificationType::Seeded => FieldGates {
            run_count_startup: true,
            high_res_initial: true,
            particles_per_class: false,
            class_number: false,
        },
        ClassificationType::Refine => FieldGates::LOCKED,
    }
}

/// One atomic enablement vector plus status line. Renderers apply this
/// wholesale so no control is left stale from a prior status.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub status_label: String,
    pub controls: JobControls,
    pub form_enabled: bool,
    pub gates: FieldGates,
}

pub fn project(status: JobStatus, classification: ClassificationType) -> UiState {
    UiState {
        status_label: status_label(status).to_string(),
        controls: job_controls(status),
        form_enabled: form_enabled(status),
        gates: field_gates(classification),
    }
}
