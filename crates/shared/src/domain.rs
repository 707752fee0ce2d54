use serde::{Deserialize, Serialize};

/// Server-owned lifecycle state of the classification job. The client never
/// transitions this on its own; it is resynchronized from every settings
/// payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Listening,
    Stopped,
    Killed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Listening => "listening",
            JobStatus::Stopped => "stopped",
            JobStatus::Killed => "killed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationType {
    Abinit,
    Seeded,
    Refine,
}

impl ClassificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassificationType::Abinit => "abinit",
            ClassificationType::Seeded => "seeded",
            ClassificationType::Refine => "refine",
        }
    }
}
