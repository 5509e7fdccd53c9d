//! Events emitted by background copy tasks to subscribers (UI, logs, etc.)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique identifier for a copy task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CopyId(pub u64);

/// Events emitted by a copy task, in order: one `Started`, any number of
/// `Progress`, then exactly one of `Finished` or `Cancelled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyEvent {
    /// The task is about to read its source.
    Started {
        copy_id: CopyId,
        source: String,
    },

    /// Percentage copied so far (0-100). Only sent when the size is known.
    Progress {
        copy_id: CopyId,
        percent: u8,
    },

    /// The copy ended. `detail` is the file name on success, the failure
    /// reason otherwise.
    Finished {
        copy_id: CopyId,
        path: PathBuf,
        success: bool,
        detail: String,
    },

    /// The copy was cancelled; bytes already written are left in place.
    Cancelled {
        copy_id: CopyId,
        path: PathBuf,
        bytes_written: u64,
    },
}

impl CopyEvent {
    pub fn copy_id(&self) -> CopyId {
        match self {
            CopyEvent::Started { copy_id, .. }
            | CopyEvent::Progress { copy_id, .. }
            | CopyEvent::Finished { copy_id, .. }
            | CopyEvent::Cancelled { copy_id, .. } => *copy_id,
        }
    }

    /// Whether this is the last event of its task.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CopyEvent::Finished { .. } | CopyEvent::Cancelled { .. })
    }
}
