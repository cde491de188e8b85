//! Evacuation operations.

use serde::{Deserialize, Serialize};

/// The five evacuation operations a cell can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvacuationKind {
    RemoveEvacuating,
    Claimed,
    Crashed,
    Running,
    Stopped,
}

impl EvacuationKind {
    /// Every operation, in route-table order.
    pub const ALL: [EvacuationKind; 5] = [
        EvacuationKind::RemoveEvacuating,
        EvacuationKind::Claimed,
        EvacuationKind::Crashed,
        EvacuationKind::Running,
        EvacuationKind::Stopped,
    ];

    /// Log session name.
    pub fn session(self) -> &'static str {
        match self {
            Self::RemoveEvacuating => "remove-evacuating-actual-lrp",
            Self::Claimed => "evacuate-claimed-actual-lrp",
            Self::Crashed => "evacuate-crashed-actual-lrp",
            Self::Running => "evacuate-running-actual-lrp",
            Self::Stopped => "evacuate-stopped-actual-lrp",
        }
    }

    /// HTTP route accepting this operation.
    pub fn route(self) -> &'static str {
        match self {
            Self::RemoveEvacuating => "/v1/actual_lrps/remove_evacuating",
            Self::Claimed => "/v1/actual_lrps/evacuate_claimed",
            Self::Crashed => "/v1/actual_lrps/evacuate_crashed",
            Self::Running => "/v1/actual_lrps/evacuate_running",
            Self::Stopped => "/v1/actual_lrps/evacuate_stopped",
        }
    }

    /// Position in [`EvacuationKind::ALL`].
    pub fn ordinal(self) -> usize {
        match self {
            Self::RemoveEvacuating => 0,
            Self::Claimed => 1,
            Self::Crashed => 2,
            Self::Running => 3,
            Self::Stopped => 4,
        }
    }
}

impl std::fmt::Display for EvacuationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.session())
    }
}
