use serde::{Deserialize, Serialize};

/// What starts a sheet's script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    /// Never started by the scheduler itself.
    None,
    /// Starts once when the page becomes active.
    Auto,
    /// Runs in the parallel pass and restarts whenever it finishes.
    Parallel,
    /// Runs once in the parallel pass when the page becomes active.
    AutoParallel,
    BattleStart,
    TurnStart,
    BeforeCommandSelect,
    AfterCommandSelect,
    CancelCommandSelect,
    BeforeAction,
    AfterAction,
    AfterResult,
    BattleEnd,
}

impl Trigger {
    pub fn is_auto_start(self) -> bool {
        matches!(self, Self::Auto | Self::Parallel | Self::AutoParallel)
    }

    pub fn is_parallel(self) -> bool {
        matches!(self, Self::Parallel | Self::AutoParallel)
    }

    /// Sub-phase triggers become the "current fine-grained trigger" that
    /// battle-phase conditions compare against.
    pub fn is_sub_phase(self) -> bool {
        matches!(
            self,
            Self::BeforeAction
                | Self::AfterAction
                | Self::BeforeCommandSelect
                | Self::AfterCommandSelect
                | Self::CancelCommandSelect
                | Self::AfterResult
        )
    }
}

/// Phase of the outer turn controller. The core reads it, never drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BattlePhase {
    Setup,
    Start,
    Wait,
    PlayerTurnStart,
    CommandSelect,
    Action,
    Result,
    End,
}

impl BattlePhase {
    pub fn coarse(self) -> CoarsePhase {
        match self {
            Self::Setup | Self::Start => CoarsePhase::PreBattle,
            Self::End => CoarsePhase::PostBattle,
            _ => CoarsePhase::InBattle,
        }
    }

    /// Window in which buffered next-turn commands may be assigned.
    pub fn allows_command_assignment(self) -> bool {
        matches!(self, Self::Wait | Self::PlayerTurnStart)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoarsePhase {
    PreBattle,
    InBattle,
    PostBattle,
}
