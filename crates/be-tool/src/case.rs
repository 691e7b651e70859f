use std::collections::BTreeMap;

use be_core::{
    ActorId, BattleCommand, BattlePhase, CharacterId, MemberChange, TargetSelector, Trigger,
};
use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "be-tool-case.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    /// Setup file, relative to the case file.
    #[serde(default = "default_setup")]
    pub setup: String,
    #[serde(default)]
    pub steps: Vec<CaseStep>,
    #[serde(default)]
    pub expected: ExpectedState,
}

fn default_setup() -> String {
    "setup.json".to_string()
}

fn default_settle_frames() -> u32 {
    600
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CaseStep {
    #[serde(rename_all = "camelCase")]
    SetPhase {
        phase: BattlePhase,
        #[serde(default)]
        active: Option<CharacterId>,
    },
    Trigger {
        trigger: Trigger,
    },
    Frames {
        count: u32,
    },
    MemberChange {
        change: MemberChange,
    },
    SetNextAction {
        target: TargetSelector,
        command: BattleCommand,
        #[serde(default)]
        timing: u32,
    },
    SetSwitch {
        name: String,
        value: bool,
    },
    /// Polls the core once; the last result is compared with `expected.busy`.
    #[serde(rename_all = "camelCase")]
    Busy {
        #[serde(default)]
        status_tick: bool,
    },
    /// Polls and advances until idle.
    #[serde(rename_all = "camelCase")]
    Settle {
        #[serde(default = "default_settle_frames")]
        max_frames: u32,
    },
}

impl CaseStep {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::SetPhase { .. } => "setPhase",
            Self::Trigger { .. } => "trigger",
            Self::Frames { .. } => "frames",
            Self::MemberChange { .. } => "memberChange",
            Self::SetNextAction { .. } => "setNextAction",
            Self::SetSwitch { .. } => "setSwitch",
            Self::Busy { .. } => "busy",
            Self::Settle { .. } => "settle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedPage {
    pub actor: ActorId,
    pub page: Option<usize>,
}

/// Final state a case must reach. Absent fields are not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedState {
    #[serde(default)]
    pub party: Option<Vec<CharacterId>>,
    #[serde(default)]
    pub monsters: Option<Vec<CharacterId>>,
    #[serde(default)]
    pub switches: BTreeMap<String, bool>,
    #[serde(default)]
    pub variables: BTreeMap<String, f64>,
    #[serde(default)]
    pub pages: Vec<ExpectedPage>,
    #[serde(default)]
    pub busy: Option<bool>,
}
