use serde::{Deserialize, Serialize};

use crate::character::StatKind;
use crate::command::{BattleCommand, MemberChange, TargetSelector};
use crate::condition::{Condition, VarRef};
use crate::ids::StatusId;
use crate::sheet::Graphic;

/// A literal number or the current value of a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Number(f64),
    Variable { variable: VarRef },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VarOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
}

impl VarOp {
    pub fn apply(self, current: f64, value: f64) -> f64 {
        match self {
            Self::Set => value,
            Self::Add => current + value,
            Self::Sub => current - value,
            Self::Mul => current * value,
            Self::Div if value == 0.0 => current,
            Self::Div => current / value,
        }
    }
}

/// One script line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Instruction {
    Wait {
        frames: u32,
    },
    WaitMembers,
    SetSwitch {
        switch: VarRef,
        value: bool,
    },
    SetVariable {
        variable: VarRef,
        op: VarOp,
        value: Operand,
    },
    ChangeStat {
        target: TargetSelector,
        stat: StatKind,
        amount: Operand,
    },
    /// Result is subtracted from the gauge, so negative results heal.
    ApplyFormula {
        #[serde(default)]
        source: Option<TargetSelector>,
        target: TargetSelector,
        formula: String,
        stat: StatKind,
    },
    ChangeStatus {
        target: TargetSelector,
        status: StatusId,
        add: bool,
    },
    DeferStatus {
        target: TargetSelector,
        status: StatusId,
        add: bool,
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
    ShakeCamera {
        strength: f32,
        frames: u32,
    },
    ChangeGraphic {
        graphic: Graphic,
    },
    Exclusive {
        enabled: bool,
        #[serde(default)]
        invert: bool,
    },
    Branch {
        conditions: Vec<Condition>,
        then: Vec<Instruction>,
        #[serde(default)]
        otherwise: Vec<Instruction>,
    },
    Exit,
}
