use serde::{Deserialize, Serialize};

use crate::command::TargetSelector;
use crate::ids::{ActorId, CharacterId, ItemId};
use crate::trigger::{CoarsePhase, Trigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Eq => (lhs - rhs).abs() < f64::EPSILON,
            Self::Ne => (lhs - rhs).abs() >= f64::EPSILON,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
        }
    }
}

/// Switch or variable reference as authored: a name, an optional owning
/// scope and whether it lives in dynamic (per-instance) storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarRef {
    pub name: String,
    #[serde(default)]
    pub scope: Option<ActorId>,
    #[serde(default)]
    pub dynamic: bool,
}

impl VarRef {
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: None,
            dynamic: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "camelCase")]
pub enum PhaseCondition {
    Coarse { phase: CoarsePhase },
    /// Must equal the current fine-grained trigger.
    Trigger { trigger: Trigger },
}

fn default_present() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Condition {
    #[serde(rename_all = "camelCase")]
    Switch { switch: VarRef, value: bool },
    #[serde(rename_all = "camelCase")]
    Variable {
        variable: VarRef,
        op: Comparison,
        value: f64,
    },
    #[serde(rename_all = "camelCase")]
    Money { op: Comparison, value: i64 },
    #[serde(rename_all = "camelCase")]
    Item {
        item: ItemId,
        op: Comparison,
        count: i64,
    },
    /// Optionally restricted to the active character picked by `subject`.
    #[serde(rename_all = "camelCase")]
    BattlePhase {
        phase: PhaseCondition,
        #[serde(default)]
        subject: Option<TargetSelector>,
    },
    #[serde(rename_all = "camelCase")]
    PartyMember {
        character: CharacterId,
        #[serde(default = "default_present")]
        present: bool,
    },
    #[serde(rename_all = "camelCase")]
    Hp {
        target: TargetSelector,
        op: Comparison,
        percent: f64,
    },
}
