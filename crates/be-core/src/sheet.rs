use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::ids::{ActorId, CharacterId};
use crate::instruction::Instruction;
use crate::trigger::Trigger;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graphic {
    pub graphic: String,
    #[serde(default)]
    pub motion: Option<String>,
    #[serde(default)]
    pub facing: Option<f32>,
}

/// One page of an event actor: conditions, trigger and the bound script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub trigger: Trigger,
    /// Effect scripts run in the parallel pass whatever their trigger.
    #[serde(default)]
    pub effect: bool,
    #[serde(default)]
    pub script: Vec<Instruction>,
    #[serde(default)]
    pub graphic: Option<Graphic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventActorDef {
    pub id: ActorId,
    #[serde(default)]
    pub name: String,
    /// Participant this actor speaks for, if any.
    #[serde(default)]
    pub character: Option<CharacterId>,
    pub sheets: Vec<Sheet>,
}
