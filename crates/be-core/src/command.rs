use serde::{Deserialize, Serialize};

use crate::character::Camp;
use crate::ids::{CharacterId, ItemId, SkillId, StatusId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BattleCommand {
    Attack,
    Skill { skill: SkillId },
    Item { item: ItemId },
    Guard,
    Escape,
    Nothing,
}

/// Deduplication key of buffered turn entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Action,
    Status,
}

/// Payload of a buffered turn entry, captured with resolved operands when it
/// is enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PendingCommand {
    Action { command: BattleCommand },
    Status { status: StatusId, add: bool },
}

impl PendingCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Action { .. } => CommandKind::Action,
            Self::Status { .. } => CommandKind::Status,
        }
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Self::Action { .. })
    }
}

/// When a scripted "set next action" takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTiming {
    NextTurn,
    Priority,
    Overwrite,
}

impl ActionTiming {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::NextTurn,
            1 => Self::Priority,
            _ => Self::Overwrite,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "camelCase")]
pub enum TargetSelector {
    /// The participant bound to the executing actor.
    Owner,
    #[serde(rename_all = "camelCase")]
    Character { id: CharacterId },
    /// 1-based position in the party roster.
    #[serde(rename_all = "camelCase")]
    PartySlot { slot: u32 },
    /// Monster matched by its per-battle unique id.
    #[serde(rename_all = "camelCase")]
    MonsterSlot { unique_id: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberCommand {
    Add,
    AddNew,
    SetWait,
    FadeOut,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "camelCase")]
pub enum MemberSubject {
    #[serde(rename_all = "camelCase")]
    Character { id: CharacterId },
    /// Roster position for the party, formation slot for monsters.
    #[serde(rename_all = "camelCase")]
    Slot { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberChange {
    pub command: MemberCommand,
    pub camp: Camp,
    pub subject: MemberSubject,
    #[serde(default)]
    pub layout: Option<usize>,
    #[serde(default)]
    pub level: Option<u32>,
}

impl MemberChange {
    pub fn new(command: MemberCommand, camp: Camp, subject: MemberSubject) -> Self {
        Self {
            command,
            camp,
            subject,
            layout: None,
            level: None,
        }
    }

    pub fn with_layout(mut self, layout: usize) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }
}
