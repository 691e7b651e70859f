use serde::{Deserialize, Serialize};

use crate::command::BattleCommand;
use crate::ids::{CharacterId, StatusId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Camp {
    Party,
    Monster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatKind {
    Hp,
    Mp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub max_hp: i32,
    pub max_mp: i32,
    pub attack: i32,
    pub defense: i32,
    pub magic: i32,
    pub speed: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            max_hp: 1,
            max_mp: 0,
            attack: 0,
            defense: 0,
            magic: 0,
            speed: 0,
        }
    }
}

/// Camp-specific data of a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "camp", rename_all = "camelCase")]
pub enum CharacterKind {
    #[serde(rename_all = "camelCase")]
    Player { level: u32 },
    /// `unique_id` stays attached to the monster for the whole battle so
    /// slot-based script targets survive insertions and removals.
    #[serde(rename_all = "camelCase")]
    Monster { unique_id: u32, layout: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: CharacterId,
    #[serde(default)]
    pub name: String,
    pub hp: i32,
    #[serde(default)]
    pub mp: i32,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub statuses: Vec<StatusId>,
    #[serde(default)]
    pub selected_command: Option<BattleCommand>,
    #[serde(default)]
    pub targets: Vec<CharacterId>,
    pub kind: CharacterKind,
}

impl Character {
    pub fn player(id: CharacterId, name: impl Into<String>, stats: Stats, level: u32) -> Self {
        Self {
            id,
            name: name.into(),
            hp: stats.max_hp,
            mp: stats.max_mp,
            stats,
            statuses: Vec::new(),
            selected_command: None,
            targets: Vec::new(),
            kind: CharacterKind::Player { level },
        }
    }

    pub fn monster(
        id: CharacterId,
        name: impl Into<String>,
        stats: Stats,
        unique_id: u32,
        layout: usize,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            hp: stats.max_hp,
            mp: stats.max_mp,
            stats,
            statuses: Vec::new(),
            selected_command: None,
            targets: Vec::new(),
            kind: CharacterKind::Monster { unique_id, layout },
        }
    }

    pub fn camp(&self) -> Camp {
        match self.kind {
            CharacterKind::Player { .. } => Camp::Party,
            CharacterKind::Monster { .. } => Camp::Monster,
        }
    }

    pub fn unique_id(&self) -> Option<u32> {
        match self.kind {
            CharacterKind::Monster { unique_id, .. } => Some(unique_id),
            CharacterKind::Player { .. } => None,
        }
    }

    pub fn layout(&self) -> Option<usize> {
        match self.kind {
            CharacterKind::Monster { layout, .. } => Some(layout),
            CharacterKind::Player { .. } => None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn hp_percent(&self) -> f64 {
        if self.stats.max_hp <= 0 {
            return 0.0;
        }
        f64::from(self.hp) * 100.0 / f64::from(self.stats.max_hp)
    }

    pub fn stat(&self, stat: StatKind) -> i32 {
        match stat {
            StatKind::Hp => self.hp,
            StatKind::Mp => self.mp,
        }
    }

    /// Adds `delta` to a gauge and clamps it into `[0, max]`.
    pub fn change_stat(&mut self, stat: StatKind, delta: i32) {
        match stat {
            StatKind::Hp => self.hp = self.hp.saturating_add(delta),
            StatKind::Mp => self.mp = self.mp.saturating_add(delta),
        }
        self.clamp();
    }

    pub fn clamp(&mut self) {
        self.stats.max_hp = self.stats.max_hp.max(1);
        self.stats.max_mp = self.stats.max_mp.max(0);
        self.hp = self.hp.clamp(0, self.stats.max_hp);
        self.mp = self.mp.clamp(0, self.stats.max_mp);
    }

    pub fn has_status(&self, status: StatusId) -> bool {
        self.statuses.contains(&status)
    }

    pub fn set_status(&mut self, status: StatusId, present: bool) {
        if present {
            if !self.has_status(status) {
                self.statuses.push(status);
            }
        } else {
            self.statuses.retain(|candidate| *candidate != status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(max_hp: i32, max_mp: i32) -> Stats {
        Stats {
            max_hp,
            max_mp,
            ..Stats::default()
        }
    }

    #[test]
    fn change_stat_clamps_into_gauge_bounds() {
        let mut hero = Character::player(CharacterId::new(), "Hero", stats(100, 20), 1);
        hero.change_stat(StatKind::Hp, -250);
        assert_eq!(hero.hp, 0);
        hero.change_stat(StatKind::Hp, 500);
        assert_eq!(hero.hp, 100);
        hero.change_stat(StatKind::Mp, -5);
        assert_eq!(hero.mp, 15);
    }

    #[test]
    fn hp_percent_handles_partial_gauge() {
        let mut hero = Character::player(CharacterId::new(), "Hero", stats(80, 0), 1);
        hero.hp = 20;
        assert!((hero.hp_percent() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn statuses_are_kept_unique() {
        let mut slime = Character::monster(CharacterId::new(), "Slime", stats(10, 0), 0, 0);
        let poison = StatusId::new();
        slime.set_status(poison, true);
        slime.set_status(poison, true);
        assert_eq!(slime.statuses.len(), 1);
        slime.set_status(poison, false);
        assert!(!slime.has_status(poison));
    }

    #[test]
    fn camp_follows_kind() {
        let slime = Character::monster(CharacterId::new(), "Slime", stats(10, 0), 3, 1);
        assert_eq!(slime.camp(), Camp::Monster);
        assert_eq!(slime.unique_id(), Some(3));
        assert_eq!(slime.layout(), Some(1));
    }
}
