use std::collections::{BTreeMap, HashSet};

use be_core::{
    BattleConfig, BattleEventError, Character, CharacterId, EventActorDef, ItemId, Stats,
};
use serde::{Deserialize, Serialize};

pub const SETUP_SCHEMA_V1: &str = "be-setup.v1";

/// Everything a battle starts from, as authored in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleSetup {
    pub schema_version: String,
    #[serde(default)]
    pub config: BattleConfig,
    /// Persistent party data. Members not listed in `party` can join later.
    #[serde(default)]
    pub members: Vec<MemberDef>,
    /// Ids of `members` fighting from the first frame, in roster order.
    #[serde(default)]
    pub party: Vec<CharacterId>,
    /// Class data used when a brand new member is created mid-battle.
    #[serde(default)]
    pub recruits: Vec<MemberDef>,
    #[serde(default)]
    pub monster_templates: Vec<MonsterTemplateDef>,
    #[serde(default)]
    pub monsters: Vec<MonsterPlacement>,
    #[serde(default)]
    pub actors: Vec<EventActorDef>,
    #[serde(default)]
    pub switches: BTreeMap<String, bool>,
    #[serde(default)]
    pub variables: BTreeMap<String, f64>,
    #[serde(default)]
    pub money: i64,
    #[serde(default)]
    pub items: Vec<ItemStack>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDef {
    pub id: CharacterId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default = "default_level")]
    pub level: u32,
    /// Saved gauge; a fresh member starts full.
    #[serde(default)]
    pub hp: Option<i32>,
}

fn default_level() -> u32 {
    1
}

impl MemberDef {
    pub fn to_character(&self) -> Character {
        let mut character =
            Character::player(self.id, self.name.clone(), self.stats.clone(), self.level);
        if let Some(hp) = self.hp {
            character.hp = hp;
        }
        character.clamp();
        character
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterTemplateDef {
    pub id: CharacterId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stats: Stats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterPlacement {
    pub template: CharacterId,
    /// Formation slot; defaults to the placement's position in the list.
    #[serde(default)]
    pub layout: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStack {
    pub item: ItemId,
    pub count: i64,
}

pub fn parse_setup(json: &str) -> Result<BattleSetup, BattleEventError> {
    let setup: BattleSetup = serde_json::from_str(json).map_err(|error| {
        BattleEventError::new(
            "SETUP_JSON_PARSE",
            format!("Failed to parse battle setup: {}", error),
        )
    })?;
    validate_setup(&setup)?;
    Ok(setup)
}

pub fn validate_setup(setup: &BattleSetup) -> Result<(), BattleEventError> {
    if setup.schema_version != SETUP_SCHEMA_V1 {
        return Err(BattleEventError::new(
            "SETUP_SCHEMA",
            format!(
                "Invalid setup schema version \"{}\", expected \"{}\".",
                setup.schema_version, SETUP_SCHEMA_V1
            ),
        ));
    }

    let config = &setup.config;
    if config.party_capacity == 0 || config.party_floor > config.party_capacity {
        return Err(BattleEventError::new(
            "SETUP_CONFIG",
            format!(
                "Party floor {} must not exceed party capacity {}.",
                config.party_floor, config.party_capacity
            ),
        ));
    }

    let known_members = setup
        .members
        .iter()
        .map(|member| member.id)
        .collect::<HashSet<_>>();
    let mut seen = HashSet::new();
    for id in &setup.party {
        if !known_members.contains(id) {
            return Err(BattleEventError::new(
                "SETUP_PARTY_MEMBER_UNKNOWN",
                format!("Party member \"{}\" is not declared in members.", id),
            ));
        }
        if !seen.insert(*id) {
            return Err(BattleEventError::new(
                "SETUP_PARTY_DUPLICATE",
                format!("Party member \"{}\" is listed twice.", id),
            ));
        }
    }
    if setup.party.len() > config.party_capacity {
        return Err(BattleEventError::new(
            "SETUP_PARTY_CAPACITY",
            format!(
                "Party has {} members, capacity is {}.",
                setup.party.len(),
                config.party_capacity
            ),
        ));
    }

    let known_templates = setup
        .monster_templates
        .iter()
        .map(|template| template.id)
        .collect::<HashSet<_>>();
    if let Some(placement) = setup
        .monsters
        .iter()
        .find(|placement| !known_templates.contains(&placement.template))
    {
        return Err(BattleEventError::new(
            "SETUP_MONSTER_TEMPLATE_UNKNOWN",
            format!("Monster template \"{}\" is not declared.", placement.template),
        ));
    }
    if setup.monsters.len() > config.monster_capacity {
        return Err(BattleEventError::new(
            "SETUP_MONSTER_CAPACITY",
            format!(
                "Setup places {} monsters, capacity is {}.",
                setup.monsters.len(),
                config.monster_capacity
            ),
        ));
    }

    let mut actors = HashSet::new();
    for actor in &setup.actors {
        if !actors.insert(actor.id) {
            return Err(BattleEventError::new(
                "SETUP_ACTOR_DUPLICATE",
                format!("Event actor \"{}\" is declared twice.", actor.id),
            ));
        }
    }

    Ok(())
}
