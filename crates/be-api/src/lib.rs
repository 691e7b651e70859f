mod memory;
mod setup;

pub use memory::{
    FrameTweener, MemoryStateStore, RecordingHost, RecordingVisualLayer, ScriptedTurnController,
    VisualEvent, DEFAULT_BAR_FRAMES,
};
pub use setup::{
    parse_setup, validate_setup, BattleSetup, ItemStack, MemberDef, MonsterPlacement,
    MonsterTemplateDef, SETUP_SCHEMA_V1,
};

use std::collections::HashMap;

use be_core::{BattleEventError, Character};
use be_runtime::{
    BattleCoreOptions, BattleEventCore, Collaborators, MonsterTemplate, RhaiFormulaEvaluator,
    StepReport,
};
use tracing::info;

/// A core wired to in-memory collaborators, with handles to inspect and
/// drive them from the host side.
pub struct BattleHarness {
    pub core: BattleEventCore,
    pub store: MemoryStateStore,
    pub visual: RecordingVisualLayer,
    pub turn: ScriptedTurnController,
    pub tweener: FrameTweener,
    pub host: RecordingHost,
}

impl BattleHarness {
    /// Runs `count` frames and merges their reports.
    pub fn frames(&mut self, count: u32) -> StepReport {
        let mut merged = StepReport::default();
        for _ in 0..count {
            let report = self.core.update();
            merged.processing |= report.processing;
            merged.finished.extend(report.finished);
            merged.removed.extend(report.removed);
        }
        merged
    }

    /// Polls and advances until the core reports idle. Returns the number of
    /// frames it took.
    pub fn settle(&mut self, max_frames: u32) -> Result<u32, BattleEventError> {
        for frame in 0..=max_frames {
            if !self.core.is_busy(true) {
                return Ok(frame);
            }
            if frame < max_frames {
                self.core.update();
            }
        }
        Err(BattleEventError::new(
            "RUNTIME_SETTLE_GUARD",
            format!("Battle still busy after {} frames.", max_frames),
        ))
    }
}

pub fn create_core_from_json(json: &str) -> Result<BattleHarness, BattleEventError> {
    create_core_from_setup(parse_setup(json)?)
}

pub fn create_core_from_setup(setup: BattleSetup) -> Result<BattleHarness, BattleEventError> {
    validate_setup(&setup)?;

    let store = MemoryStateStore::new();
    for (name, value) in &setup.switches {
        store.put_switch(name, *value);
    }
    for (name, value) in &setup.variables {
        store.put_variable(name, *value);
    }
    store.set_money(setup.money);
    for stack in &setup.items {
        store.set_item_count(stack.item, stack.count);
    }
    for member in &setup.members {
        store.insert_member(member.to_character());
    }
    for recruit in &setup.recruits {
        store.insert_recruit(recruit.id, recruit.name.clone(), recruit.stats.clone());
    }
    let templates = setup
        .monster_templates
        .iter()
        .map(|template| (template.id, template))
        .collect::<HashMap<_, _>>();
    for template in &setup.monster_templates {
        store.insert_template(
            template.id,
            MonsterTemplate {
                name: template.name.clone(),
                stats: template.stats.clone(),
            },
        );
    }

    let party = setup
        .party
        .iter()
        .filter_map(|id| store.member(*id))
        .collect::<Vec<_>>();
    let monsters = setup
        .monsters
        .iter()
        .enumerate()
        .filter_map(|(index, placement)| {
            let template = templates.get(&placement.template)?;
            Some(Character::monster(
                template.id,
                template.name.clone(),
                template.stats.clone(),
                0,
                placement.layout.unwrap_or(index),
            ))
        })
        .collect::<Vec<_>>();

    let visual = RecordingVisualLayer::new();
    let turn = ScriptedTurnController::new();
    let tweener = FrameTweener::default();
    let host = RecordingHost::new();
    let ports = Collaborators {
        store: Box::new(store.clone()),
        visual: Box::new(visual.clone()),
        turn: Box::new(turn.clone()),
        formula: Box::new(RhaiFormulaEvaluator::new()),
        tweener: Box::new(tweener.clone()),
        host: Box::new(host.clone()),
    };

    info!(
        target: "battle::setup",
        party = party.len(),
        monsters = monsters.len(),
        actors = setup.actors.len(),
        "battle setup loaded"
    );
    let core = BattleEventCore::new(
        BattleCoreOptions {
            config: setup.config,
            party,
            monsters,
            actors: setup.actors,
        },
        ports,
    );

    Ok(BattleHarness {
        core,
        store,
        visual,
        turn,
        tweener,
        host,
    })
}
