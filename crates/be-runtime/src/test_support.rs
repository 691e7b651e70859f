use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use be_core::{
    ActorId, BattleCommand, BattlePhase, Character, CharacterId, Graphic, Instruction, ItemId,
    Operand, Sheet, StatKind, Stats, Trigger, VarOp, VarRef,
};

use crate::formula::RhaiFormulaEvaluator;
use crate::ports::{
    ActorHandle, ActorState, Collaborators, HostCapabilities, MonsterTemplate, StateStore,
    StatusTweener, TurnController, VarSlot, VisualLayer,
};

pub fn hero(name: &str, max_hp: i32) -> Character {
    Character::player(
        CharacterId::new(),
        name,
        Stats {
            max_hp,
            max_mp: 10,
            attack: 5,
            defense: 5,
            ..Stats::default()
        },
        1,
    )
}

pub fn sheet(trigger: Trigger, script: Vec<Instruction>) -> Sheet {
    Sheet {
        conditions: Vec::new(),
        trigger,
        effect: false,
        script,
        graphic: None,
    }
}

pub fn count_up(name: &str) -> Instruction {
    Instruction::SetVariable {
        variable: VarRef::global(name),
        op: VarOp::Add,
        value: Operand::Number(1.0),
    }
}

#[derive(Debug, Clone)]
enum Value {
    Switch(bool),
    Variable(f64),
}

#[derive(Debug, Default)]
struct StoreData {
    names: Vec<(String, Value)>,
    money: i64,
    items: HashMap<ItemId, i64>,
    members: HashMap<CharacterId, Character>,
    templates: HashMap<CharacterId, MonsterTemplate>,
    stored: Vec<Character>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeStore {
    data: Rc<RefCell<StoreData>>,
    resolve_calls: Rc<Cell<usize>>,
}

impl FakeStore {
    pub fn with_switch(self, name: &str, value: bool) -> Self {
        self.data
            .borrow_mut()
            .names
            .push((name.to_string(), Value::Switch(value)));
        self
    }

    pub fn with_variable(self, name: &str, value: f64) -> Self {
        self.data
            .borrow_mut()
            .names
            .push((name.to_string(), Value::Variable(value)));
        self
    }

    pub fn with_money(self, money: i64) -> Self {
        self.data.borrow_mut().money = money;
        self
    }

    pub fn with_item(self, item: ItemId, count: i64) -> Self {
        self.data.borrow_mut().items.insert(item, count);
        self
    }

    pub fn with_member(self, member: Character) -> Self {
        self.data.borrow_mut().members.insert(member.id, member);
        self
    }

    pub fn with_template(self, id: CharacterId, name: &str, stats: Stats) -> Self {
        self.data.borrow_mut().templates.insert(
            id,
            MonsterTemplate {
                name: name.to_string(),
                stats,
            },
        );
        self
    }

    pub fn switch_named(&self, name: &str) -> Option<bool> {
        self.data
            .borrow()
            .names
            .iter()
            .find_map(|(candidate, value)| match value {
                Value::Switch(on) if candidate == name => Some(*on),
                _ => None,
            })
    }

    pub fn variable_named(&self, name: &str) -> Option<f64> {
        self.data
            .borrow()
            .names
            .iter()
            .find_map(|(candidate, value)| match value {
                Value::Variable(number) if candidate == name => Some(*number),
                _ => None,
            })
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.get()
    }

    pub fn stored_ids(&self) -> Vec<CharacterId> {
        self.data
            .borrow()
            .stored
            .iter()
            .map(|character| character.id)
            .collect()
    }
}

impl StateStore for FakeStore {
    fn resolve(&self, var: &VarRef) -> Option<VarSlot> {
        self.resolve_calls.set(self.resolve_calls.get() + 1);
        self.data
            .borrow()
            .names
            .iter()
            .position(|(name, _)| *name == var.name)
            .map(VarSlot)
    }

    fn switch(&self, slot: VarSlot) -> bool {
        matches!(
            self.data.borrow().names.get(slot.0),
            Some((_, Value::Switch(true)))
        )
    }

    fn set_switch(&mut self, slot: VarSlot, value: bool) {
        if let Some(entry) = self.data.borrow_mut().names.get_mut(slot.0) {
            entry.1 = Value::Switch(value);
        }
    }

    fn variable(&self, slot: VarSlot) -> f64 {
        match self.data.borrow().names.get(slot.0) {
            Some((_, Value::Variable(value))) => *value,
            _ => 0.0,
        }
    }

    fn set_variable(&mut self, slot: VarSlot, value: f64) {
        if let Some(entry) = self.data.borrow_mut().names.get_mut(slot.0) {
            entry.1 = Value::Variable(value);
        }
    }

    fn money(&self) -> i64 {
        self.data.borrow().money
    }

    fn item_count(&self, item: ItemId) -> i64 {
        self.data.borrow().items.get(&item).copied().unwrap_or(0)
    }

    fn is_party_member(&self, character: CharacterId) -> bool {
        self.data.borrow().members.contains_key(&character)
    }

    fn load_party_member(&self, character: CharacterId) -> Option<Character> {
        self.data.borrow().members.get(&character).cloned()
    }

    fn create_party_member(&self, character: CharacterId, level: u32) -> Option<Character> {
        let max_hp = 10 * i32::try_from(level).unwrap_or(1);
        Some(Character::player(
            character,
            "Recruit",
            Stats {
                max_hp,
                ..Stats::default()
            },
            level,
        ))
    }

    fn monster_template(&self, monster: CharacterId) -> Option<MonsterTemplate> {
        self.data.borrow().templates.get(&monster).cloned()
    }

    fn store_character(&mut self, character: &Character) {
        self.data.borrow_mut().stored.push(character.clone());
    }
}

#[derive(Debug, Default)]
struct VisualData {
    next_handle: u64,
    destroyed: Vec<ActorHandle>,
    states: Vec<(ActorHandle, ActorState)>,
    opacity: HashMap<ActorHandle, f32>,
    fading: bool,
    moving: HashSet<ActorHandle>,
    graphics: HashMap<ActorId, Option<Graphic>>,
    relayouts: Vec<Vec<(ActorHandle, (f32, f32))>>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeVisual {
    data: Rc<RefCell<VisualData>>,
}

impl FakeVisual {
    /// Allocates a handle as if the character had been spawned.
    pub fn spawn_handle(&self, _character: CharacterId) -> ActorHandle {
        let mut data = self.data.borrow_mut();
        data.next_handle += 1;
        ActorHandle(data.next_handle)
    }

    pub fn set_fading(&self, fading: bool) {
        self.data.borrow_mut().fading = fading;
    }

    pub fn set_moving(&self, handle: ActorHandle, moving: bool) {
        let mut data = self.data.borrow_mut();
        if moving {
            data.moving.insert(handle);
        } else {
            data.moving.remove(&handle);
        }
    }

    pub fn states_of(&self, state: ActorState) -> usize {
        self.data
            .borrow()
            .states
            .iter()
            .filter(|(_, queued)| *queued == state)
            .count()
    }

    pub fn destroyed(&self) -> Vec<ActorHandle> {
        self.data.borrow().destroyed.clone()
    }

    pub fn opacity_of(&self, handle: ActorHandle) -> Option<f32> {
        self.data.borrow().opacity.get(&handle).copied()
    }

    pub fn graphic_of(&self, actor: ActorId) -> Option<Option<Graphic>> {
        self.data.borrow().graphics.get(&actor).cloned()
    }

    pub fn last_relayout(&self) -> Option<Vec<(ActorHandle, (f32, f32))>> {
        self.data.borrow().relayouts.last().cloned()
    }
}

impl VisualLayer for FakeVisual {
    fn spawn(&mut self, character: &Character) -> ActorHandle {
        self.spawn_handle(character.id)
    }

    fn destroy(&mut self, handle: ActorHandle) {
        self.data.borrow_mut().destroyed.push(handle);
    }

    fn queue_state(&mut self, handle: ActorHandle, state: ActorState) {
        self.data.borrow_mut().states.push((handle, state));
    }

    fn set_opacity(&mut self, handle: ActorHandle, opacity: f32) {
        self.data.borrow_mut().opacity.insert(handle, opacity);
    }

    fn is_fading(&self) -> bool {
        self.data.borrow().fading
    }

    fn has_pending_moves(&self, handle: ActorHandle) -> bool {
        self.data.borrow().moving.contains(&handle)
    }

    fn set_graphic(&mut self, actor: ActorId, graphic: Option<&Graphic>) {
        self.data
            .borrow_mut()
            .graphics
            .insert(actor, graphic.cloned());
    }

    fn relayout(&mut self, placements: &[(ActorHandle, (f32, f32))]) {
        self.data.borrow_mut().relayouts.push(placements.to_vec());
    }
}

#[derive(Debug)]
struct TurnData {
    phase: BattlePhase,
    active: Option<CharacterId>,
    priority: Vec<(CharacterId, BattleCommand)>,
    animations: Vec<CharacterId>,
    recomputed: usize,
}

impl Default for TurnData {
    fn default() -> Self {
        Self {
            phase: BattlePhase::Action,
            active: None,
            priority: Vec::new(),
            animations: Vec::new(),
            recomputed: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeTurn {
    data: Rc<RefCell<TurnData>>,
}

impl FakeTurn {
    pub fn set_phase(&self, phase: BattlePhase) {
        self.data.borrow_mut().phase = phase;
    }

    pub fn set_active(&self, active: Option<CharacterId>) {
        self.data.borrow_mut().active = active;
    }

    pub fn priority(&self) -> Vec<(CharacterId, BattleCommand)> {
        self.data.borrow().priority.clone()
    }

    pub fn animations(&self) -> Vec<CharacterId> {
        self.data.borrow().animations.clone()
    }

    pub fn recomputed(&self) -> usize {
        self.data.borrow().recomputed
    }
}

impl TurnController for FakeTurn {
    fn phase(&self) -> BattlePhase {
        self.data.borrow().phase
    }

    fn active_character(&self) -> Option<CharacterId> {
        self.data.borrow().active
    }

    fn insert_priority_action(&mut self, character: CharacterId, command: &BattleCommand) {
        self.data
            .borrow_mut()
            .priority
            .push((character, command.clone()));
    }

    fn recompute_stats(&mut self, _character: &mut Character) {
        self.data.borrow_mut().recomputed += 1;
    }

    fn begin_animation(&mut self, character: CharacterId) {
        self.data.borrow_mut().animations.push(character);
    }
}

#[derive(Debug, Default)]
struct TweenData {
    remaining: u32,
    retargets: Vec<(CharacterId, StatKind, i32)>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeTweener {
    data: Rc<RefCell<TweenData>>,
}

impl FakeTweener {
    /// Bars keep animating for `frames` more ticks.
    pub fn animate_for(&self, frames: u32) {
        self.data.borrow_mut().remaining = frames;
    }

    pub fn retargets(&self) -> Vec<(CharacterId, StatKind, i32)> {
        self.data.borrow().retargets.clone()
    }
}

impl StatusTweener for FakeTweener {
    fn retarget(&mut self, character: CharacterId, stat: StatKind, value: i32) {
        self.data
            .borrow_mut()
            .retargets
            .push((character, stat, value));
    }

    fn tick(&mut self) -> bool {
        let mut data = self.data.borrow_mut();
        if data.remaining == 0 {
            return false;
        }
        data.remaining -= 1;
        true
    }
}

#[derive(Debug, Default)]
struct HostData {
    external: bool,
    shakes: Vec<(f32, u32)>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeHost {
    data: Rc<RefCell<HostData>>,
}

impl FakeHost {
    pub fn set_external(&self, external: bool) {
        self.data.borrow_mut().external = external;
    }

    pub fn shakes(&self) -> Vec<(f32, u32)> {
        self.data.borrow().shakes.clone()
    }
}

impl HostCapabilities for FakeHost {
    fn shake_camera(&mut self, strength: f32, frames: u32) {
        self.data.borrow_mut().shakes.push((strength, frames));
    }

    fn external_runner_active(&self) -> bool {
        self.data.borrow().external
    }
}

/// Shared handles to every fake; the boxed copies inside [`Collaborators`]
/// observe the same data.
#[derive(Debug, Clone, Default)]
pub struct Fakes {
    pub store: FakeStore,
    pub visual: FakeVisual,
    pub turn: FakeTurn,
    pub tweener: FakeTweener,
    pub host: FakeHost,
}

impl Fakes {
    pub fn new(store: FakeStore) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            store: Box::new(self.store.clone()),
            visual: Box::new(self.visual.clone()),
            turn: Box::new(self.turn.clone()),
            formula: Box::new(RhaiFormulaEvaluator::new()),
            tweener: Box::new(self.tweener.clone()),
            host: Box::new(self.host.clone()),
        }
    }
}
