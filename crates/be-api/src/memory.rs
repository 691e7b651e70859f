use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use be_core::{
    ActorId, BattleCommand, BattlePhase, Character, CharacterId, Graphic, ItemId, StatKind, Stats,
    VarRef,
};
use be_runtime::{
    ActorHandle, ActorState, HostCapabilities, MonsterTemplate, StateStore, StatusTweener,
    TurnController, VarSlot, VisualLayer,
};

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    scope: Option<ActorId>,
    switch: bool,
    variable: f64,
}

#[derive(Debug, Clone)]
struct Recruit {
    name: String,
    stats: Stats,
}

#[derive(Debug, Default)]
struct StoreData {
    slots: Vec<Slot>,
    money: i64,
    items: HashMap<ItemId, i64>,
    members: HashMap<CharacterId, Character>,
    recruits: HashMap<CharacterId, Recruit>,
    templates: HashMap<CharacterId, MonsterTemplate>,
    stored: Vec<CharacterId>,
}

impl StoreData {
    fn position(&self, name: &str, scope: Option<ActorId>) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.name == name && slot.scope == scope)
    }

    fn slot_mut(&mut self, name: &str) -> &mut Slot {
        let index = match self.position(name, None) {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    name: name.to_string(),
                    scope: None,
                    switch: false,
                    variable: 0.0,
                });
                self.slots.len() - 1
            }
        };
        &mut self.slots[index]
    }
}

/// In-memory game data. Clones share the same storage.
///
/// Global names resolve only once declared; actor-scoped names are created
/// on first lookup, switched off and zeroed.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    data: Rc<RefCell<StoreData>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_switch(&self, name: &str, value: bool) {
        self.data.borrow_mut().slot_mut(name).switch = value;
    }

    pub fn put_variable(&self, name: &str, value: f64) {
        self.data.borrow_mut().slot_mut(name).variable = value;
    }

    pub fn set_money(&self, money: i64) {
        self.data.borrow_mut().money = money;
    }

    pub fn set_item_count(&self, item: ItemId, count: i64) {
        self.data.borrow_mut().items.insert(item, count);
    }

    pub fn insert_member(&self, member: Character) {
        self.data.borrow_mut().members.insert(member.id, member);
    }

    pub fn insert_recruit(&self, id: CharacterId, name: impl Into<String>, stats: Stats) {
        self.data.borrow_mut().recruits.insert(
            id,
            Recruit {
                name: name.into(),
                stats,
            },
        );
    }

    pub fn insert_template(&self, id: CharacterId, template: MonsterTemplate) {
        self.data.borrow_mut().templates.insert(id, template);
    }

    pub fn switch_named(&self, name: &str) -> Option<bool> {
        let data = self.data.borrow();
        data.position(name, None).map(|index| data.slots[index].switch)
    }

    pub fn variable_named(&self, name: &str) -> Option<f64> {
        let data = self.data.borrow();
        data.position(name, None)
            .map(|index| data.slots[index].variable)
    }

    pub fn scoped_switch(&self, name: &str, scope: ActorId) -> Option<bool> {
        let data = self.data.borrow();
        data.position(name, Some(scope))
            .map(|index| data.slots[index].switch)
    }

    pub fn member(&self, id: CharacterId) -> Option<Character> {
        self.data.borrow().members.get(&id).cloned()
    }

    /// Members written back when they left the battle, oldest first.
    pub fn stored_ids(&self) -> Vec<CharacterId> {
        self.data.borrow().stored.clone()
    }
}

impl StateStore for MemoryStateStore {
    fn resolve(&self, var: &VarRef) -> Option<VarSlot> {
        let mut data = self.data.borrow_mut();
        if let Some(index) = data.position(&var.name, var.scope) {
            return Some(VarSlot(index));
        }
        if var.scope.is_none() {
            return None;
        }
        data.slots.push(Slot {
            name: var.name.clone(),
            scope: var.scope,
            switch: false,
            variable: 0.0,
        });
        Some(VarSlot(data.slots.len() - 1))
    }

    fn switch(&self, slot: VarSlot) -> bool {
        self.data
            .borrow()
            .slots
            .get(slot.0)
            .is_some_and(|slot| slot.switch)
    }

    fn set_switch(&mut self, slot: VarSlot, value: bool) {
        if let Some(slot) = self.data.borrow_mut().slots.get_mut(slot.0) {
            slot.switch = value;
        }
    }

    fn variable(&self, slot: VarSlot) -> f64 {
        self.data
            .borrow()
            .slots
            .get(slot.0)
            .map_or(0.0, |slot| slot.variable)
    }

    fn set_variable(&mut self, slot: VarSlot, value: f64) {
        if let Some(slot) = self.data.borrow_mut().slots.get_mut(slot.0) {
            slot.variable = value;
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
        self.member(character)
    }

    fn create_party_member(&self, character: CharacterId, level: u32) -> Option<Character> {
        let data = self.data.borrow();
        let recruit = data.recruits.get(&character)?;
        Some(Character::player(
            character,
            recruit.name.clone(),
            recruit.stats.clone(),
            level,
        ))
    }

    fn monster_template(&self, monster: CharacterId) -> Option<MonsterTemplate> {
        self.data.borrow().templates.get(&monster).cloned()
    }

    fn store_character(&mut self, character: &Character) {
        let mut data = self.data.borrow_mut();
        let mut saved = character.clone();
        saved.selected_command = None;
        saved.targets.clear();
        data.members.insert(saved.id, saved);
        data.stored.push(character.id);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VisualEvent {
    Spawned {
        handle: ActorHandle,
        character: CharacterId,
    },
    Destroyed {
        handle: ActorHandle,
    },
    State {
        handle: ActorHandle,
        state: ActorState,
    },
    Graphic {
        actor: ActorId,
        graphic: Option<String>,
    },
    Relayout {
        placements: Vec<(ActorHandle, (f32, f32))>,
    },
}

#[derive(Debug, Default)]
struct VisualData {
    next_handle: u64,
    events: Vec<VisualEvent>,
    live: HashMap<ActorHandle, CharacterId>,
    opacity: HashMap<ActorHandle, f32>,
    graphics: HashMap<ActorId, Option<Graphic>>,
    fading: bool,
    moving: HashSet<ActorHandle>,
}

/// Visual layer that records every command and answers readiness queries
/// from flags the host toggles.
#[derive(Debug, Clone, Default)]
pub struct RecordingVisualLayer {
    data: Rc<RefCell<VisualData>>,
}

impl RecordingVisualLayer {
    pub fn new() -> Self {
        Self::default()
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

    pub fn events(&self) -> Vec<VisualEvent> {
        self.data.borrow().events.clone()
    }

    pub fn handle_of(&self, character: CharacterId) -> Option<ActorHandle> {
        self.data
            .borrow()
            .live
            .iter()
            .find_map(|(handle, owner)| (*owner == character).then_some(*handle))
    }

    pub fn live_count(&self) -> usize {
        self.data.borrow().live.len()
    }

    pub fn opacity_of(&self, handle: ActorHandle) -> Option<f32> {
        self.data.borrow().opacity.get(&handle).copied()
    }

    pub fn graphic_of(&self, actor: ActorId) -> Option<Graphic> {
        self.data.borrow().graphics.get(&actor).cloned().flatten()
    }
}

impl VisualLayer for RecordingVisualLayer {
    fn spawn(&mut self, character: &Character) -> ActorHandle {
        let mut data = self.data.borrow_mut();
        data.next_handle += 1;
        let handle = ActorHandle(data.next_handle);
        data.live.insert(handle, character.id);
        data.events.push(VisualEvent::Spawned {
            handle,
            character: character.id,
        });
        handle
    }

    fn destroy(&mut self, handle: ActorHandle) {
        let mut data = self.data.borrow_mut();
        data.live.remove(&handle);
        data.opacity.remove(&handle);
        data.moving.remove(&handle);
        data.events.push(VisualEvent::Destroyed { handle });
    }

    fn queue_state(&mut self, handle: ActorHandle, state: ActorState) {
        self.data
            .borrow_mut()
            .events
            .push(VisualEvent::State { handle, state });
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
        let mut data = self.data.borrow_mut();
        data.events.push(VisualEvent::Graphic {
            actor,
            graphic: graphic.map(|graphic| graphic.graphic.clone()),
        });
        data.graphics.insert(actor, graphic.cloned());
    }

    fn relayout(&mut self, placements: &[(ActorHandle, (f32, f32))]) {
        self.data.borrow_mut().events.push(VisualEvent::Relayout {
            placements: placements.to_vec(),
        });
    }
}

#[derive(Debug)]
struct TurnData {
    phase: BattlePhase,
    active: Option<CharacterId>,
    priority: Vec<(CharacterId, BattleCommand)>,
    animations: Vec<CharacterId>,
}

/// Turn controller whose phase and active character are set by the host.
#[derive(Debug, Clone)]
pub struct ScriptedTurnController {
    data: Rc<RefCell<TurnData>>,
}

impl Default for ScriptedTurnController {
    fn default() -> Self {
        Self {
            data: Rc::new(RefCell::new(TurnData {
                phase: BattlePhase::Start,
                active: None,
                priority: Vec::new(),
                animations: Vec::new(),
            })),
        }
    }
}

impl ScriptedTurnController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_phase(&self, phase: BattlePhase) {
        self.data.borrow_mut().phase = phase;
    }

    pub fn set_active(&self, character: Option<CharacterId>) {
        self.data.borrow_mut().active = character;
    }

    pub fn priority_actions(&self) -> Vec<(CharacterId, BattleCommand)> {
        self.data.borrow().priority.clone()
    }

    pub fn animations(&self) -> Vec<CharacterId> {
        self.data.borrow().animations.clone()
    }
}

impl TurnController for ScriptedTurnController {
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

    fn recompute_stats(&mut self, character: &mut Character) {
        character.clamp();
    }

    fn begin_animation(&mut self, character: CharacterId) {
        self.data.borrow_mut().animations.push(character);
    }
}

pub const DEFAULT_BAR_FRAMES: u32 = 8;

#[derive(Debug, Default)]
struct TweenData {
    frames: u32,
    bars: HashMap<(CharacterId, StatKind), (i32, u32)>,
}

/// Status bars that take a fixed number of frames to reach a new value.
#[derive(Debug, Clone)]
pub struct FrameTweener {
    data: Rc<RefCell<TweenData>>,
}

impl Default for FrameTweener {
    fn default() -> Self {
        Self::new(DEFAULT_BAR_FRAMES)
    }
}

impl FrameTweener {
    pub fn new(frames: u32) -> Self {
        Self {
            data: Rc::new(RefCell::new(TweenData {
                frames,
                bars: HashMap::new(),
            })),
        }
    }

    pub fn target_of(&self, character: CharacterId, stat: StatKind) -> Option<i32> {
        self.data
            .borrow()
            .bars
            .get(&(character, stat))
            .map(|(value, _)| *value)
    }

    pub fn is_animating(&self) -> bool {
        self.data
            .borrow()
            .bars
            .values()
            .any(|(_, remaining)| *remaining > 0)
    }
}

impl StatusTweener for FrameTweener {
    fn retarget(&mut self, character: CharacterId, stat: StatKind, value: i32) {
        let mut data = self.data.borrow_mut();
        let frames = data.frames;
        data.bars.insert((character, stat), (value, frames));
    }

    fn tick(&mut self) -> bool {
        let mut data = self.data.borrow_mut();
        let mut moving = false;
        for (_, remaining) in data.bars.values_mut() {
            *remaining = remaining.saturating_sub(1);
            moving |= *remaining > 0;
        }
        moving
    }
}

#[derive(Debug, Default)]
struct HostData {
    shakes: Vec<(f32, u32)>,
    external_runner: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    data: Rc<RefCell<HostData>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_external_runner(&self, active: bool) {
        self.data.borrow_mut().external_runner = active;
    }

    pub fn shakes(&self) -> Vec<(f32, u32)> {
        self.data.borrow().shakes.clone()
    }
}

impl HostCapabilities for RecordingHost {
    fn shake_camera(&mut self, strength: f32, frames: u32) {
        self.data.borrow_mut().shakes.push((strength, frames));
    }

    fn external_runner_active(&self) -> bool {
        self.data.borrow().external_runner
    }
}
