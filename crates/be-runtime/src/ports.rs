use be_core::{
    BattleCommand, BattleEventError, BattlePhase, Character, CharacterId, ItemId, StatKind,
    Stats, VarRef,
};
use be_core::{ActorId, Graphic};

/// Handle returned by the store when a switch/variable name resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarSlot(pub usize);

/// Handle of a spawned visual actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorHandle(pub u64);

/// Queued visual actor-state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    Appear,
    Wait,
    FadeOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonsterTemplate {
    pub name: String,
    pub stats: Stats,
}

/// Persistent game data: switches, variables, inventory and the party.
pub trait StateStore {
    /// Name lookup. Callers cache successful results.
    fn resolve(&self, var: &VarRef) -> Option<VarSlot>;
    fn switch(&self, slot: VarSlot) -> bool;
    fn set_switch(&mut self, slot: VarSlot, value: bool);
    fn variable(&self, slot: VarSlot) -> f64;
    fn set_variable(&mut self, slot: VarSlot, value: f64);
    fn money(&self) -> i64;
    fn item_count(&self, item: ItemId) -> i64;
    fn is_party_member(&self, character: CharacterId) -> bool;
    /// A member of the persistent party with their saved state.
    fn load_party_member(&self, character: CharacterId) -> Option<Character>;
    /// A brand new member built from class data at `level`.
    fn create_party_member(&self, character: CharacterId, level: u32) -> Option<Character>;
    fn monster_template(&self, monster: CharacterId) -> Option<MonsterTemplate>;
    /// Writes a leaving member's final state back to persistent data.
    fn store_character(&mut self, character: &Character);
}

/// Fire-and-forget visual commands plus polled readiness queries.
pub trait VisualLayer {
    fn spawn(&mut self, character: &Character) -> ActorHandle;
    /// Releases the actor once its queued states have played.
    fn destroy(&mut self, handle: ActorHandle);
    fn queue_state(&mut self, handle: ActorHandle, state: ActorState);
    fn set_opacity(&mut self, handle: ActorHandle, opacity: f32);
    fn is_fading(&self) -> bool;
    fn has_pending_moves(&self, handle: ActorHandle) -> bool;
    fn set_graphic(&mut self, actor: ActorId, graphic: Option<&Graphic>);
    fn relayout(&mut self, placements: &[(ActorHandle, (f32, f32))]);
}

/// The outer turn state machine.
pub trait TurnController {
    fn phase(&self) -> BattlePhase;
    fn active_character(&self) -> Option<CharacterId>;
    fn insert_priority_action(&mut self, character: CharacterId, command: &BattleCommand);
    fn recompute_stats(&mut self, character: &mut Character);
    fn begin_animation(&mut self, character: CharacterId);
}

pub trait FormulaEvaluator {
    fn evaluate(
        &self,
        formula: &str,
        source: Option<&Character>,
        target: &Character,
        attribute: StatKind,
    ) -> Result<f64, BattleEventError>;
}

/// Status-bar animation driver.
pub trait StatusTweener {
    fn retarget(&mut self, character: CharacterId, stat: StatKind, value: i32);
    /// Advances every bar one frame; true while any is still moving.
    fn tick(&mut self) -> bool;
}

/// Host-specific behavior that differs between battle hosts.
pub trait HostCapabilities {
    fn shake_camera(&mut self, strength: f32, frames: u32);
    /// Whether a runner borrowed from outside the battle is executing.
    fn external_runner_active(&self) -> bool;
}

pub struct Collaborators {
    pub store: Box<dyn StateStore>,
    pub visual: Box<dyn VisualLayer>,
    pub turn: Box<dyn TurnController>,
    pub formula: Box<dyn FormulaEvaluator>,
    pub tweener: Box<dyn StatusTweener>,
    pub host: Box<dyn HostCapabilities>,
}
