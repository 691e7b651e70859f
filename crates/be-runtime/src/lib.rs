mod action_queue;
mod condition;
mod formula;
mod instructions;
mod member_queue;
mod ports;
mod registry;
mod roster;
mod runner;
mod scheduler;
mod state;

#[cfg(test)]
mod test_support;

pub use action_queue::{TurnActionQueue, TurnEntry};
pub use condition::{ConditionContext, ConditionEvaluator};
pub use formula::RhaiFormulaEvaluator;
pub use member_queue::{DrainOutcome, MemberChangeQueue};
pub use ports::{
    ActorHandle, ActorState, Collaborators, FormulaEvaluator, HostCapabilities, MonsterTemplate,
    StateStore, StatusTweener, TurnController, VarSlot, VisualLayer,
};
pub use registry::{RegistryRequest, RunnerRegistry, StepReport};
pub use roster::{Roster, VisibleEntry};
pub use runner::{RemovalMode, RunnerState, ScriptRunner, StepContext, StepOutcome, Wait};
pub use scheduler::{BattleCoreOptions, BattleEventCore, EventActor};
pub use state::BattleState;
