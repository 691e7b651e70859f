use be_core::{
    ActionTiming, ActorId, BattleCommand, BattleConfig, BattlePhase, CharacterId, Condition,
    Operand, PendingCommand, Sheet, StatKind, TargetSelector, Trigger,
};
use tracing::{debug, warn};

use crate::action_queue::{TurnActionQueue, TurnEntry};
use crate::condition::{ConditionContext, ConditionEvaluator};
use crate::member_queue::MemberChangeQueue;
use crate::ports::{Collaborators, StateStore, StatusTweener, TurnController};
use crate::roster::Roster;

/// Battle-scoped data shared by the scheduler and the scripts it runs.
#[derive(Debug)]
pub struct BattleState {
    pub config: BattleConfig,
    pub roster: Roster,
    pub members: MemberChangeQueue,
    pub actions: TurnActionQueue,
    pub conditions: ConditionEvaluator,
    /// Last dispatched sub-phase trigger.
    pub current_trigger: Option<Trigger>,
}

impl BattleState {
    pub fn new(config: BattleConfig) -> Self {
        Self {
            config,
            roster: Roster::new(),
            members: MemberChangeQueue::new(),
            actions: TurnActionQueue::new(),
            conditions: ConditionEvaluator::new(),
            current_trigger: None,
        }
    }

    pub fn check(
        &mut self,
        conditions: &[Condition],
        ports: &Collaborators,
        owner: Option<CharacterId>,
    ) -> bool {
        let ctx = ConditionContext {
            store: ports.store.as_ref(),
            roster: &self.roster,
            phase: ports.turn.phase(),
            active_character: ports.turn.active_character(),
            current_trigger: self.current_trigger,
            owner,
        };
        self.conditions.evaluate_all(conditions, &ctx)
    }

    pub fn select_page(
        &mut self,
        sheets: &[Sheet],
        ports: &Collaborators,
        owner: Option<CharacterId>,
    ) -> Option<usize> {
        let ctx = ConditionContext {
            store: ports.store.as_ref(),
            roster: &self.roster,
            phase: ports.turn.phase(),
            active_character: ports.turn.active_character(),
            current_trigger: self.current_trigger,
            owner,
        };
        self.conditions.select_page(sheets, &ctx)
    }

    pub fn resolve_target(
        &self,
        selector: TargetSelector,
        owner: Option<CharacterId>,
    ) -> Option<CharacterId> {
        self.roster.resolve(selector, owner)
    }

    pub fn operand(&mut self, operand: &Operand, store: &dyn StateStore) -> Option<f64> {
        match operand {
            Operand::Number(value) => Some(*value),
            Operand::Variable { variable } => {
                let slot = self.conditions.slot(store, variable)?;
                Some(store.variable(slot))
            }
        }
    }

    /// Adds `delta` to a gauge, clamped, and retargets its status bar.
    pub fn change_stat(
        &mut self,
        target: CharacterId,
        stat: StatKind,
        delta: i32,
        tweener: &mut dyn StatusTweener,
    ) -> bool {
        let Some(character) = self.roster.character_mut(target) else {
            return false;
        };
        character.change_stat(stat, delta);
        tweener.retarget(target, stat, character.stat(stat));
        true
    }

    pub fn enqueue_for_next_turn(
        &mut self,
        target: CharacterId,
        command: PendingCommand,
        origin: Option<ActorId>,
    ) {
        debug!(target: "battle::actions", character = %target, kind = ?command.kind(), "buffered for next turn");
        self.actions.enqueue(TurnEntry {
            target,
            command,
            origin,
        });
    }

    /// Applies priority and overwrite timings on the spot. Returns false for
    /// next-turn timing or a target that has left the battle.
    pub fn resolve_immediate(
        &mut self,
        target: CharacterId,
        command: &BattleCommand,
        timing: ActionTiming,
        turn: &mut dyn TurnController,
    ) -> bool {
        match timing {
            ActionTiming::NextTurn => false,
            ActionTiming::Priority => {
                if self.roster.character(target).is_none() {
                    return false;
                }
                turn.insert_priority_action(target, command);
                true
            }
            ActionTiming::Overwrite => match self.roster.character_mut(target) {
                Some(character) => {
                    character.selected_command = Some(command.clone());
                    true
                }
                None => false,
            },
        }
    }

    /// Resolves the target and routes the command by timing code.
    pub fn set_next_action(
        &mut self,
        selector: TargetSelector,
        command: BattleCommand,
        timing: u32,
        owner: Option<CharacterId>,
        origin: Option<ActorId>,
        turn: &mut dyn TurnController,
    ) -> bool {
        let Some(target) = self.resolve_target(selector, owner) else {
            warn!(target: "battle::actions", ?selector, "next action target not found");
            return false;
        };
        match ActionTiming::from_code(timing) {
            ActionTiming::NextTurn => {
                self.enqueue_for_next_turn(target, PendingCommand::Action { command }, origin);
                true
            }
            timing => self.resolve_immediate(target, &command, timing, turn),
        }
    }

    /// Assigns every buffered action during the command-assignment window.
    pub fn flush_eligible(&mut self, phase: BattlePhase) -> usize {
        if !phase.allows_command_assignment() {
            return 0;
        }
        let mut applied = 0;
        for entry in self.actions.take_actions() {
            let PendingCommand::Action { command } = entry.command else {
                continue;
            };
            if let Some(character) = self.roster.character_mut(entry.target) {
                character.selected_command = Some(command);
                applied += 1;
            }
        }
        if applied > 0 {
            debug!(target: "battle::actions", applied, "buffered actions assigned");
        }
        applied
    }

    pub fn apply_buffered_statuses(&mut self, turn: &mut dyn TurnController) -> usize {
        let mut applied = 0;
        for entry in self.actions.take_statuses() {
            let PendingCommand::Status { status, add } = entry.command else {
                continue;
            };
            if let Some(character) = self.roster.character_mut(entry.target) {
                character.set_status(status, add);
                turn.recompute_stats(character);
                character.clamp();
                applied += 1;
            }
        }
        applied
    }
}
