use std::collections::HashMap;

use be_core::{
    BattlePhase, CharacterId, Condition, PhaseCondition, Sheet, Trigger, VarRef,
};
use tracing::debug;

use crate::ports::{StateStore, VarSlot};
use crate::roster::Roster;

/// Everything a condition may read.
pub struct ConditionContext<'a> {
    pub store: &'a dyn StateStore,
    pub roster: &'a Roster,
    pub phase: BattlePhase,
    pub active_character: Option<CharacterId>,
    pub current_trigger: Option<Trigger>,
    /// Participant bound to the actor whose conditions are checked.
    pub owner: Option<CharacterId>,
}

/// Page selection plus the lazy switch/variable name cache.
#[derive(Debug, Default)]
pub struct ConditionEvaluator {
    slots: HashMap<VarRef, VarSlot>,
}

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a name once; only successful lookups are cached.
    pub fn slot(&mut self, store: &dyn StateStore, var: &VarRef) -> Option<VarSlot> {
        if let Some(slot) = self.slots.get(var) {
            return Some(*slot);
        }
        let slot = store.resolve(var)?;
        self.slots.insert(var.clone(), slot);
        Some(slot)
    }

    pub fn cached_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn evaluate(&mut self, condition: &Condition, ctx: &ConditionContext<'_>) -> bool {
        match condition {
            Condition::Switch { switch, value } => match self.slot(ctx.store, switch) {
                Some(slot) => ctx.store.switch(slot) == *value,
                None => {
                    debug!(target: "battle::pages", switch = %switch.name, "unresolved switch");
                    false
                }
            },
            Condition::Variable {
                variable,
                op,
                value,
            } => match self.slot(ctx.store, variable) {
                Some(slot) => op.apply(ctx.store.variable(slot), *value),
                None => {
                    debug!(target: "battle::pages", variable = %variable.name, "unresolved variable");
                    false
                }
            },
            Condition::Money { op, value } => op.apply(ctx.store.money() as f64, *value as f64),
            Condition::Item { item, op, count } => {
                op.apply(ctx.store.item_count(*item) as f64, *count as f64)
            }
            Condition::BattlePhase { phase, subject } => {
                let phase_matches = match phase {
                    PhaseCondition::Coarse { phase } => ctx.phase.coarse() == *phase,
                    PhaseCondition::Trigger { trigger } => ctx.current_trigger == Some(*trigger),
                };
                if !phase_matches {
                    return false;
                }
                match subject {
                    None => true,
                    Some(selector) => {
                        let expected = ctx.roster.resolve(*selector, ctx.owner);
                        expected.is_some() && expected == ctx.active_character
                    }
                }
            }
            Condition::PartyMember { character, present } => {
                ctx.roster.party_index(*character).is_some() == *present
            }
            Condition::Hp {
                target,
                op,
                percent,
            } => ctx
                .roster
                .resolve(*target, ctx.owner)
                .and_then(|id| ctx.roster.character(id))
                .is_some_and(|character| op.apply(character.hp_percent(), *percent)),
        }
    }

    /// ANDs the conditions in order, stopping at the first failure.
    pub fn evaluate_all(&mut self, conditions: &[Condition], ctx: &ConditionContext<'_>) -> bool {
        conditions
            .iter()
            .all(|condition| self.evaluate(condition, ctx))
    }

    /// Index of the last sheet whose conditions all pass.
    pub fn select_page(&mut self, sheets: &[Sheet], ctx: &ConditionContext<'_>) -> Option<usize> {
        let mut selected = None;
        for (index, sheet) in sheets.iter().enumerate() {
            if self.evaluate_all(&sheet.conditions, ctx) {
                selected = Some(index);
            }
        }
        selected
    }
}
