use be_core::{
    ActorId, CharacterId, Instruction, PendingCommand, RunnerKey, StatKind, TargetSelector,
};
use tracing::{debug, warn};

use crate::registry::RegistryRequest;
use crate::runner::{StepContext, Wait};

/// Runner-side identity of the line being executed.
pub(crate) struct LineOrigin {
    pub key: RunnerKey,
    pub actor: ActorId,
    pub owner: Option<CharacterId>,
}

pub(crate) enum LineOutcome<'l> {
    Next,
    Suspend(Wait),
    /// Run a nested block before the next line.
    Enter(&'l [Instruction]),
    Exit,
}

pub(crate) fn execute_line<'l>(
    line: &'l Instruction,
    origin: &LineOrigin,
    ctx: &mut StepContext<'_>,
) -> LineOutcome<'l> {
    match line {
        Instruction::Wait { frames } => match *frames {
            0 | 1 => LineOutcome::Next,
            frames => LineOutcome::Suspend(Wait::Frames(frames - 1)),
        },
        Instruction::WaitMembers => {
            if ctx.state.members.is_empty() {
                LineOutcome::Next
            } else {
                LineOutcome::Suspend(Wait::Members)
            }
        }
        Instruction::SetSwitch { switch, value } => {
            match ctx.state.conditions.slot(ctx.ports.store.as_ref(), switch) {
                Some(slot) => ctx.ports.store.set_switch(slot, *value),
                None => warn!(target: "battle::registry", switch = %switch.name, "unknown switch"),
            }
            LineOutcome::Next
        }
        Instruction::SetVariable {
            variable,
            op,
            value,
        } => {
            let store = ctx.ports.store.as_ref();
            let slot = ctx.state.conditions.slot(store, variable);
            let operand = ctx.state.operand(value, store);
            match (slot, operand) {
                (Some(slot), Some(operand)) => {
                    let next = op.apply(ctx.ports.store.variable(slot), operand);
                    ctx.ports.store.set_variable(slot, next);
                }
                _ => warn!(target: "battle::registry", variable = %variable.name, "unresolved variable assignment"),
            }
            LineOutcome::Next
        }
        Instruction::ChangeStat {
            target,
            stat,
            amount,
        } => {
            let target_id = ctx.state.resolve_target(*target, origin.owner);
            let amount = ctx.state.operand(amount, ctx.ports.store.as_ref());
            match (target_id, amount) {
                (Some(target_id), Some(amount)) => {
                    ctx.state.change_stat(
                        target_id,
                        *stat,
                        amount.round() as i32,
                        ctx.ports.tweener.as_mut(),
                    );
                }
                _ => debug!(target: "battle::registry", ?target, "stat change skipped"),
            }
            LineOutcome::Next
        }
        Instruction::ApplyFormula {
            source,
            target,
            formula,
            stat,
        } => {
            apply_formula(ctx, origin, *source, *target, formula, *stat);
            LineOutcome::Next
        }
        Instruction::ChangeStatus {
            target,
            status,
            add,
        } => {
            let Some(target_id) = ctx.state.resolve_target(*target, origin.owner) else {
                debug!(target: "battle::registry", ?target, "status target not found");
                return LineOutcome::Next;
            };
            if let Some(character) = ctx.state.roster.character_mut(target_id) {
                character.set_status(*status, *add);
                ctx.ports.turn.recompute_stats(character);
                character.clamp();
            }
            LineOutcome::Next
        }
        Instruction::DeferStatus {
            target,
            status,
            add,
        } => {
            match ctx.state.resolve_target(*target, origin.owner) {
                Some(target_id) => ctx.state.enqueue_for_next_turn(
                    target_id,
                    PendingCommand::Status {
                        status: *status,
                        add: *add,
                    },
                    Some(origin.actor),
                ),
                None => debug!(target: "battle::registry", ?target, "deferred status target not found"),
            }
            LineOutcome::Next
        }
        Instruction::MemberChange { change } => {
            ctx.state.members.enqueue(change.clone());
            LineOutcome::Next
        }
        Instruction::SetNextAction {
            target,
            command,
            timing,
        } => {
            ctx.state.set_next_action(
                *target,
                command.clone(),
                *timing,
                origin.owner,
                Some(origin.actor),
                ctx.ports.turn.as_mut(),
            );
            LineOutcome::Next
        }
        Instruction::ShakeCamera { strength, frames } => {
            ctx.ports.host.shake_camera(*strength, *frames);
            LineOutcome::Next
        }
        Instruction::ChangeGraphic { graphic } => {
            ctx.ports.visual.set_graphic(origin.actor, Some(graphic));
            LineOutcome::Next
        }
        Instruction::Exclusive { enabled, invert } => {
            ctx.requests.push(RegistryRequest::SetExclusive {
                key: enabled.then_some(origin.key),
                invert: *invert,
            });
            LineOutcome::Next
        }
        Instruction::Branch {
            conditions,
            then,
            otherwise,
        } => {
            if ctx.state.check(conditions, ctx.ports, origin.owner) {
                LineOutcome::Enter(then)
            } else {
                LineOutcome::Enter(otherwise)
            }
        }
        Instruction::Exit => LineOutcome::Exit,
    }
}

fn apply_formula(
    ctx: &mut StepContext<'_>,
    origin: &LineOrigin,
    source: Option<TargetSelector>,
    target: TargetSelector,
    formula: &str,
    stat: StatKind,
) {
    let Some(target_id) = ctx.state.resolve_target(target, origin.owner) else {
        debug!(target: "battle::registry", ?target, "formula target not found");
        return;
    };
    let source_id = match source {
        Some(selector) => match ctx.state.resolve_target(selector, origin.owner) {
            Some(id) => Some(id),
            None => {
                debug!(target: "battle::registry", ?selector, "formula source not found");
                return;
            }
        },
        None => None,
    };

    let roster = &ctx.state.roster;
    let Some(target_character) = roster.character(target_id) else {
        return;
    };
    let source_character = source_id.and_then(|id| roster.character(id));
    let result = ctx
        .ports
        .formula
        .evaluate(formula, source_character, target_character, stat);

    match result {
        Ok(value) => {
            let delta = (-value).round().clamp(i32::MIN as f64, i32::MAX as f64) as i32;
            ctx.state
                .change_stat(target_id, stat, delta, ctx.ports.tweener.as_mut());
        }
        Err(error) => warn!(target: "battle::registry", %error, "formula skipped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Collaborators;
    use crate::state::BattleState;
    use crate::test_support::{hero, FakeStore, Fakes};
    use be_core::{BattleConfig, Graphic, Operand, StatusId, VarOp, VarRef};

    struct Harness {
        fakes: Fakes,
        state: BattleState,
        ports: Collaborators,
        requests: Vec<RegistryRequest>,
        origin: LineOrigin,
    }

    impl Harness {
        fn new(store: FakeStore) -> Self {
            let fakes = Fakes::new(store);
            let ports = fakes.collaborators();
            let mut state = BattleState::new(BattleConfig::default());
            let member = hero("Hero", 40);
            let owner = member.id;
            let handle = fakes.visual.spawn_handle(owner);
            state.roster.push_party(member, handle, 1.0);
            Self {
                fakes,
                state,
                ports,
                requests: Vec::new(),
                origin: LineOrigin {
                    key: RunnerKey::new(),
                    actor: ActorId::new(),
                    owner: Some(owner),
                },
            }
        }

        fn run(&mut self, line: &Instruction) {
            let mut ctx = StepContext {
                state: &mut self.state,
                ports: &mut self.ports,
                requests: &mut self.requests,
            };
            let _ = execute_line(line, &self.origin, &mut ctx);
        }

        fn owner_hp(&self) -> i32 {
            self.state.roster.party()[0].hp
        }
    }

    #[test]
    fn variable_operands_read_from_store() {
        let mut harness = Harness::new(
            FakeStore::default()
                .with_variable("damage", 15.0)
                .with_variable("total", 2.0),
        );
        harness.run(&Instruction::ChangeStat {
            target: TargetSelector::Owner,
            stat: StatKind::Hp,
            amount: Operand::Variable {
                variable: VarRef::global("damage"),
            },
        });
        assert_eq!(harness.owner_hp(), 40);

        harness.run(&Instruction::ChangeStat {
            target: TargetSelector::Owner,
            stat: StatKind::Hp,
            amount: Operand::Number(-15.0),
        });
        assert_eq!(harness.owner_hp(), 25);

        harness.run(&Instruction::SetVariable {
            variable: VarRef::global("total"),
            op: VarOp::Mul,
            value: Operand::Variable {
                variable: VarRef::global("damage"),
            },
        });
        assert_eq!(harness.fakes.store.variable_named("total"), Some(30.0));
    }

    #[test]
    fn formula_damage_is_subtracted_and_failures_are_skipped() {
        let mut harness = Harness::new(FakeStore::default());
        harness.run(&Instruction::ApplyFormula {
            source: None,
            target: TargetSelector::Owner,
            formula: "b.max_hp / 4".to_string(),
            stat: StatKind::Hp,
        });
        assert_eq!(harness.owner_hp(), 30);

        harness.run(&Instruction::ApplyFormula {
            source: None,
            target: TargetSelector::Owner,
            formula: "-5".to_string(),
            stat: StatKind::Hp,
        });
        assert_eq!(harness.owner_hp(), 35);

        harness.run(&Instruction::ApplyFormula {
            source: None,
            target: TargetSelector::Owner,
            formula: "b.max_hp +".to_string(),
            stat: StatKind::Hp,
        });
        assert_eq!(harness.owner_hp(), 35);
    }

    #[test]
    fn out_of_range_formula_results_saturate() {
        let mut harness = Harness::new(FakeStore::default());
        harness.run(&Instruction::ApplyFormula {
            source: None,
            target: TargetSelector::Owner,
            formula: "10".to_string(),
            stat: StatKind::Hp,
        });
        assert_eq!(harness.owner_hp(), 30);

        harness.run(&Instruction::ApplyFormula {
            source: None,
            target: TargetSelector::Owner,
            formula: "-1.0e10".to_string(),
            stat: StatKind::Hp,
        });
        assert_eq!(harness.owner_hp(), 40);

        harness.run(&Instruction::ApplyFormula {
            source: None,
            target: TargetSelector::Owner,
            formula: "1.0e10".to_string(),
            stat: StatKind::Hp,
        });
        assert_eq!(harness.owner_hp(), 0);
    }

    #[test]
    fn status_changes_recompute_stats() {
        let mut harness = Harness::new(FakeStore::default());
        let poison = StatusId::new();
        harness.run(&Instruction::ChangeStatus {
            target: TargetSelector::PartySlot { slot: 1 },
            status: poison,
            add: true,
        });
        assert!(harness.state.roster.party()[0].has_status(poison));
        assert_eq!(harness.fakes.turn.recomputed(), 1);

        harness.run(&Instruction::DeferStatus {
            target: TargetSelector::Owner,
            status: poison,
            add: false,
        });
        assert_eq!(harness.state.actions.len(), 1);
        assert!(harness.state.roster.party()[0].has_status(poison));
    }

    #[test]
    fn exclusive_requests_carry_runner_key() {
        let mut harness = Harness::new(FakeStore::default());
        harness.run(&Instruction::Exclusive {
            enabled: true,
            invert: true,
        });
        harness.run(&Instruction::Exclusive {
            enabled: false,
            invert: false,
        });
        assert_eq!(
            harness.requests,
            vec![
                RegistryRequest::SetExclusive {
                    key: Some(harness.origin.key),
                    invert: true,
                },
                RegistryRequest::SetExclusive {
                    key: None,
                    invert: false,
                },
            ]
        );
    }

    #[test]
    fn host_and_visual_passthroughs() {
        let mut harness = Harness::new(FakeStore::default());
        harness.run(&Instruction::ShakeCamera {
            strength: 2.5,
            frames: 12,
        });
        let graphic = Graphic {
            graphic: "boss_angry".to_string(),
            motion: None,
            facing: None,
        };
        harness.run(&Instruction::ChangeGraphic {
            graphic: graphic.clone(),
        });
        assert_eq!(harness.fakes.host.shakes(), vec![(2.5, 12)]);
        assert_eq!(
            harness.fakes.visual.graphic_of(harness.origin.actor),
            Some(Some(graphic))
        );
    }

    #[test]
    fn unknown_switch_is_noop() {
        let mut harness = Harness::new(FakeStore::default());
        harness.run(&Instruction::SetSwitch {
            switch: VarRef::global("missing"),
            value: true,
        });
        assert_eq!(harness.fakes.store.switch_named("missing"), None);
    }
}
