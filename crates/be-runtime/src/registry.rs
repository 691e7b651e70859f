use std::collections::HashMap;

use be_core::{ActorId, BattlePhase, CharacterId, RunnerKey, Sheet, Trigger};
use tracing::debug;

use crate::ports::Collaborators;
use crate::runner::{RemovalMode, ScriptRunner, StepContext, StepOutcome};
use crate::state::BattleState;

/// Changes a running line asks of the registry, applied after its step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryRequest {
    SetExclusive {
        key: Option<RunnerKey>,
        invert: bool,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// A non-parallel runner is mid-script.
    pub processing: bool,
    pub finished: Vec<RunnerKey>,
    pub removed: Vec<RunnerKey>,
}

/// Keyed script runners stepped in registry order.
#[derive(Debug, Default)]
pub struct RunnerRegistry {
    order: Vec<RunnerKey>,
    runners: HashMap<RunnerKey, ScriptRunner>,
    exclusive: Option<RunnerKey>,
    invert: bool,
}

impl RunnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.runners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }

    pub fn keys(&self) -> &[RunnerKey] {
        &self.order
    }

    pub fn runner(&self, key: RunnerKey) -> Option<&ScriptRunner> {
        self.runners.get(&key)
    }

    pub fn exclusive(&self) -> Option<(RunnerKey, bool)> {
        self.exclusive.map(|key| (key, self.invert))
    }

    /// Installs a sheet's script under the actor's canonical key, moving a
    /// still-running occupant to a fresh key first.
    pub fn register(
        &mut self,
        actor: ActorId,
        owner: Option<CharacterId>,
        sheet: &Sheet,
    ) -> RunnerKey {
        let key = RunnerKey::for_actor(actor);
        if let Some(mut occupant) = self.runners.remove(&key) {
            if occupant.is_running() {
                if occupant.pending_removal().is_none() {
                    occupant.mark_for_removal();
                }
                let fresh = RunnerKey::new();
                if let Some(position) = self.order.iter().position(|entry| *entry == key) {
                    self.order[position] = fresh;
                }
                if self.exclusive == Some(key) {
                    self.exclusive = Some(fresh);
                }
                debug!(target: "battle::registry", %key, %fresh, "running occupant re-keyed");
                self.runners.insert(fresh, occupant);
            } else {
                occupant.mark_removed();
                self.order.retain(|entry| *entry != key);
            }
        }

        let mut runner = ScriptRunner::new(actor, owner, sheet);
        if sheet.trigger.is_auto_start() {
            runner.start();
        }
        debug!(target: "battle::registry", %key, trigger = ?sheet.trigger, started = runner.is_running(), "runner registered");
        self.runners.insert(key, runner);
        self.order.push(key);
        key
    }

    /// Removes an idle runner now, or defers removal of a running one.
    pub fn unregister(&mut self, key: RunnerKey) -> Option<RemovalMode> {
        let runner = self.runners.get_mut(&key)?;
        if runner.is_running() {
            let mode = runner.mark_for_removal();
            debug!(target: "battle::registry", %key, ?mode, "removal deferred");
            Some(mode)
        } else {
            self.remove(key);
            None
        }
    }

    pub fn set_exclusive(&mut self, key: Option<RunnerKey>, invert: bool) {
        self.exclusive = key;
        self.invert = key.is_some() && invert;
    }

    pub fn bring_to_front(&mut self, key: RunnerKey) {
        if let Some(position) = self.order.iter().position(|entry| *entry == key) {
            let key = self.order.remove(position);
            self.order.insert(0, key);
        }
    }

    /// Restarts a runner unless it is being removed.
    pub fn start(&mut self, key: RunnerKey) -> bool {
        match self.runners.get_mut(&key) {
            Some(runner) if runner.pending_removal().is_none() => {
                runner.start();
                true
            }
            _ => false,
        }
    }

    pub fn keys_with_trigger(&self, trigger: Trigger) -> Vec<RunnerKey> {
        self.order
            .iter()
            .copied()
            .filter(|key| {
                self.runners
                    .get(key)
                    .is_some_and(|runner| runner.trigger() == trigger)
            })
            .collect()
    }

    pub fn any_running_with_trigger(&self, trigger: Trigger) -> bool {
        self.runners
            .values()
            .any(|runner| runner.is_running() && runner.trigger() == trigger)
    }

    /// Non-parallel runners always count; effect runners only during the
    /// result phase.
    pub fn is_busy(&self, phase: BattlePhase) -> bool {
        self.runners.values().any(|runner| {
            runner.is_running()
                && (!runner.is_parallel() || (phase == BattlePhase::Result && runner.is_effect()))
        })
    }

    pub fn step_all(&mut self, state: &mut BattleState, ports: &mut Collaborators) -> StepReport {
        let snapshot = self.order.clone();
        let mut report = StepReport::default();
        let mut requests = Vec::new();

        for key in &snapshot {
            if !self.allows(*key) {
                continue;
            }
            let Some(runner) = self.runners.get_mut(key) else {
                continue;
            };
            if runner.is_parallel() || !runner.is_running() {
                continue;
            }
            let mut ctx = StepContext {
                state: &mut *state,
                ports: &mut *ports,
                requests: &mut requests,
            };
            let outcome = runner.step(*key, &mut ctx);
            self.after_step(*key, outcome, &mut report);
            self.apply_requests(&mut requests);
            if outcome == StepOutcome::Running {
                report.processing = true;
            }
            break;
        }

        for key in &snapshot {
            let Some(runner) = self.runners.get_mut(key) else {
                continue;
            };
            if !runner.is_parallel() || !runner.is_running() {
                continue;
            }
            let mut ctx = StepContext {
                state: &mut *state,
                ports: &mut *ports,
                requests: &mut requests,
            };
            let outcome = runner.step(*key, &mut ctx);
            self.after_step(*key, outcome, &mut report);
            self.apply_requests(&mut requests);
        }

        report
    }

    fn allows(&self, key: RunnerKey) -> bool {
        match self.exclusive {
            None => true,
            Some(exclusive) if self.invert => key != exclusive,
            Some(exclusive) => key == exclusive,
        }
    }

    fn after_step(&mut self, key: RunnerKey, outcome: StepOutcome, report: &mut StepReport) {
        let Some(runner) = self.runners.get_mut(&key) else {
            return;
        };
        if outcome == StepOutcome::Finished {
            report.finished.push(key);
        }
        let discard = match runner.pending_removal() {
            Some(RemovalMode::OnExit) => outcome == StepOutcome::Finished,
            Some(RemovalMode::OnCompleteCurrentLine) => {
                outcome == StepOutcome::Finished || runner.at_line_boundary()
            }
            None => false,
        };
        if discard {
            self.remove(key);
            report.removed.push(key);
        } else if outcome == StepOutcome::Finished && runner.trigger() == Trigger::Parallel {
            runner.start();
        }
    }

    fn apply_requests(&mut self, requests: &mut Vec<RegistryRequest>) {
        for request in requests.drain(..) {
            match request {
                RegistryRequest::SetExclusive { key, invert } => {
                    debug!(target: "battle::registry", ?key, invert, "exclusivity changed");
                    self.set_exclusive(key, invert);
                }
            }
        }
    }

    fn remove(&mut self, key: RunnerKey) {
        if let Some(mut runner) = self.runners.remove(&key) {
            runner.mark_removed();
            debug!(target: "battle::registry", %key, "runner removed");
        }
        self.order.retain(|entry| *entry != key);
        if self.exclusive == Some(key) {
            self.set_exclusive(None, false);
        }
    }
}
