use std::rc::Rc;

use be_core::{ActorId, CharacterId, Instruction, RunnerKey, Sheet, Trigger};

use crate::instructions::{execute_line, LineOrigin, LineOutcome};
use crate::ports::Collaborators;
use crate::registry::RegistryRequest;
use crate::state::BattleState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running,
    Finished,
    Removed,
}

/// How a running runner asked to go away is eventually discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalMode {
    OnExit,
    OnCompleteCurrentLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Remaining steps after the one that started the wait.
    Frames(u32),
    Members,
}

/// Borrowed view a runner mutates during its step.
pub struct StepContext<'a> {
    pub state: &'a mut BattleState,
    pub ports: &'a mut Collaborators,
    pub requests: &'a mut Vec<RegistryRequest>,
}

#[derive(Debug, Clone)]
struct Frame {
    lines: Rc<[Instruction]>,
    index: usize,
}

impl Frame {
    fn is_exhausted(&self) -> bool {
        self.index >= self.lines.len()
    }
}

/// Executes one sheet's script, one line or one wait tick per step.
#[derive(Debug)]
pub struct ScriptRunner {
    actor: ActorId,
    owner: Option<CharacterId>,
    trigger: Trigger,
    effect: bool,
    script: Rc<[Instruction]>,
    frames: Vec<Frame>,
    wait: Option<Wait>,
    state: RunnerState,
    pending_removal: Option<RemovalMode>,
}

impl ScriptRunner {
    pub fn new(actor: ActorId, owner: Option<CharacterId>, sheet: &Sheet) -> Self {
        Self {
            actor,
            owner,
            trigger: sheet.trigger,
            effect: sheet.effect,
            script: Rc::from(sheet.script.as_slice()),
            frames: Vec::new(),
            wait: None,
            state: RunnerState::Idle,
            pending_removal: None,
        }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn owner(&self) -> Option<CharacterId> {
        self.owner
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    pub fn is_effect(&self) -> bool {
        self.effect
    }

    /// Parallel runners are stepped in the second pass every frame.
    pub fn is_parallel(&self) -> bool {
        self.trigger.is_parallel() || self.effect
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunnerState::Running
    }

    pub fn wait(&self) -> Option<Wait> {
        self.wait
    }

    pub fn pending_removal(&self) -> Option<RemovalMode> {
        self.pending_removal
    }

    pub fn at_line_boundary(&self) -> bool {
        self.wait.is_none()
    }

    /// (Re)starts from the first line.
    pub fn start(&mut self) {
        if self.state == RunnerState::Removed {
            return;
        }
        self.frames.clear();
        self.frames.push(Frame {
            lines: Rc::clone(&self.script),
            index: 0,
        });
        self.wait = None;
        self.state = RunnerState::Running;
    }

    pub fn mark_for_removal(&mut self) -> RemovalMode {
        let mode = if self.trigger.is_parallel() {
            RemovalMode::OnCompleteCurrentLine
        } else {
            RemovalMode::OnExit
        };
        self.pending_removal = Some(mode);
        mode
    }

    pub fn mark_removed(&mut self) {
        self.frames.clear();
        self.wait = None;
        self.state = RunnerState::Removed;
    }

    pub fn step(&mut self, key: RunnerKey, ctx: &mut StepContext<'_>) -> StepOutcome {
        if !self.is_running() {
            return StepOutcome::Finished;
        }
        match self.wait {
            Some(Wait::Frames(remaining)) => {
                self.wait = (remaining > 1).then(|| Wait::Frames(remaining - 1));
            }
            Some(Wait::Members) => {
                if ctx.state.members.is_empty() {
                    self.wait = None;
                }
            }
            None => self.execute_next(key, ctx),
        }
        self.settle()
    }

    fn execute_next(&mut self, key: RunnerKey, ctx: &mut StepContext<'_>) {
        self.pop_exhausted();
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        let lines = Rc::clone(&frame.lines);
        let line = &lines[frame.index];
        frame.index += 1;

        let origin = LineOrigin {
            key,
            actor: self.actor,
            owner: self.owner,
        };
        match execute_line(line, &origin, ctx) {
            LineOutcome::Next => {}
            LineOutcome::Suspend(wait) => self.wait = Some(wait),
            LineOutcome::Enter(block) => {
                if !block.is_empty() {
                    self.frames.push(Frame {
                        lines: Rc::from(block),
                        index: 0,
                    });
                }
            }
            LineOutcome::Exit => {
                self.frames.clear();
                self.wait = None;
            }
        }
    }

    fn pop_exhausted(&mut self) {
        while self.frames.last().is_some_and(Frame::is_exhausted) {
            self.frames.pop();
        }
    }

    fn settle(&mut self) -> StepOutcome {
        self.pop_exhausted();
        if self.frames.is_empty() && self.wait.is_none() {
            self.state = RunnerState::Finished;
            StepOutcome::Finished
        } else {
            StepOutcome::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{count_up, sheet, FakeStore, Fakes};
    use be_core::{BattleConfig, Camp, Condition, MemberChange, MemberCommand, MemberSubject, VarRef};

    struct Harness {
        fakes: Fakes,
        state: BattleState,
        ports: Collaborators,
        requests: Vec<RegistryRequest>,
    }

    impl Harness {
        fn new(store: FakeStore) -> Self {
            let fakes = Fakes::new(store);
            let ports = fakes.collaborators();
            Self {
                fakes,
                state: BattleState::new(BattleConfig::default()),
                ports,
                requests: Vec::new(),
            }
        }

        fn step(&mut self, runner: &mut ScriptRunner) -> StepOutcome {
            let mut ctx = StepContext {
                state: &mut self.state,
                ports: &mut self.ports,
                requests: &mut self.requests,
            };
            runner.step(RunnerKey::new(), &mut ctx)
        }
    }

    fn runner(script: Vec<Instruction>) -> ScriptRunner {
        let mut runner = ScriptRunner::new(ActorId::new(), None, &sheet(Trigger::None, script));
        runner.start();
        runner
    }

    #[test]
    fn finishes_in_the_step_of_its_last_line() {
        let mut harness = Harness::new(FakeStore::default().with_variable("count", 0.0));
        let mut runner = runner(vec![count_up("count"), count_up("count")]);
        assert_eq!(harness.step(&mut runner), StepOutcome::Running);
        assert_eq!(harness.step(&mut runner), StepOutcome::Finished);
        assert_eq!(harness.fakes.store.variable_named("count"), Some(2.0));
        assert_eq!(runner.state(), RunnerState::Finished);
    }

    #[test]
    fn wait_occupies_exactly_its_frame_count() {
        let mut harness = Harness::new(FakeStore::default().with_variable("count", 0.0));
        let mut runner = runner(vec![Instruction::Wait { frames: 3 }, count_up("count")]);
        for _ in 0..3 {
            assert_eq!(harness.step(&mut runner), StepOutcome::Running);
        }
        assert_eq!(harness.fakes.store.variable_named("count"), Some(0.0));
        assert_eq!(harness.step(&mut runner), StepOutcome::Finished);
        assert_eq!(harness.fakes.store.variable_named("count"), Some(1.0));
    }

    #[test]
    fn trailing_wait_keeps_runner_alive() {
        let mut harness = Harness::new(FakeStore::default());
        let mut runner = runner(vec![Instruction::Wait { frames: 2 }]);
        assert_eq!(harness.step(&mut runner), StepOutcome::Running);
        assert!(!runner.at_line_boundary());
        assert_eq!(harness.step(&mut runner), StepOutcome::Finished);
    }

    #[test]
    fn empty_script_finishes_on_first_step() {
        let mut harness = Harness::new(FakeStore::default());
        let mut runner = runner(Vec::new());
        assert_eq!(harness.step(&mut runner), StepOutcome::Finished);
    }

    #[test]
    fn branch_runs_nested_block_as_frame() {
        let mut harness = Harness::new(
            FakeStore::default()
                .with_variable("count", 0.0)
                .with_switch("flag", true),
        );
        let mut runner = runner(vec![
            Instruction::Branch {
                conditions: vec![Condition::Switch {
                    switch: VarRef::global("flag"),
                    value: true,
                }],
                then: vec![count_up("count"), count_up("count")],
                otherwise: vec![Instruction::Exit],
            },
            count_up("count"),
        ]);
        let mut steps = 1;
        while harness.step(&mut runner) == StepOutcome::Running {
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert_eq!(harness.fakes.store.variable_named("count"), Some(3.0));
    }

    #[test]
    fn exit_stops_immediately() {
        let mut harness = Harness::new(FakeStore::default().with_variable("count", 0.0));
        let mut runner = runner(vec![Instruction::Exit, count_up("count")]);
        assert_eq!(harness.step(&mut runner), StepOutcome::Finished);
        assert_eq!(harness.fakes.store.variable_named("count"), Some(0.0));
    }

    #[test]
    fn wait_members_suspends_until_queue_drains() {
        let mut harness = Harness::new(FakeStore::default().with_variable("count", 0.0));
        harness.state.members.enqueue(MemberChange::new(
            MemberCommand::SetWait,
            Camp::Party,
            MemberSubject::Slot { index: 0 },
        ));
        let mut runner = runner(vec![Instruction::WaitMembers, count_up("count")]);
        assert_eq!(harness.step(&mut runner), StepOutcome::Running);
        assert_eq!(harness.step(&mut runner), StepOutcome::Running);
        assert_eq!(runner.wait(), Some(Wait::Members));

        let Harness { state, ports, .. } = &mut harness;
        state
            .members
            .drain_if_ready(&mut state.roster, &mut state.actions, &state.config, ports);
        assert_eq!(harness.step(&mut runner), StepOutcome::Running);
        assert_eq!(harness.step(&mut runner), StepOutcome::Finished);
        assert_eq!(harness.fakes.store.variable_named("count"), Some(1.0));
    }

    #[test]
    fn removal_mode_follows_trigger() {
        let mut parallel = ScriptRunner::new(ActorId::new(), None, &sheet(Trigger::Parallel, Vec::new()));
        assert_eq!(parallel.mark_for_removal(), RemovalMode::OnCompleteCurrentLine);
        let mut auto = ScriptRunner::new(ActorId::new(), None, &sheet(Trigger::Auto, Vec::new()));
        assert_eq!(auto.mark_for_removal(), RemovalMode::OnExit);
    }
}
