use be_core::{
    ActorId, BattleCommand, BattleConfig, BattlePhase, Character, CharacterId, CharacterKind,
    EventActorDef, MemberChange, RunnerKey, TargetSelector, Trigger,
};
use tracing::{debug, info};

use crate::member_queue::DrainOutcome;
use crate::ports::{ActorState, Collaborators};
use crate::registry::{RunnerRegistry, StepReport};
use crate::roster::{Roster, VisibleEntry};
use crate::state::BattleState;

/// Participants and actors the core starts a battle with.
#[derive(Debug, Clone, Default)]
pub struct BattleCoreOptions {
    pub config: BattleConfig,
    pub party: Vec<Character>,
    pub monsters: Vec<Character>,
    pub actors: Vec<EventActorDef>,
}

#[derive(Debug, Clone)]
pub struct EventActor {
    pub def: EventActorDef,
    pub current_page: Option<usize>,
}

/// Frame-driven scheduler for battle event scripts.
pub struct BattleEventCore {
    state: BattleState,
    ports: Collaborators,
    registry: RunnerRegistry,
    actors: Vec<EventActor>,
    battle_end_active: bool,
    frame: u64,
}

impl BattleEventCore {
    pub fn new(options: BattleCoreOptions, ports: Collaborators) -> Self {
        let BattleCoreOptions {
            config,
            party,
            monsters,
            actors,
        } = options;
        let mut core = Self {
            state: BattleState::new(config),
            ports,
            registry: RunnerRegistry::new(),
            actors: actors
                .into_iter()
                .map(|def| EventActor {
                    def,
                    current_page: None,
                })
                .collect(),
            battle_end_active: false,
            frame: 0,
        };

        for member in party {
            let handle = core.ports.visual.spawn(&member);
            core.ports.visual.queue_state(handle, ActorState::Appear);
            core.state.roster.push_party(member, handle, 1.0);
        }
        for mut monster in monsters {
            let unique_id = core.state.roster.allocate_unique_id();
            let layout = monster.layout().unwrap_or(unique_id as usize);
            monster.kind = CharacterKind::Monster { unique_id, layout };
            let handle = core.ports.visual.spawn(&monster);
            core.ports.visual.queue_state(handle, ActorState::Appear);
            let index = core.state.roster.monsters().len();
            core.state.roster.insert_monster(index, monster, handle, 1.0);
        }
        core.relayout_party();
        core.refresh_pages();
        info!(
            target: "battle::trigger",
            party = core.state.roster.party().len(),
            monsters = core.state.roster.monsters().len(),
            actors = core.actors.len(),
            "battle core ready"
        );
        core
    }

    /// Dispatches a phase trigger to every runner bound to it.
    pub fn start(&mut self, trigger: Trigger) {
        if trigger == Trigger::BattleEnd {
            if self.battle_end_active {
                debug!(target: "battle::trigger", "battle end already in progress");
                return;
            }
            self.battle_end_active = true;
        }
        if trigger.is_sub_phase() {
            self.state.current_trigger = Some(trigger);
        }
        self.refresh_pages();
        if trigger == Trigger::TurnStart {
            let applied = self.state.apply_buffered_statuses(self.ports.turn.as_mut());
            debug!(target: "battle::trigger", applied, "buffered statuses applied");
        }

        let keys = self.registry.keys_with_trigger(trigger);
        for key in keys.iter().copied() {
            if self
                .registry
                .runner(key)
                .is_some_and(|runner| runner.is_running())
            {
                self.registry.bring_to_front(key);
            }
            self.registry.start(key);
        }
        debug!(target: "battle::trigger", ?trigger, started = keys.len(), "trigger dispatched");
    }

    /// Advances one frame.
    pub fn update(&mut self) -> StepReport {
        self.frame += 1;
        self.refresh_pages();
        let report = self.registry.step_all(&mut self.state, &mut self.ports);
        if !report.finished.is_empty() {
            self.refresh_pages();
        }

        let step = 1.0 / self.state.config.opacity_ramp_frames.max(1) as f32;
        self.state
            .roster
            .advance_opacity(step, self.ports.visual.as_mut());

        if self.battle_end_active && !self.registry.any_running_with_trigger(Trigger::BattleEnd) {
            self.battle_end_active = false;
        }
        report
    }

    /// Polled by the outer turn controller; drains at most one member change.
    pub fn is_busy(&mut self, do_status_tick: bool) -> bool {
        let animating = do_status_tick && self.ports.tweener.tick();

        let drained = self.state.members.drain_if_ready(
            &mut self.state.roster,
            &mut self.state.actions,
            &self.state.config,
            &mut self.ports,
        );
        if drained == DrainOutcome::Applied || !self.state.members.is_empty() {
            return true;
        }

        let phase = self.ports.turn.phase();
        if phase.allows_command_assignment() {
            self.state.flush_eligible(phase);
        }
        if self.registry.is_busy(phase) {
            return true;
        }
        if self.ports.host.external_runner_active() {
            return true;
        }
        animating
    }

    pub fn enqueue_member_change(&mut self, change: MemberChange) {
        self.state.members.enqueue(change);
    }

    /// Host-side next action; `timing` follows the scripted codes.
    pub fn set_next_action(
        &mut self,
        target: TargetSelector,
        command: BattleCommand,
        timing: u32,
    ) -> bool {
        self.state.set_next_action(
            target,
            command,
            timing,
            self.ports.turn.active_character(),
            None,
            self.ports.turn.as_mut(),
        )
    }

    pub fn config(&self) -> &BattleConfig {
        &self.state.config
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn roster(&self) -> &Roster {
        &self.state.roster
    }

    pub fn party(&self) -> &[Character] {
        self.state.roster.party()
    }

    pub fn monsters(&self) -> &[Character] {
        self.state.roster.monsters()
    }

    pub fn visible(&self) -> &[VisibleEntry] {
        self.state.roster.visible()
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.state.roster.character(id)
    }

    pub fn active_character(&self) -> Option<CharacterId> {
        self.ports.turn.active_character()
    }

    pub fn phase(&self) -> BattlePhase {
        self.ports.turn.phase()
    }

    pub fn current_trigger(&self) -> Option<Trigger> {
        self.state.current_trigger
    }

    pub fn registry(&self) -> &RunnerRegistry {
        &self.registry
    }

    pub fn actors(&self) -> &[EventActor] {
        &self.actors
    }

    pub fn page(&self, actor: ActorId) -> Option<usize> {
        self.actors
            .iter()
            .find(|candidate| candidate.def.id == actor)
            .and_then(|candidate| candidate.current_page)
    }

    pub fn is_battle_end_active(&self) -> bool {
        self.battle_end_active
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn ports(&self) -> &Collaborators {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut Collaborators {
        &mut self.ports
    }

    /// Re-selects every actor's page and swaps runners where it changed.
    fn refresh_pages(&mut self) {
        for actor in &mut self.actors {
            let owner = actor.def.character;
            let page = self.state.select_page(&actor.def.sheets, &self.ports, owner);
            if page == actor.current_page {
                continue;
            }

            let key = RunnerKey::for_actor(actor.def.id);
            if actor.current_page.is_some() {
                self.registry.unregister(key);
            }
            match page.and_then(|index| actor.def.sheets.get(index)) {
                Some(sheet) => {
                    self.registry.register(actor.def.id, owner, sheet);
                    self.ports
                        .visual
                        .set_graphic(actor.def.id, sheet.graphic.as_ref());
                }
                None => self.ports.visual.set_graphic(actor.def.id, None),
            }
            debug!(
                target: "battle::pages",
                actor = %actor.def.id,
                from = ?actor.current_page,
                to = ?page,
                "page changed"
            );
            actor.current_page = page;
        }
    }

    fn relayout_party(&mut self) {
        self.state
            .roster
            .relayout_party(&self.state.config.party_layout, self.ports.visual.as_mut());
    }
}
