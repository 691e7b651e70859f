use std::collections::VecDeque;

use be_core::{BattleConfig, Camp, Character, CharacterId, MemberChange, MemberCommand, MemberSubject};
use tracing::{debug, info, warn};

use crate::action_queue::TurnActionQueue;
use crate::ports::{ActorHandle, ActorState, Collaborators};
use crate::roster::Roster;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Entries are waiting behind a fade or party movement.
    Blocked,
    Idle,
    /// One entry was consumed, whether or not it changed the roster.
    Applied,
}

/// Structural roster mutations, applied strictly in order and one per frame.
#[derive(Debug, Default)]
pub struct MemberChangeQueue {
    entries: VecDeque<MemberChange>,
}

impl MemberChangeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, change: MemberChange) {
        debug!(target: "battle::members", command = ?change.command, camp = ?change.camp, "member change queued");
        self.entries.push_back(change);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn drain_if_ready(
        &mut self,
        roster: &mut Roster,
        actions: &mut TurnActionQueue,
        config: &BattleConfig,
        ports: &mut Collaborators,
    ) -> DrainOutcome {
        if self.entries.is_empty() {
            return DrainOutcome::Idle;
        }
        if is_gated(roster, ports) {
            return DrainOutcome::Blocked;
        }
        let Some(change) = self.entries.pop_front() else {
            return DrainOutcome::Idle;
        };
        let mut applier = Applier {
            roster,
            actions,
            config,
            ports,
        };
        if !applier.apply(&change) {
            debug!(target: "battle::members", command = ?change.command, camp = ?change.camp, "member change skipped");
        }
        DrainOutcome::Applied
    }
}

fn is_gated(roster: &Roster, ports: &Collaborators) -> bool {
    ports.visual.is_fading()
        || roster
            .party_slots()
            .iter()
            .any(|handle| ports.visual.has_pending_moves(*handle))
}

struct Applier<'a> {
    roster: &'a mut Roster,
    actions: &'a mut TurnActionQueue,
    config: &'a BattleConfig,
    ports: &'a mut Collaborators,
}

impl Applier<'_> {
    /// Returns false when the entry was consumed without effect.
    fn apply(&mut self, change: &MemberChange) -> bool {
        match (change.command, change.camp) {
            (MemberCommand::Add | MemberCommand::AddNew, Camp::Party) => self.add_party(change),
            (MemberCommand::Add | MemberCommand::AddNew, Camp::Monster) => {
                self.add_monster(change)
            }
            (MemberCommand::SetWait, camp) => self.set_wait(camp, change.subject),
            (MemberCommand::FadeOut, camp) => self.fade_out(camp, change.subject),
            (MemberCommand::Remove, Camp::Party) => self.remove_party(change.subject),
            (MemberCommand::Remove, Camp::Monster) => self.remove_monster(change.subject),
        }
    }

    fn add_party(&mut self, change: &MemberChange) -> bool {
        let MemberSubject::Character { id } = change.subject else {
            warn!(target: "battle::members", "party join needs a character identity");
            return false;
        };
        if self.roster.party().len() >= self.config.party_capacity {
            return false;
        }
        if self.roster.party_index(id).is_some() {
            return false;
        }

        let store = &self.ports.store;
        let member = match change.command {
            MemberCommand::AddNew => self.roster.take_bench(id).or_else(|| {
                if store.is_party_member(id) {
                    store.load_party_member(id)
                } else {
                    store.create_party_member(id, change.level.unwrap_or(1))
                }
            }),
            _ => self.roster.take_bench(id).or_else(|| {
                if store.is_party_member(id) {
                    store.load_party_member(id)
                } else {
                    None
                }
            }),
        };
        let Some(mut member) = member else {
            warn!(target: "battle::members", character = %id, "no data for joining member");
            return false;
        };

        self.ports.turn.recompute_stats(&mut member);
        member.clamp();
        let handle = self.ports.visual.spawn(&member);
        self.ports.visual.queue_state(handle, ActorState::Appear);
        self.ports.turn.begin_animation(member.id);
        info!(target: "battle::members", character = %member.id, name = %member.name, "party member joined");
        self.roster.push_party(member, handle, 1.0);
        self.refresh_layout();
        true
    }

    fn add_monster(&mut self, change: &MemberChange) -> bool {
        let MemberSubject::Character { id } = change.subject else {
            warn!(target: "battle::members", "monster spawn needs a template identity");
            return false;
        };
        let layout = change.layout.unwrap_or(0);
        if let Some(occupant) = self.roster.monster_index_at_layout(layout) {
            self.drop_monster(occupant);
        }

        let Some(template) = self.ports.store.monster_template(id) else {
            warn!(target: "battle::members", template = %id, "unknown monster template");
            return false;
        };
        if self.roster.monster_index(id).is_some()
            || self.roster.monsters().len() >= self.config.monster_capacity
        {
            return false;
        }

        let unique_id = self.roster.allocate_unique_id();
        let mut monster = Character::monster(id, template.name, template.stats, unique_id, layout);
        self.ports.turn.recompute_stats(&mut monster);
        monster.clamp();
        let handle = self.ports.visual.spawn(&monster);
        self.ports.visual.set_opacity(handle, 0.0);
        self.ports.visual.queue_state(handle, ActorState::Appear);
        self.ports.turn.begin_animation(monster.id);
        info!(target: "battle::members", template = %id, unique_id, layout, "monster joined");
        self.roster.insert_monster(layout, monster, handle, 0.0);
        true
    }

    fn set_wait(&mut self, camp: Camp, subject: MemberSubject) -> bool {
        let Some(character) = self.subject_id(camp, subject) else {
            return false;
        };
        let Some(handle) = self.handle_of(character) else {
            return false;
        };
        self.ports.visual.queue_state(handle, ActorState::Wait);
        true
    }

    fn fade_out(&mut self, camp: Camp, subject: MemberSubject) -> bool {
        if camp == Camp::Party && self.at_party_floor() {
            return false;
        }
        let Some(character) = self.subject_id(camp, subject) else {
            return false;
        };
        let Some(handle) = self.handle_of(character) else {
            return false;
        };
        self.ports.visual.queue_state(handle, ActorState::FadeOut);
        true
    }

    fn remove_party(&mut self, subject: MemberSubject) -> bool {
        if self.at_party_floor() {
            debug!(target: "battle::members", floor = self.config.party_floor, "party removal refused at floor");
            return false;
        }
        let Some(index) = self
            .subject_id(Camp::Party, subject)
            .and_then(|id| self.roster.party_index(id))
        else {
            return false;
        };
        let Some((member, handle)) = self.roster.remove_party(index) else {
            return false;
        };
        self.retire(handle);
        self.actions.forget(member.id);
        self.ports.store.store_character(&member);
        info!(target: "battle::members", character = %member.id, name = %member.name, "party member left");
        self.roster.push_bench(member);
        self.refresh_layout();
        true
    }

    fn remove_monster(&mut self, subject: MemberSubject) -> bool {
        let Some(index) = self
            .subject_id(Camp::Monster, subject)
            .and_then(|id| self.roster.monster_index(id))
        else {
            return false;
        };
        self.drop_monster(index);
        true
    }

    fn drop_monster(&mut self, index: usize) {
        if let Some((monster, handle)) = self.roster.remove_monster(index) {
            if let Some(handle) = handle {
                self.retire(handle);
            }
            self.actions.forget(monster.id);
            info!(target: "battle::members", character = %monster.id, unique_id = ?monster.unique_id(), "monster left");
        }
    }

    fn retire(&mut self, handle: ActorHandle) {
        self.ports.visual.queue_state(handle, ActorState::FadeOut);
        self.ports.visual.destroy(handle);
    }

    fn at_party_floor(&self) -> bool {
        self.roster.party().len() <= self.config.party_floor
    }

    fn subject_id(&self, camp: Camp, subject: MemberSubject) -> Option<CharacterId> {
        match (camp, subject) {
            (Camp::Party, MemberSubject::Character { id }) => {
                self.roster.party_index(id).map(|_| id)
            }
            (Camp::Party, MemberSubject::Slot { index }) => {
                self.roster.party().get(index).map(|member| member.id)
            }
            (Camp::Monster, MemberSubject::Character { id }) => {
                self.roster.monster_index(id).map(|_| id)
            }
            (Camp::Monster, MemberSubject::Slot { index }) => self
                .roster
                .monster_index_at_layout(index)
                .map(|position| self.roster.monsters()[position].id),
        }
    }

    fn handle_of(&self, character: CharacterId) -> Option<ActorHandle> {
        self.roster
            .visible_entry(character)
            .map(|entry| entry.handle)
    }

    fn refresh_layout(&mut self) {
        self.roster
            .relayout_party(&self.config.party_layout, self.ports.visual.as_mut());
    }
}
