use be_core::{Camp, Character, CharacterId, PartyLayout, TargetSelector};

use crate::ports::{ActorHandle, VisualLayer};

/// A participant the renderer currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleEntry {
    pub character: CharacterId,
    pub camp: Camp,
    pub unique_id: Option<u32>,
    pub handle: ActorHandle,
    pub opacity: f32,
    pub target_opacity: f32,
}

impl VisibleEntry {
    pub fn is_ramping(&self) -> bool {
        (self.opacity - self.target_opacity).abs() > f32::EPSILON
    }
}

/// The two ordered battle rosters plus their render-visible counterparts.
#[derive(Debug, Default)]
pub struct Roster {
    party: Vec<Character>,
    monsters: Vec<Character>,
    bench: Vec<Character>,
    /// Visual actor slots, aligned with `party`.
    party_slots: Vec<ActorHandle>,
    visible: Vec<VisibleEntry>,
    next_unique_id: u32,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn party(&self) -> &[Character] {
        &self.party
    }

    pub fn monsters(&self) -> &[Character] {
        &self.monsters
    }

    pub fn bench(&self) -> &[Character] {
        &self.bench
    }

    pub fn visible(&self) -> &[VisibleEntry] {
        &self.visible
    }

    pub fn party_slots(&self) -> &[ActorHandle] {
        &self.party_slots
    }

    pub fn visible_entry(&self, character: CharacterId) -> Option<&VisibleEntry> {
        self.visible
            .iter()
            .find(|entry| entry.character == character)
    }

    pub fn party_index(&self, character: CharacterId) -> Option<usize> {
        self.party.iter().position(|member| member.id == character)
    }

    pub fn monster_index(&self, character: CharacterId) -> Option<usize> {
        self.monsters.iter().position(|monster| monster.id == character)
    }

    pub fn monster_index_at_layout(&self, layout: usize) -> Option<usize> {
        self.monsters
            .iter()
            .position(|monster| monster.layout() == Some(layout))
    }

    pub fn character(&self, character: CharacterId) -> Option<&Character> {
        self.party
            .iter()
            .chain(self.monsters.iter())
            .find(|candidate| candidate.id == character)
    }

    pub fn character_mut(&mut self, character: CharacterId) -> Option<&mut Character> {
        self.party
            .iter_mut()
            .chain(self.monsters.iter_mut())
            .find(|candidate| candidate.id == character)
    }

    /// Resolves a script target. `owner` backs [`TargetSelector::Owner`].
    pub fn resolve(
        &self,
        selector: TargetSelector,
        owner: Option<CharacterId>,
    ) -> Option<CharacterId> {
        match selector {
            TargetSelector::Owner => owner.filter(|id| self.character(*id).is_some()),
            TargetSelector::Character { id } => self.character(id).map(|found| found.id),
            TargetSelector::PartySlot { slot } => {
                let index = (slot as usize).checked_sub(1)?;
                self.party.get(index).map(|member| member.id)
            }
            TargetSelector::MonsterSlot { unique_id } => self
                .monsters
                .iter()
                .find(|monster| monster.unique_id() == Some(unique_id))
                .map(|monster| monster.id),
        }
    }

    pub fn allocate_unique_id(&mut self) -> u32 {
        let id = self.next_unique_id;
        self.next_unique_id += 1;
        id
    }

    pub fn push_party(&mut self, member: Character, handle: ActorHandle, opacity: f32) {
        self.visible.push(VisibleEntry {
            character: member.id,
            camp: Camp::Party,
            unique_id: None,
            handle,
            opacity,
            target_opacity: 1.0,
        });
        self.party_slots.push(handle);
        self.party.push(member);
    }

    /// Removes a party member, shifting trailing visual slots left, and
    /// returns the member with the released slot handle.
    pub fn remove_party(&mut self, index: usize) -> Option<(Character, ActorHandle)> {
        if index >= self.party.len() {
            return None;
        }
        let member = self.party.remove(index);
        let handle = self.party_slots.remove(index);
        self.forget(member.id, handle);
        Some((member, handle))
    }

    /// Inserts at `index`, clamped to the roster length.
    pub fn insert_monster(
        &mut self,
        index: usize,
        monster: Character,
        handle: ActorHandle,
        opacity: f32,
    ) {
        let index = index.min(self.monsters.len());
        self.visible.push(VisibleEntry {
            character: monster.id,
            camp: Camp::Monster,
            unique_id: monster.unique_id(),
            handle,
            opacity,
            target_opacity: 1.0,
        });
        self.monsters.insert(index, monster);
    }

    pub fn remove_monster(&mut self, index: usize) -> Option<(Character, Option<ActorHandle>)> {
        if index >= self.monsters.len() {
            return None;
        }
        let monster = self.monsters.remove(index);
        let handle = self
            .visible
            .iter()
            .find(|entry| entry.camp == Camp::Monster && entry.unique_id == monster.unique_id())
            .map(|entry| entry.handle);
        if let Some(handle) = handle {
            self.forget(monster.id, handle);
        } else {
            self.evict_targets(monster.id);
        }
        Some((monster, handle))
    }

    pub fn push_bench(&mut self, member: Character) {
        self.bench.retain(|benched| benched.id != member.id);
        self.bench.push(member);
    }

    pub fn take_bench(&mut self, character: CharacterId) -> Option<Character> {
        let index = self.bench.iter().position(|member| member.id == character)?;
        Some(self.bench.remove(index))
    }

    /// Sends every party slot its position for the current party size.
    pub fn relayout_party(&self, layout: &PartyLayout, visual: &mut dyn VisualLayer) {
        let positions = layout.positions(self.party_slots.len());
        let placements: Vec<_> = self.party_slots.iter().copied().zip(positions).collect();
        visual.relayout(&placements);
    }

    /// Moves every visible entry one step toward its target opacity.
    pub fn advance_opacity(&mut self, step: f32, visual: &mut dyn VisualLayer) {
        for entry in self.visible.iter_mut().filter(|entry| entry.is_ramping()) {
            entry.opacity = if entry.opacity < entry.target_opacity {
                (entry.opacity + step).min(entry.target_opacity)
            } else {
                (entry.opacity - step).max(entry.target_opacity)
            };
            visual.set_opacity(entry.handle, entry.opacity);
        }
    }

    fn forget(&mut self, character: CharacterId, handle: ActorHandle) {
        self.visible.retain(|entry| entry.handle != handle);
        self.evict_targets(character);
    }

    fn evict_targets(&mut self, character: CharacterId) {
        for participant in self.party.iter_mut().chain(self.monsters.iter_mut()) {
            participant.targets.retain(|target| *target != character);
        }
    }
}
