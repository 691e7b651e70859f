use be_core::{ActorId, CharacterId, PendingCommand};

/// A buffered next-turn command and the actor whose script queued it.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnEntry {
    pub target: CharacterId,
    pub command: PendingCommand,
    pub origin: Option<ActorId>,
}

/// Next-turn commands, at most one per (target, command kind).
#[derive(Debug, Default)]
pub struct TurnActionQueue {
    entries: Vec<TurnEntry>,
}

impl TurnActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any entry with the same target and command kind.
    pub fn enqueue(&mut self, entry: TurnEntry) {
        let kind = entry.command.kind();
        self.entries
            .retain(|queued| !(queued.target == entry.target && queued.command.kind() == kind));
        self.entries.push(entry);
    }

    pub fn take_actions(&mut self) -> Vec<TurnEntry> {
        self.take_where(|entry| entry.command.is_action())
    }

    pub fn take_statuses(&mut self) -> Vec<TurnEntry> {
        self.take_where(|entry| !entry.command.is_action())
    }

    /// Drops every entry aimed at `target`.
    pub fn forget(&mut self, target: CharacterId) {
        self.entries.retain(|entry| entry.target != target);
    }

    pub fn entries(&self) -> &[TurnEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn take_where(&mut self, keep: impl Fn(&TurnEntry) -> bool) -> Vec<TurnEntry> {
        let (taken, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| keep(entry));
        self.entries = rest;
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use be_core::{BattleCommand, StatusId};

    fn action(target: CharacterId, command: BattleCommand) -> TurnEntry {
        TurnEntry {
            target,
            command: PendingCommand::Action { command },
            origin: None,
        }
    }

    #[test]
    fn same_target_and_kind_is_deduplicated() {
        let mut queue = TurnActionQueue::new();
        let target = CharacterId::new();
        queue.enqueue(action(target, BattleCommand::Attack));
        queue.enqueue(action(target, BattleCommand::Attack));
        assert_eq!(queue.len(), 1);

        queue.enqueue(action(target, BattleCommand::Guard));
        assert_eq!(queue.len(), 1);
        assert_eq!(
            queue.entries()[0].command,
            PendingCommand::Action {
                command: BattleCommand::Guard
            }
        );

        queue.enqueue(action(CharacterId::new(), BattleCommand::Attack));
        queue.enqueue(TurnEntry {
            target,
            command: PendingCommand::Status {
                status: StatusId::new(),
                add: true,
            },
            origin: None,
        });
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn newer_entry_replaces_older_one() {
        let mut queue = TurnActionQueue::new();
        let target = CharacterId::new();
        let first = be_core::SkillId::new();
        let second = be_core::SkillId::new();
        queue.enqueue(action(target, BattleCommand::Skill { skill: first }));
        queue.enqueue(action(target, BattleCommand::Skill { skill: second }));
        assert_eq!(
            queue.entries()[0].command,
            PendingCommand::Action {
                command: BattleCommand::Skill { skill: second }
            }
        );
    }

    #[test]
    fn taking_actions_leaves_statuses() {
        let mut queue = TurnActionQueue::new();
        let target = CharacterId::new();
        queue.enqueue(action(target, BattleCommand::Attack));
        queue.enqueue(TurnEntry {
            target,
            command: PendingCommand::Status {
                status: StatusId::new(),
                add: true,
            },
            origin: None,
        });

        let actions = queue.take_actions();
        assert_eq!(actions.len(), 1);
        assert_eq!(queue.len(), 1);
        assert!(!queue.entries()[0].command.is_action());
        assert_eq!(queue.take_statuses().len(), 1);
        assert!(queue.is_empty());
    }
}
