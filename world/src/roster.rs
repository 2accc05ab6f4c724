//! Roster ledger tracking who may deploy and who sits on the bench.

use battle_prepare_core::{ActorId, FormationError};

use crate::slots::{Slot, SlotRegistry};

const DEFAULT_MIN_ACTOR: usize = 1;

/// Authoritative headcount state for one preparation phase.
///
/// Both `locked` and `remaining` stay sorted ascending without duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RosterLedger {
    all_eligible: Vec<ActorId>,
    locked: Vec<ActorId>,
    remaining: Vec<ActorId>,
    min_actor: usize,
    max_actor: usize,
}

impl RosterLedger {
    pub(crate) fn begin(all_eligible: Vec<ActorId>) -> Self {
        Self {
            all_eligible,
            locked: Vec::new(),
            remaining: Vec::new(),
            min_actor: DEFAULT_MIN_ACTOR,
            max_actor: 0,
        }
    }

    /// Scans the slots once at phase entry for locked actors and bounds.
    pub(crate) fn init_locked_and_bounds(&mut self, slots: &SlotRegistry) {
        let mut locked: Vec<ActorId> = slots
            .iter()
            .filter(|slot| slot.is_locked())
            .filter_map(Slot::deployed_actor)
            .collect();
        locked.sort_unstable();
        locked.dedup();

        self.locked = locked;
        self.max_actor = slots.iter().filter(|slot| slot.is_actor_slot()).count();
        self.min_actor = DEFAULT_MIN_ACTOR;
    }

    /// Recomputes the bench from scratch against the current slot state.
    pub(crate) fn init_remaining(&mut self, slots: &SlotRegistry) {
        let deployed = slots.deployed_actors();
        let mut remaining: Vec<ActorId> = self
            .all_eligible
            .iter()
            .copied()
            .filter(|actor| !deployed.contains(actor))
            .collect();
        remaining.sort_unstable();
        remaining.dedup();
        self.remaining = remaining;
    }

    /// Every actor eligible for this battle, in merged party order.
    #[must_use]
    pub fn all_eligible(&self) -> &[ActorId] {
        &self.all_eligible
    }

    /// Actors bound to locked slots.
    #[must_use]
    pub fn locked(&self) -> &[ActorId] {
        &self.locked
    }

    /// Eligible actors not deployed on any slot.
    #[must_use]
    pub fn remaining(&self) -> &[ActorId] {
        &self.remaining
    }

    /// Minimum headcount required to leave preparation.
    #[must_use]
    pub const fn min_actor(&self) -> usize {
        self.min_actor
    }

    /// Maximum headcount allowed to leave preparation.
    #[must_use]
    pub const fn max_actor(&self) -> usize {
        self.max_actor
    }

    /// Number of eligible actors not on the bench.
    #[must_use]
    pub fn current_count(&self) -> usize {
        self.all_eligible.len().saturating_sub(self.remaining.len())
    }

    /// Reports whether the actor is eligible for this battle.
    #[must_use]
    pub fn is_eligible(&self, actor: ActorId) -> bool {
        self.all_eligible.contains(&actor)
    }

    /// Reports whether the actor is bound to a locked slot.
    #[must_use]
    pub fn is_locked(&self, actor: ActorId) -> bool {
        self.locked.binary_search(&actor).is_ok()
    }

    /// Reports whether the actor sits on the bench.
    #[must_use]
    pub fn is_remaining(&self, actor: ActorId) -> bool {
        self.remaining.binary_search(&actor).is_ok()
    }

    /// Lowest benched actor; the only one ever offered for a map add.
    #[must_use]
    pub fn next_candidate(&self) -> Option<ActorId> {
        self.remaining.first().copied()
    }

    /// Reports whether room exists for another actor.
    ///
    /// Whether the candidate is otherwise incapacitated is not considered.
    #[must_use]
    pub fn can_add(&self) -> bool {
        !self.remaining.is_empty() && self.current_count() < self.max_actor
    }

    /// Reports whether an actor may be benched without dropping below the minimum.
    #[must_use]
    pub fn can_remove(&self) -> bool {
        self.current_count() > self.min_actor
    }

    /// Reports whether the headcount satisfies both bounds.
    #[must_use]
    pub fn is_valid_count(&self) -> bool {
        let current = self.current_count();
        self.min_actor <= current && current <= self.max_actor
    }

    pub(crate) fn set_max_actor(&mut self, count: usize) {
        self.max_actor = count;
    }

    pub(crate) fn set_min_actor(&mut self, count: usize) {
        self.min_actor = count;
    }

    /// Puts an eligible actor on the bench, keeping the bench sorted.
    pub(crate) fn bench(&mut self, actor: ActorId) {
        if !self.is_eligible(actor) {
            return;
        }
        if let Err(index) = self.remaining.binary_search(&actor) {
            self.remaining.insert(index, actor);
        }
    }

    /// Flips an actor between the bench and the to-be-deployed set.
    ///
    /// Returns `true` when the actor is now marked for deployment.
    pub(crate) fn toggle(&mut self, actor: ActorId) -> Result<bool, FormationError> {
        if !self.is_eligible(actor) {
            return Err(FormationError::UnknownActor);
        }
        if self.is_locked(actor) {
            return Err(FormationError::LockedActor);
        }
        match self.remaining.binary_search(&actor) {
            Ok(index) => {
                let _ = self.remaining.remove(index);
                Ok(true)
            }
            Err(index) => {
                self.remaining.insert(index, actor);
                Ok(false)
            }
        }
    }
}
