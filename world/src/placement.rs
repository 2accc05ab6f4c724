//! Placement operations moving actors between slots and the bench.

use battle_prepare_core::{ActorId, AddError, Event, RemoveError, SlotId, SubPhase, Surface};
use tracing::debug;

use crate::World;

impl World {
    /// Validates a map-driven add request before it touches any state.
    fn validate_add(&self, slot: SlotId, actor: ActorId) -> Result<(), AddError> {
        if !self.config.actor_commands {
            return Err(AddError::Disabled);
        }
        let target = self
            .slots
            .get(slot)
            .filter(|target| target.is_actor_slot())
            .ok_or(AddError::NotActorSlot)?;
        if !target.is_vacant() {
            return Err(AddError::Occupied);
        }
        if !self.roster.is_remaining(actor) {
            return Err(AddError::Unavailable);
        }
        if !self.roster.can_add() {
            return Err(AddError::RosterFull);
        }
        Ok(())
    }

    fn validate_change(&self, slot: SlotId, actor: ActorId) -> Result<(), AddError> {
        let target = self
            .slots
            .get(slot)
            .filter(|target| target.is_actor_slot())
            .ok_or(AddError::NotActorSlot)?;
        if target.is_locked() {
            return Err(AddError::Locked);
        }
        if target.deployed_actor().is_none() {
            return Err(AddError::NoOccupant);
        }
        if !self.roster.is_remaining(actor) {
            return Err(AddError::Unavailable);
        }
        Ok(())
    }

    fn validate_remove(&self, slot: SlotId) -> Result<(), RemoveError> {
        let target = self
            .slots
            .get(slot)
            .filter(|target| target.is_actor_slot())
            .ok_or(RemoveError::NotActorSlot)?;
        if target.deployed_actor().is_none() {
            return Err(RemoveError::Vacant);
        }
        if target.is_locked() {
            return Err(RemoveError::Locked);
        }
        if !self.roster.can_remove() {
            return Err(RemoveError::BelowMinimum);
        }
        Ok(())
    }

    pub(crate) fn request_add(&mut self, slot: SlotId, actor: ActorId, out_events: &mut Vec<Event>) {
        match self.validate_add(slot, actor) {
            Ok(()) => {
                self.add_actor(slot, actor, out_events);
                self.report_roster(out_events);
            }
            Err(reason) => {
                debug!(slot = slot.get(), actor = actor.get(), ?reason, "add rejected");
                out_events.push(Event::AddRejected { slot, reason });
            }
        }
    }

    pub(crate) fn request_remove(&mut self, slot: SlotId, out_events: &mut Vec<Event>) {
        match self.validate_remove(slot) {
            Ok(()) => {
                let _ = self.remove_actor(slot, out_events);
                self.report_roster(out_events);
            }
            Err(reason) => {
                debug!(slot = slot.get(), ?reason, "remove rejected");
                out_events.push(Event::RemoveRejected { slot, reason });
            }
        }
    }

    pub(crate) fn request_change(
        &mut self,
        slot: SlotId,
        actor: ActorId,
        out_events: &mut Vec<Event>,
    ) {
        match self.validate_change(slot, actor) {
            Ok(()) => self.change_actor(slot, actor, out_events),
            Err(reason) => {
                debug!(slot = slot.get(), actor = actor.get(), ?reason, "change rejected");
                out_events.push(Event::AddRejected { slot, reason });
            }
        }
    }

    /// Deploys `actor` into `slot` without consulting the headcount gate.
    pub(crate) fn add_actor(&mut self, slot: SlotId, actor: ActorId, out_events: &mut Vec<Event>) {
        if !self.slots.deploy(slot, actor) {
            return;
        }
        out_events.push(Event::ActorResourcesReset { actor });
        self.roster.init_remaining(&self.slots);
        self.variables.add(self.config.actors_alive_variable, 1);
        debug!(slot = slot.get(), actor = actor.get(), "actor added");
        out_events.push(Event::ActorAdded { slot, actor });
    }

    /// Benches the occupant of `slot`, erasing the slot.
    pub(crate) fn remove_actor(
        &mut self,
        slot: SlotId,
        out_events: &mut Vec<Event>,
    ) -> Option<ActorId> {
        let actor = self.slots.vacate(slot)?;
        self.roster.bench(actor);
        self.variables.add(self.config.actors_alive_variable, -1);

        if self.active_slot == Some(slot) {
            self.set_active_slot(None, out_events);
        }
        self.signals.clear(Surface::ActorCommandStatus, out_events);
        self.signals.clear(Surface::PrepareCommand, out_events);
        if self
            .signals
            .get(Surface::Status)
            .payload()
            .is_some_and(|payload| payload.slot == slot)
        {
            self.signals.clear(Surface::Status, out_events);
        }
        if self.sub_phase == SubPhase::ExchangePosition {
            self.clear_move_cache(out_events);
            self.rebuild_move_cache();
        }
        self.set_sub_phase(SubPhase::Normal, out_events);

        debug!(slot = slot.get(), actor = actor.get(), "actor removed");
        out_events.push(Event::TurnIndicatorDetached { slot });
        out_events.push(Event::ActorRemoved { slot, actor });
        Some(actor)
    }

    fn change_actor(&mut self, slot: SlotId, actor: ActorId, out_events: &mut Vec<Event>) {
        let Some(previous) = self.slots.get(slot).and_then(|target| target.deployed_actor()) else {
            return;
        };
        let _ = self.slots.deploy(slot, actor);
        out_events.push(Event::ActorResourcesReset { actor });
        self.roster.init_remaining(&self.slots);
        debug!(
            slot = slot.get(),
            previous = previous.get(),
            actor = actor.get(),
            "actor changed"
        );
        out_events.push(Event::ActorChanged {
            slot,
            previous,
            actor,
        });
        self.return_to_normal(out_events);
    }

    /// Updates the cap, benching floating occupants from the last slot backwards.
    pub(crate) fn set_max_actor(&mut self, count: usize, out_events: &mut Vec<Event>) {
        self.roster.set_max_actor(count);
        if self.roster.current_count() <= count {
            return;
        }

        let candidates: Vec<SlotId> = self
            .slots
            .iter()
            .rev()
            .filter(|slot| slot.is_floating() && slot.deployed_actor().is_some())
            .map(|slot| slot.id())
            .collect();
        for slot in candidates {
            if self.roster.current_count() <= count {
                break;
            }
            let _ = self.remove_actor(slot, out_events);
        }

        if self.roster.current_count() > count {
            debug!(
                current = self.roster.current_count(),
                max = count,
                "only locked actors left to bench"
            );
        }
    }
}
