//! Applies the formation menu's toggle state back onto the map slots.

use battle_prepare_core::{ActorId, Event, SlotId};
use tracing::debug;

use crate::World;

impl World {
    /// Benches deselected occupants, then fills every actor slot left empty.
    ///
    /// Actors waiting to deploy are taken from the end of the list.
    pub(crate) fn reconcile_formation(&mut self, out_events: &mut Vec<Event>) {
        let deployed = self.slots.deployed_actors();
        let mut add_list: Vec<ActorId> = self
            .roster
            .all_eligible()
            .iter()
            .copied()
            .filter(|actor| !self.roster.is_remaining(*actor) && !deployed.contains(actor))
            .collect();

        let removals: Vec<SlotId> = self
            .slots
            .iter()
            .filter(|slot| {
                slot.deployed_actor()
                    .is_some_and(|actor| self.roster.is_remaining(actor))
            })
            .map(|slot| slot.id())
            .collect();
        for slot in removals {
            let _ = self.remove_actor(slot, out_events);
        }

        let targets: Vec<SlotId> = self
            .slots
            .iter()
            .filter(|slot| slot.is_actor_slot() && slot.deployed_actor().is_none())
            .map(|slot| slot.id())
            .collect();
        for slot in targets {
            let Some(actor) = add_list.pop() else {
                break;
            };
            self.add_actor(slot, actor, out_events);
        }

        if !add_list.is_empty() {
            debug!(left = add_list.len(), "no free slot for selected actors");
        }
        self.roster.init_remaining(&self.slots);
    }
}
