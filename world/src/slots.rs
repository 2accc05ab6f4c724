//! Authoritative deployment slot state.

use battle_prepare_core::{
    ActorId, MapLayout, SlotDescriptor, SlotId, SlotRole, TemplateId, TilePos, Unit,
};

/// Deployment slot as tracked by the world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    id: SlotId,
    position: TilePos,
    descriptor: SlotDescriptor,
    unit: Option<Unit>,
    erased: bool,
}

impl Slot {
    /// Identifier allocated when the map was authored.
    #[must_use]
    pub const fn id(&self) -> SlotId {
        self.id
    }

    /// Tile the slot currently sits on.
    #[must_use]
    pub const fn position(&self) -> TilePos {
        self.position
    }

    /// Role authored on the slot.
    #[must_use]
    pub const fn role(&self) -> SlotRole {
        self.descriptor.role()
    }

    /// Template binding authored on the slot.
    #[must_use]
    pub const fn template(&self) -> TemplateId {
        self.descriptor.template()
    }

    /// Reports whether the slot carries runnable scripted content.
    #[must_use]
    pub const fn scripted(&self) -> bool {
        self.descriptor.scripted()
    }

    /// Battler bound to the slot, if any.
    #[must_use]
    pub const fn unit(&self) -> Option<Unit> {
        self.unit
    }

    /// Reports whether the slot has been erased from the map.
    #[must_use]
    pub const fn is_erased(&self) -> bool {
        self.erased
    }

    /// Reports whether the slot was authored as an actor deployment slot.
    #[must_use]
    pub fn is_actor_slot(&self) -> bool {
        self.role() == SlotRole::Actor
    }

    /// Reports whether any eligible actor may occupy the slot.
    #[must_use]
    pub fn is_floating(&self) -> bool {
        self.is_actor_slot() && self.template().is_floating()
    }

    /// Reports whether the slot is permanently bound to one actor.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.is_actor_slot() && !self.template().is_floating()
    }

    /// Actor currently deployed on the slot.
    ///
    /// Erased slots never report an actor, whatever their stale binding says.
    #[must_use]
    pub fn deployed_actor(&self) -> Option<ActorId> {
        if self.erased || !self.is_actor_slot() {
            return None;
        }
        self.unit.and_then(|unit| unit.actor())
    }

    /// Reports whether an actor could be added to the slot.
    #[must_use]
    pub fn is_vacant(&self) -> bool {
        self.is_actor_slot() && (self.erased || self.unit.is_none())
    }

    fn deploy(&mut self, actor: ActorId) {
        self.unit = Some(Unit::Actor(actor));
        self.erased = false;
    }

    fn vacate(&mut self) {
        self.unit = None;
        self.erased = true;
    }
}

/// Ordered collection of every slot on the map.
#[derive(Clone, Debug, Default)]
pub(crate) struct SlotRegistry {
    slots: Vec<Slot>,
}

impl SlotRegistry {
    pub(crate) fn from_layout(layout: &MapLayout) -> Self {
        let slots = layout
            .slots()
            .iter()
            .map(|definition| Slot {
                id: definition.id,
                position: definition.position,
                descriptor: definition.descriptor,
                unit: definition.unit,
                erased: definition.erased,
            })
            .collect();
        Self { slots }
    }

    pub(crate) fn iter(&self) -> impl DoubleEndedIterator<Item = &Slot> {
        self.slots.iter()
    }

    pub(crate) fn get(&self, id: SlotId) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    /// First slot in definition order standing on the tile, erased or not.
    pub(crate) fn find_at(&self, position: TilePos) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.position == position)
    }

    pub(crate) fn deployed_actors(&self) -> Vec<ActorId> {
        self.slots.iter().filter_map(Slot::deployed_actor).collect()
    }

    pub(crate) fn deploy(&mut self, id: SlotId, actor: ActorId) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.deploy(actor);
                true
            }
            None => false,
        }
    }

    /// Erases the slot, returning the actor that stood on it.
    pub(crate) fn vacate(&mut self, id: SlotId) -> Option<ActorId> {
        let slot = self.slot_mut(id)?;
        let actor = slot.deployed_actor()?;
        slot.vacate();
        Some(actor)
    }

    pub(crate) fn swap_positions(&mut self, first: SlotId, second: SlotId) -> bool {
        let Some(a) = self.slots.iter().position(|slot| slot.id == first) else {
            return false;
        };
        let Some(b) = self.slots.iter().position(|slot| slot.id == second) else {
            return false;
        };
        let position = self.slots[a].position;
        self.slots[a].position = self.slots[b].position;
        self.slots[b].position = position;
        true
    }

    fn slot_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|slot| slot.id == id)
    }
}
