//! Validation of authored slot metadata into typed slot definitions.
//!
//! Map tools store slot roles and template bindings as loose string tags.
//! Everything is checked once here, at load time, so the rest of the engine
//! only ever sees [`SlotDescriptor`] values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ActorId, EnemyId, SlotDescriptor, SlotId, SlotRole, TemplateId, TilePos, Unit};

/// Slot exactly as authored in a map file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSlot {
    /// Slot identifier; also fixes the slot-definition order.
    pub id: u32,
    /// Tile column.
    pub x: u32,
    /// Tile row.
    pub y: u32,
    /// Role tag such as `actor` or `afterPrepare`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Template id tag; `0` marks a floating actor slot.
    #[serde(default)]
    pub template: Option<String>,
    /// Actor placed on the slot when the battle starts.
    #[serde(default)]
    pub actor: Option<u32>,
    /// Enemy placed on the slot when the battle starts.
    #[serde(default)]
    pub enemy: Option<u32>,
    /// Whether the slot starts erased.
    #[serde(default)]
    pub erased: bool,
    /// Whether the slot carries runnable scripted content.
    #[serde(default)]
    pub scripted: bool,
}

/// Validated slot ready to seed the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDefinition {
    /// Slot identifier.
    pub id: SlotId,
    /// Initial position.
    pub position: TilePos,
    /// Typed metadata.
    pub descriptor: SlotDescriptor,
    /// Battler occupying the slot at battle start.
    pub unit: Option<Unit>,
    /// Whether the slot starts erased.
    pub erased: bool,
}

/// Validated set of slots authored on a map, in slot-definition order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapLayout {
    slots: Vec<SlotDefinition>,
}

impl MapLayout {
    /// Validates raw slots into a layout sorted by slot identifier.
    pub fn from_raw(raw: &[RawSlot]) -> Result<Self, MetadataError> {
        let mut slots = raw
            .iter()
            .map(SlotDefinition::from_raw)
            .collect::<Result<Vec<_>, _>>()?;
        slots.sort_by_key(|slot| slot.id);
        for pair in slots.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(MetadataError::DuplicateSlot { slot: pair[0].id.get() });
            }
        }
        Ok(Self { slots })
    }

    /// Slots in definition order.
    #[must_use]
    pub fn slots(&self) -> &[SlotDefinition] {
        &self.slots
    }
}

/// Reasons authored slot metadata may fail validation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// The role tag is not recognised.
    #[error("slot {slot}: unknown role tag '{tag}'")]
    UnknownRole {
        /// Offending slot.
        slot: u32,
        /// Tag as authored.
        tag: String,
    },
    /// An actor slot carries no template id.
    #[error("slot {slot}: actor slot is missing its template id")]
    MissingTemplate {
        /// Offending slot.
        slot: u32,
    },
    /// The template id is not a non-negative integer.
    #[error("slot {slot}: template id '{value}' is not a non-negative integer")]
    InvalidTemplate {
        /// Offending slot.
        slot: u32,
        /// Value as authored.
        value: String,
    },
    /// A battler was placed on a slot whose role cannot hold it.
    #[error("slot {slot}: battler does not match the slot role")]
    UnitRoleMismatch {
        /// Offending slot.
        slot: u32,
    },
    /// A locked slot holds an actor other than the one it is bound to.
    #[error("slot {slot}: locked to actor {template} but holds actor {actor}")]
    TemplateMismatch {
        /// Offending slot.
        slot: u32,
        /// Bound actor.
        template: u32,
        /// Actor found on the slot.
        actor: u32,
    },
    /// An erased slot still names a battler.
    #[error("slot {slot}: erased slot cannot hold a battler")]
    ErasedOccupied {
        /// Offending slot.
        slot: u32,
    },
    /// Two slots share an identifier.
    #[error("slot {slot} is defined more than once")]
    DuplicateSlot {
        /// Duplicated identifier.
        slot: u32,
    },
}

impl SlotDescriptor {
    /// Builds a descriptor from authored role and template tags.
    pub fn from_meta(
        slot: u32,
        kind: Option<&str>,
        template: Option<&str>,
        scripted: bool,
    ) -> Result<Self, MetadataError> {
        let role = match kind.map(str::trim) {
            None | Some("") => SlotRole::Untyped,
            Some("actor") => SlotRole::Actor,
            Some("enemy") => SlotRole::Enemy,
            Some("playerEvent") => SlotRole::PlayerEvent,
            Some("prepare") => SlotRole::Prepare,
            Some("afterPrepare") => SlotRole::AfterPrepare,
            Some(other) => {
                return Err(MetadataError::UnknownRole {
                    slot,
                    tag: other.to_owned(),
                })
            }
        };

        let parsed = template
            .map(|value| {
                value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| MetadataError::InvalidTemplate {
                        slot,
                        value: value.to_owned(),
                    })
            })
            .transpose()?;

        // Non-actor slots reuse the id tag for their own purposes (enemy
        // templates); only actor slots bind deployment templates.
        let template = match role {
            SlotRole::Actor => {
                TemplateId::new(parsed.ok_or(MetadataError::MissingTemplate { slot })?)
            }
            _ => TemplateId::FLOATING,
        };

        Ok(Self::new(role, template, scripted))
    }
}

impl SlotDefinition {
    /// Validates a single authored slot.
    pub fn from_raw(raw: &RawSlot) -> Result<Self, MetadataError> {
        let descriptor = SlotDescriptor::from_meta(
            raw.id,
            raw.kind.as_deref(),
            raw.template.as_deref(),
            raw.scripted,
        )?;

        let unit = match (descriptor.role(), raw.actor, raw.enemy) {
            (_, None, None) => None,
            (SlotRole::Actor, Some(actor), None) => Some(Unit::Actor(ActorId::new(actor))),
            (SlotRole::Enemy, None, Some(enemy)) => Some(Unit::Enemy(EnemyId::new(enemy))),
            _ => return Err(MetadataError::UnitRoleMismatch { slot: raw.id }),
        };

        if raw.erased && unit.is_some() {
            return Err(MetadataError::ErasedOccupied { slot: raw.id });
        }

        let locked = descriptor.template().locked_actor();
        let unit = match (locked, unit) {
            (Some(bound), Some(Unit::Actor(actor))) if bound != actor => {
                return Err(MetadataError::TemplateMismatch {
                    slot: raw.id,
                    template: bound.get(),
                    actor: actor.get(),
                })
            }
            (Some(bound), None) if !raw.erased => Some(Unit::Actor(bound)),
            (_, unit) => unit,
        };

        Ok(Self {
            id: SlotId::new(raw.id),
            position: TilePos::new(raw.x, raw.y),
            descriptor,
            unit,
            erased: raw.erased,
        })
    }
}
