#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure formation-menu system emitting roster toggle and commit commands.

use battle_prepare_core::{ActorId, BattlePhase, Command, InputRejection};
use battle_prepare_world::{query, World};
use tracing::debug;

/// Input produced by the formation menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormationInput {
    /// The player toggled an actor in or out of the deployment.
    Toggle(ActorId),
    /// The player asked to close the menu.
    Close,
}

/// Row of the formation menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormationEntry {
    /// Actor listed on the row.
    pub actor: ActorId,
    /// Whether the actor is marked for deployment.
    pub deployed: bool,
    /// Whether the row is greyed out because the actor is bound to a slot.
    pub locked: bool,
}

/// Formation menu driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct Formation;

impl Formation {
    /// Creates a new formation system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Lists every eligible actor in merged party order.
    #[must_use]
    pub fn entries(&self, world: &World) -> Vec<FormationEntry> {
        let roster = query::roster(world);
        roster
            .all_eligible()
            .iter()
            .map(|actor| FormationEntry {
                actor: *actor,
                deployed: !roster.is_remaining(*actor),
                locked: roster.is_locked(*actor),
            })
            .collect()
    }

    /// Translates menu input into world commands.
    pub fn handle(&self, world: &World, input: FormationInput, out: &mut Vec<Command>) {
        if query::battle_phase(world) != BattlePhase::BattlePrepare {
            return;
        }
        let roster = query::roster(world);

        match input {
            FormationInput::Toggle(actor) if !roster.is_eligible(actor) => {
                out.push(Command::RejectInput {
                    reason: InputRejection::ActorUnavailable,
                });
            }
            FormationInput::Toggle(actor) if roster.is_locked(actor) => {
                debug!(actor = actor.get(), "locked actor cannot leave the formation");
                out.push(Command::RejectInput {
                    reason: InputRejection::LockedSlot,
                });
            }
            FormationInput::Toggle(actor) => out.push(Command::ToggleFormationMember { actor }),
            FormationInput::Close if roster.is_valid_count() => out.push(Command::CommitFormation),
            FormationInput::Close => {
                debug!(
                    current = roster.current_count(),
                    min = roster.min_actor(),
                    max = roster.max_actor(),
                    "formation kept open"
                );
                out.push(Command::RejectInput {
                    reason: InputRejection::InvalidRosterCount,
                });
            }
        }
    }
}
