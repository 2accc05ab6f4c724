#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure preparation-phase system that turns map input into world commands.
//!
//! Each interactive sub-phase owns a [`SubPhaseHandler`]. Sub-phases driven
//! by other systems (status window, movement, targeting) have no handler and
//! drop every input until the world returns to `Normal`.

use battle_prepare_core::{
    BattlePhase, Command, InputRejection, PopupChoice, SlotRole, SubPhase, Surface, TilePos,
};
use battle_prepare_world::{query, Slot, World};
use tracing::debug;

/// Reports whether a presentation surface is animating open or closed.
pub trait WindowActivity {
    /// Returns `true` while the surface is mid-transition.
    fn is_busy(&self, surface: Surface) -> bool;
}

impl<F> WindowActivity for F
where
    F: Fn(Surface) -> bool,
{
    fn is_busy(&self, surface: Surface) -> bool {
        self(surface)
    }
}

/// Window activity for headless callers where nothing ever animates.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdleWindows;

impl WindowActivity for IdleWindows {
    fn is_busy(&self, _surface: Surface) -> bool {
        false
    }
}

/// Player input routed to the preparation phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrepareInput {
    /// The player tapped a map tile.
    Tap(TilePos),
    /// The player picked an entry of the command popup.
    Choose(PopupChoice),
    /// The player pressed cancel.
    Cancel,
}

/// Read-only state shared with sub-phase handlers.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    /// World being prepared.
    pub world: &'a World,
    /// Animation state of the presentation surfaces.
    pub windows: &'a dyn WindowActivity,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

/// Strategy handling input while one sub-phase is active.
///
/// Every method defaults to dropping the input.
pub trait SubPhaseHandler: std::fmt::Debug {
    /// Handles a tap on a map tile.
    fn on_tap(&self, _context: &Context<'_>, _position: TilePos, _out: &mut Vec<Command>) {}

    /// Handles a command popup choice.
    fn on_choice(&self, _context: &Context<'_>, _choice: PopupChoice, _out: &mut Vec<Command>) {}

    /// Handles the cancel input.
    fn on_cancel(&self, _context: &Context<'_>, _out: &mut Vec<Command>) {}
}

/// Handler set consulted by [`PreparePhase`], one per interactive sub-phase.
#[derive(Debug)]
pub struct Handlers {
    /// Handler for the `Normal` sub-phase.
    pub normal: Box<dyn SubPhaseHandler>,
    /// Handler for the `PrepareCommand` sub-phase.
    pub prepare_command: Box<dyn SubPhaseHandler>,
    /// Handler for the `ExchangePosition` sub-phase.
    pub exchange_position: Box<dyn SubPhaseHandler>,
}

impl Default for Handlers {
    fn default() -> Self {
        Self {
            normal: Box::new(NormalHandler),
            prepare_command: Box::new(PrepareCommandHandler),
            exchange_position: Box::new(ExchangeHandler),
        }
    }
}

/// Sub-phase controller for battle preparation.
#[derive(Debug, Default)]
pub struct PreparePhase {
    handlers: Handlers,
}

impl PreparePhase {
    /// Creates a controller with the stock handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a controller with caller-provided handlers.
    #[must_use]
    pub fn with_handlers(handlers: Handlers) -> Self {
        Self { handlers }
    }

    /// Routes one input to the handler of the active sub-phase.
    pub fn handle(
        &self,
        world: &World,
        input: PrepareInput,
        windows: &dyn WindowActivity,
        out: &mut Vec<Command>,
    ) {
        if query::battle_phase(world) != BattlePhase::BattlePrepare {
            return;
        }

        let handler = match query::sub_phase(world) {
            SubPhase::Normal => &self.handlers.normal,
            SubPhase::PrepareCommand => &self.handlers.prepare_command,
            SubPhase::ExchangePosition => &self.handlers.exchange_position,
            busy => {
                debug!(sub_phase = ?busy, ?input, "input dropped in external sub-phase");
                return;
            }
        };

        let context = Context { world, windows };
        match input {
            PrepareInput::Tap(position) => handler.on_tap(&context, position, out),
            PrepareInput::Choose(choice) => handler.on_choice(&context, choice, out),
            PrepareInput::Cancel => handler.on_cancel(&context, out),
        }
    }
}

fn reject(reason: InputRejection, out: &mut Vec<Command>) {
    out.push(Command::RejectInput { reason });
}

/// Map taps while nothing is being edited.
#[derive(Clone, Copy, Debug, Default)]
pub struct NormalHandler;

impl NormalHandler {
    fn tap_actor_slot(context: &Context<'_>, slot: &Slot, out: &mut Vec<Command>) {
        let world = context.world;
        if slot.deployed_actor().is_some() {
            if slot.is_locked() {
                out.push(Command::ShowStatus { slot: slot.id() });
            } else if context.windows.is_busy(Surface::ActorCommandStatus) {
                debug!(slot = slot.id().get(), "tap dropped while popup animates");
            } else {
                out.push(Command::SelectFloatingSlot { slot: slot.id() });
            }
            return;
        }

        let roster = query::roster(world);
        let addable = query::config(world).actor_commands && roster.can_add();
        match roster.next_candidate().filter(|_| addable) {
            Some(actor) => out.push(Command::AddActor {
                slot: slot.id(),
                actor,
            }),
            None => reject(InputRejection::AddUnavailable, out),
        }
    }
}

impl SubPhaseHandler for NormalHandler {
    fn on_tap(&self, context: &Context<'_>, position: TilePos, out: &mut Vec<Command>) {
        let Some(slot) = query::slot_at(context.world, position) else {
            reject(InputRejection::NotInteractive, out);
            return;
        };

        match slot.role() {
            SlotRole::Actor => Self::tap_actor_slot(context, slot, out),
            SlotRole::Enemy if slot.unit().is_some() && !slot.is_erased() => {
                out.push(Command::ShowStatus { slot: slot.id() });
            }
            SlotRole::PlayerEvent if slot.scripted() && !slot.is_erased() => {
                out.push(Command::StartSlotEvent { slot: slot.id() });
            }
            _ => reject(InputRejection::NotInteractive, out),
        }
    }
}

/// Choices made in the in-map command popup.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrepareCommandHandler;

impl SubPhaseHandler for PrepareCommandHandler {
    fn on_choice(&self, context: &Context<'_>, choice: PopupChoice, out: &mut Vec<Command>) {
        if context.windows.is_busy(Surface::PrepareCommand) {
            debug!(?choice, "choice dropped while popup animates");
            return;
        }
        let world = context.world;
        let Some(slot) = query::active_slot(world) else {
            reject(InputRejection::NoActiveSlot, out);
            return;
        };
        let roster = query::roster(world);

        match choice {
            PopupChoice::Exchange => out.push(Command::BeginExchange),
            PopupChoice::Remove if roster.can_remove() => out.push(Command::RemoveActor { slot }),
            PopupChoice::Remove => reject(InputRejection::RemoveUnavailable, out),
            PopupChoice::Status => out.push(Command::ShowStatus { slot }),
            PopupChoice::PartyMember(actor) if roster.is_remaining(actor) => {
                out.push(Command::ChangeActor { slot, actor });
            }
            PopupChoice::PartyMember(_) => reject(InputRejection::ActorUnavailable, out),
            PopupChoice::Cancel => out.push(Command::CancelPrepareCommand),
        }
    }

    fn on_cancel(&self, context: &Context<'_>, out: &mut Vec<Command>) {
        if context.windows.is_busy(Surface::PrepareCommand) {
            return;
        }
        out.push(Command::CancelPrepareCommand);
    }
}

/// Picks the second endpoint of a position exchange.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExchangeHandler;

impl SubPhaseHandler for ExchangeHandler {
    fn on_tap(&self, context: &Context<'_>, position: TilePos, out: &mut Vec<Command>) {
        let world = context.world;
        let Some(active) = query::active_slot(world) else {
            reject(InputRejection::NoActiveSlot, out);
            return;
        };
        let Some(slot) = query::slot_at(world, position).filter(|slot| slot.is_actor_slot())
        else {
            return;
        };

        if context.windows.is_busy(Surface::ActorCommandStatus) {
            reject(InputRejection::WindowBusy, out);
        } else if slot.id() == active {
            out.push(Command::CancelExchange);
        } else if slot.is_floating() {
            out.push(Command::ExchangePositions {
                first: active,
                second: slot.id(),
            });
        } else {
            reject(InputRejection::LockedSlot, out);
        }
    }

    fn on_cancel(&self, _context: &Context<'_>, out: &mut Vec<Command>) {
        out.push(Command::CancelExchange);
    }
}
