#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the battle preparation phase.

mod placement;
mod reconcile;
mod roster;
mod signals;
mod slots;
mod variables;

use battle_prepare_core::{
    ActorId, AddError, BattlePhase, Command, Event, ExchangeError, FormationError,
    InputRejection, MapLayout, PrepareConfig, RemoveError, RosterOverrides, ScriptTag,
    SignalPayload, SlotId, SlotRole, SubPhase, Surface, TilePos,
};
use tracing::{debug, info, warn};

pub use roster::RosterLedger;
pub use slots::Slot;

use signals::WindowSignals;
use slots::SlotRegistry;
use variables::Variables;

/// Tile highlighted while the player arranges the deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveTile {
    position: TilePos,
    exchange_origin: bool,
}

impl MoveTile {
    /// Tile being highlighted.
    #[must_use]
    pub const fn position(&self) -> TilePos {
        self.position
    }

    /// Reports whether the tile marks the first endpoint of an exchange.
    #[must_use]
    pub const fn exchange_origin(&self) -> bool {
        self.exchange_origin
    }
}

/// Represents the authoritative battle preparation state for one map.
#[derive(Debug)]
pub struct World {
    config: PrepareConfig,
    slots: SlotRegistry,
    roster: RosterLedger,
    battle_phase: BattlePhase,
    sub_phase: SubPhase,
    active_slot: Option<SlotId>,
    signals: WindowSignals,
    move_cache: Vec<MoveTile>,
    variables: Variables,
    menu_requested: bool,
    battle_actors: Vec<SlotId>,
}

impl World {
    /// Creates a world for the provided map, waiting for preparation to begin.
    #[must_use]
    pub fn new(layout: &MapLayout, config: PrepareConfig) -> Self {
        Self {
            config,
            slots: SlotRegistry::from_layout(layout),
            roster: RosterLedger::default(),
            battle_phase: BattlePhase::Initialize,
            sub_phase: SubPhase::Normal,
            active_slot: None,
            signals: WindowSignals::default(),
            move_cache: Vec::new(),
            variables: Variables::default(),
            menu_requested: false,
            battle_actors: Vec::new(),
        }
    }

    fn is_preparing(&self) -> bool {
        self.battle_phase == BattlePhase::BattlePrepare
    }

    fn set_battle_phase(&mut self, phase: BattlePhase, out_events: &mut Vec<Event>) {
        if self.battle_phase == phase {
            return;
        }
        info!(?phase, "battle phase changed");
        self.battle_phase = phase;
        out_events.push(Event::BattlePhaseChanged { phase });
    }

    fn set_sub_phase(&mut self, phase: SubPhase, out_events: &mut Vec<Event>) {
        if self.sub_phase == phase {
            return;
        }
        debug!(from = ?self.sub_phase, to = ?phase, "sub-phase changed");
        self.sub_phase = phase;
        out_events.push(Event::SubPhaseChanged { phase });
    }

    fn set_active_slot(&mut self, slot: Option<SlotId>, out_events: &mut Vec<Event>) {
        if self.active_slot == slot {
            return;
        }
        self.active_slot = slot;
        out_events.push(Event::ActiveSlotChanged { slot });
    }

    /// Clears the active slot and every popup, returning to `Normal`.
    fn return_to_normal(&mut self, out_events: &mut Vec<Event>) {
        self.set_active_slot(None, out_events);
        self.signals.clear_all(out_events);
        self.set_sub_phase(SubPhase::Normal, out_events);
    }

    fn payload_for(&self, slot: SlotId) -> Option<SignalPayload> {
        let slot = self.slots.get(slot)?;
        Some(SignalPayload {
            slot: slot.id(),
            unit: slot.unit(),
        })
    }

    fn rebuild_move_cache(&mut self) {
        self.move_cache = self
            .slots
            .iter()
            .filter(|slot| slot.is_floating())
            .map(|slot| MoveTile {
                position: slot.position(),
                exchange_origin: false,
            })
            .collect();
    }

    fn clear_move_cache(&mut self, out_events: &mut Vec<Event>) {
        self.move_cache.clear();
        out_events.push(Event::MoveCacheCleared);
    }

    /// Locked actors missing from the party, then the party, then stray deployed actors.
    ///
    /// Missing locked actors are listed last slot first.
    fn merged_party(&self, party: &[ActorId]) -> Vec<ActorId> {
        let mut merged: Vec<ActorId> = Vec::with_capacity(party.len());
        for actor in self
            .slots
            .iter()
            .rev()
            .filter(|slot| slot.is_locked())
            .filter_map(|slot| slot.template().locked_actor())
        {
            if !party.contains(&actor) && !merged.contains(&actor) {
                merged.push(actor);
            }
        }
        for actor in party.iter().copied() {
            if !merged.contains(&actor) {
                merged.push(actor);
            }
        }
        for actor in self.slots.deployed_actors() {
            if !merged.contains(&actor) {
                merged.push(actor);
            }
        }
        merged
    }

    fn report_roster(&self, out_events: &mut Vec<Event>) {
        out_events.push(Event::RosterChanged {
            current: self.roster.current_count(),
            min: self.roster.min_actor(),
            max: self.roster.max_actor(),
        });
    }

    fn begin_preparation(
        &mut self,
        party: &[ActorId],
        overrides: RosterOverrides,
        out_events: &mut Vec<Event>,
    ) {
        self.set_battle_phase(BattlePhase::BattlePrepare, out_events);
        self.return_to_normal(out_events);
        self.battle_actors.clear();

        self.roster = RosterLedger::begin(self.merged_party(party));
        self.roster.init_locked_and_bounds(&self.slots);
        self.roster.init_remaining(&self.slots);
        self.rebuild_move_cache();

        let alive = self.slots.deployed_actors().len();
        self.variables.set(
            self.config.actors_alive_variable,
            i64::try_from(alive).unwrap_or(i64::MAX),
        );

        if let Some(count) = overrides.min_actor {
            self.roster.set_min_actor(count);
        }
        if let Some(count) = overrides.max_actor {
            self.set_max_actor(count, out_events);
        }

        info!(
            eligible = self.roster.all_eligible().len(),
            current = self.roster.current_count(),
            min = self.roster.min_actor(),
            max = self.roster.max_actor(),
            "battle preparation started"
        );

        if self.config.auto_open_menu {
            self.menu_requested = true;
            out_events.push(Event::MenuOpenRequested);
        }
        self.report_roster(out_events);
    }

    fn collect_battle_actors(&mut self) {
        self.battle_actors = self
            .slots
            .iter()
            .filter(|slot| slot.deployed_actor().is_some())
            .map(Slot::id)
            .collect();
    }

    fn start_scripted(&self, role: SlotRole, tag: ScriptTag, out_events: &mut Vec<Event>) {
        for slot in self
            .slots
            .iter()
            .filter(|slot| slot.role() == role && slot.scripted() && !slot.is_erased())
        {
            debug!(slot = slot.id().get(), ?tag, "scripted content started");
            out_events.push(Event::ScriptedEventStarted {
                slot: slot.id(),
                tag,
            });
        }
    }

    fn finish_preparation(&mut self, out_events: &mut Vec<Event>) {
        self.start_scripted(SlotRole::AfterPrepare, ScriptTag::AfterPrepare, out_events);
        self.collect_battle_actors();
        self.return_to_normal(out_events);
        self.clear_move_cache(out_events);
        self.menu_requested = false;
        self.set_battle_phase(BattlePhase::ActorPhase, out_events);
        info!(deployed = self.battle_actors.len(), "battle preparation finished");
        out_events.push(Event::PreparationFinished {
            battle_actors: self.battle_actors.clone(),
        });
    }

    fn reject_input(&self, reason: InputRejection, out_events: &mut Vec<Event>) {
        debug!(?reason, "input rejected");
        out_events.push(Event::InputRejected { reason });
    }

    fn select_floating_slot(&mut self, slot: SlotId, out_events: &mut Vec<Event>) {
        let selectable = self.sub_phase == SubPhase::Normal
            && self
                .slots
                .get(slot)
                .is_some_and(|candidate| candidate.is_floating() && candidate.deployed_actor().is_some());
        let Some(payload) = self.payload_for(slot).filter(|_| selectable) else {
            self.reject_input(InputRejection::NotInteractive, out_events);
            return;
        };

        self.set_active_slot(Some(slot), out_events);
        self.signals
            .raise(Surface::ActorCommandStatus, payload, out_events);
        if self.config.actor_commands {
            self.signals.raise(Surface::PrepareCommand, payload, out_events);
            self.set_sub_phase(SubPhase::PrepareCommand, out_events);
        } else {
            self.begin_exchange(slot, out_events);
        }
    }

    fn show_status(&mut self, slot: SlotId, out_events: &mut Vec<Event>) {
        let allowed = matches!(self.sub_phase, SubPhase::Normal | SubPhase::PrepareCommand);
        let payload = self
            .payload_for(slot)
            .filter(|payload| allowed && payload.unit.is_some());
        let Some(payload) = payload else {
            self.reject_input(InputRejection::NotInteractive, out_events);
            return;
        };

        self.set_active_slot(Some(slot), out_events);
        self.signals.clear(Surface::PrepareCommand, out_events);
        self.signals.clear(Surface::ActorCommandStatus, out_events);
        self.signals.raise(Surface::Status, payload, out_events);
        self.set_sub_phase(SubPhase::StatusWindow, out_events);
    }

    fn start_slot_event(&mut self, slot: SlotId, out_events: &mut Vec<Event>) {
        let runnable = self.sub_phase == SubPhase::Normal
            && self.slots.get(slot).is_some_and(|candidate| {
                candidate.role() == SlotRole::PlayerEvent
                    && candidate.scripted()
                    && !candidate.is_erased()
            });
        if !runnable {
            self.reject_input(InputRejection::NotInteractive, out_events);
            return;
        }
        out_events.push(Event::ScriptedEventStarted {
            slot,
            tag: ScriptTag::PlayerEvent,
        });
    }

    fn begin_exchange(&mut self, slot: SlotId, out_events: &mut Vec<Event>) {
        let Some(origin) = self.slots.get(slot).map(Slot::position) else {
            return;
        };
        self.move_cache.push(MoveTile {
            position: origin,
            exchange_origin: true,
        });
        self.signals.clear(Surface::PrepareCommand, out_events);
        self.set_sub_phase(SubPhase::ExchangePosition, out_events);
    }

    fn exchange_positions(&mut self, first: SlotId, second: SlotId, out_events: &mut Vec<Event>) {
        if let Err(reason) = self.validate_exchange(first, second) {
            debug!(
                first = first.get(),
                second = second.get(),
                ?reason,
                "exchange rejected"
            );
            out_events.push(Event::ExchangeRejected {
                first,
                second,
                reason,
            });
            return;
        }

        let _ = self.slots.swap_positions(first, second);
        debug!(first = first.get(), second = second.get(), "positions exchanged");
        out_events.push(Event::PositionsExchanged { first, second });
        self.return_to_normal(out_events);
        self.rebuild_move_cache();
    }

    fn validate_exchange(&self, first: SlotId, second: SlotId) -> Result<(), ExchangeError> {
        if !self.is_preparing() {
            return Err(ExchangeError::InvalidPhase);
        }
        if first == second {
            return Err(ExchangeError::SameSlot);
        }
        let (Some(a), Some(b)) = (self.slots.get(first), self.slots.get(second)) else {
            return Err(ExchangeError::NotActorSlot);
        };
        if !a.is_actor_slot() || !b.is_actor_slot() {
            return Err(ExchangeError::NotActorSlot);
        }
        if a.is_locked() || b.is_locked() {
            return Err(ExchangeError::Locked);
        }
        Ok(())
    }

    fn cancel_exchange(&mut self, out_events: &mut Vec<Event>) {
        if self.sub_phase != SubPhase::ExchangePosition {
            return;
        }
        self.return_to_normal(out_events);
        self.clear_move_cache(out_events);
        self.rebuild_move_cache();
    }

    fn cancel_prepare_command(&mut self, out_events: &mut Vec<Event>) {
        if self.sub_phase != SubPhase::PrepareCommand {
            return;
        }
        self.return_to_normal(out_events);
    }

    fn toggle_formation_member(&mut self, actor: ActorId, out_events: &mut Vec<Event>) {
        if !self.is_preparing() {
            out_events.push(Event::FormationRejected {
                reason: FormationError::InvalidPhase,
            });
            return;
        }
        match self.roster.toggle(actor) {
            Ok(deployed) => out_events.push(Event::FormationToggled { actor, deployed }),
            Err(reason) => out_events.push(Event::FormationRejected { reason }),
        }
    }

    fn commit_formation(&mut self, out_events: &mut Vec<Event>) {
        let rejection = if !self.is_preparing() {
            Some(FormationError::InvalidPhase)
        } else if !self.roster.is_valid_count() {
            Some(FormationError::InvalidCount)
        } else {
            None
        };
        if let Some(reason) = rejection {
            out_events.push(Event::FormationRejected { reason });
            return;
        }

        self.reconcile_formation(out_events);
        out_events.push(Event::FormationCommitted);
        self.report_roster(out_events);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::BeginPreparation { party, overrides } => {
            world.begin_preparation(&party, overrides, out_events);
        }
        Command::SkipPreparation => {
            world.collect_battle_actors();
            world.set_battle_phase(BattlePhase::ActorPhase, out_events);
        }
        Command::FinishPreparation => {
            if world.is_preparing() {
                world.finish_preparation(out_events);
            } else {
                warn!(phase = ?world.battle_phase, "finish requested outside preparation");
            }
        }
        Command::RejectInput { reason } => world.reject_input(reason, out_events),
        Command::AcknowledgeSignal { surface } => world.signals.clear(surface, out_events),
        Command::AcknowledgeMenuOpened => world.menu_requested = false,
        command if !world.is_preparing() => {
            debug!(?command, "command ignored outside preparation");
            reject_outside_preparation(&command, out_events);
        }
        Command::SelectFloatingSlot { slot } => world.select_floating_slot(slot, out_events),
        Command::ShowStatus { slot } => world.show_status(slot, out_events),
        Command::StartSlotEvent { slot } => world.start_slot_event(slot, out_events),
        Command::AddActor { slot, actor } => world.request_add(slot, actor, out_events),
        Command::RemoveActor { slot } => world.request_remove(slot, out_events),
        Command::ChangeActor { slot, actor } => world.request_change(slot, actor, out_events),
        Command::BeginExchange => {
            if world.sub_phase == SubPhase::PrepareCommand {
                if let Some(slot) = world.active_slot {
                    world.begin_exchange(slot, out_events);
                }
            }
        }
        Command::ExchangePositions { first, second } => {
            world.exchange_positions(first, second, out_events);
        }
        Command::CancelExchange => world.cancel_exchange(out_events),
        Command::CancelPrepareCommand => world.cancel_prepare_command(out_events),
        Command::ResumeNormal => world.return_to_normal(out_events),
        Command::SetMaxActor { count } => {
            world.set_max_actor(count, out_events);
            world.report_roster(out_events);
        }
        Command::SetMinActor { count } => {
            world.roster.set_min_actor(count);
            world.report_roster(out_events);
        }
        Command::ToggleFormationMember { actor } => {
            world.toggle_formation_member(actor, out_events);
        }
        Command::CommitFormation => world.commit_formation(out_events),
        Command::RunPrepareEvents => {
            world.start_scripted(SlotRole::Prepare, ScriptTag::Prepare, out_events);
        }
    }
}

fn reject_outside_preparation(command: &Command, out_events: &mut Vec<Event>) {
    match *command {
        Command::AddActor { slot, .. } | Command::ChangeActor { slot, .. } => {
            out_events.push(Event::AddRejected {
                slot,
                reason: AddError::InvalidPhase,
            });
        }
        Command::RemoveActor { slot } => out_events.push(Event::RemoveRejected {
            slot,
            reason: RemoveError::InvalidPhase,
        }),
        Command::ExchangePositions { first, second } => {
            out_events.push(Event::ExchangeRejected {
                first,
                second,
                reason: ExchangeError::InvalidPhase,
            });
        }
        Command::ToggleFormationMember { .. } | Command::CommitFormation => {
            out_events.push(Event::FormationRejected {
                reason: FormationError::InvalidPhase,
            });
        }
        _ => {}
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use battle_prepare_core::{
        BattlePhase, MenuCommand, PopupChoice, PopupEntry, PrepareConfig, RefreshSignal, SlotId,
        SlotRole, SubPhase, Surface, TilePos, VariableId,
    };

    use super::{MoveTile, RosterLedger, Slot, World};

    /// Coarse battle phase.
    #[must_use]
    pub fn battle_phase(world: &World) -> BattlePhase {
        world.battle_phase
    }

    /// Interaction sub-phase within the battle.
    #[must_use]
    pub fn sub_phase(world: &World) -> SubPhase {
        world.sub_phase
    }

    /// Slot currently being edited, if any.
    #[must_use]
    pub fn active_slot(world: &World) -> Option<SlotId> {
        world.active_slot
    }

    /// Every slot in definition order.
    pub fn slots(world: &World) -> impl Iterator<Item = &Slot> {
        world.slots.iter()
    }

    /// Looks up a slot by identifier.
    #[must_use]
    pub fn slot(world: &World, id: SlotId) -> Option<&Slot> {
        world.slots.get(id)
    }

    /// First slot in definition order standing on the tile.
    #[must_use]
    pub fn slot_at(world: &World, position: TilePos) -> Option<&Slot> {
        world.slots.find_at(position)
    }

    /// Roster ledger for the current preparation phase.
    #[must_use]
    pub fn roster(world: &World) -> &RosterLedger {
        &world.roster
    }

    /// Current refresh signal of a presentation surface.
    #[must_use]
    pub fn signal(world: &World, surface: Surface) -> RefreshSignal {
        world.signals.get(surface)
    }

    /// Tiles highlighted while arranging the deployment.
    #[must_use]
    pub fn move_cache(world: &World) -> &[MoveTile] {
        &world.move_cache
    }

    /// Value of a game variable; unset variables read as zero.
    #[must_use]
    pub fn variable(world: &World, id: VariableId) -> i64 {
        world.variables.get(id)
    }

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &PrepareConfig {
        &world.config
    }

    /// Reports whether the main menu should be opened automatically.
    #[must_use]
    pub fn menu_open_requested(world: &World) -> bool {
        world.menu_requested
    }

    /// Slots holding the actors that take part in the battle.
    #[must_use]
    pub fn battle_actors(world: &World) -> &[SlotId] {
        &world.battle_actors
    }

    /// Reports whether the call menu must stay closed.
    #[must_use]
    pub fn call_menu_suppressed(world: &World) -> bool {
        let battle = matches!(
            world.battle_phase,
            BattlePhase::BattlePrepare | BattlePhase::ActorPhase
        );
        !battle || world.sub_phase != SubPhase::Normal
    }

    /// Reports whether the player cursor may move.
    #[must_use]
    pub fn player_can_move(world: &World) -> bool {
        world.sub_phase != SubPhase::PrepareCommand
    }

    /// Entries of the in-map command popup for the active slot.
    #[must_use]
    pub fn prepare_command_entries(world: &World) -> Vec<PopupEntry> {
        if world.sub_phase != SubPhase::PrepareCommand {
            return Vec::new();
        }
        let mut entries: Vec<PopupEntry> = world
            .roster
            .remaining()
            .iter()
            .map(|actor| PopupEntry {
                choice: PopupChoice::PartyMember(*actor),
                enabled: true,
            })
            .collect();
        entries.push(PopupEntry {
            choice: PopupChoice::Exchange,
            enabled: true,
        });
        entries.push(PopupEntry {
            choice: PopupChoice::Status,
            enabled: true,
        });
        entries.push(PopupEntry {
            choice: PopupChoice::Remove,
            enabled: world.roster.can_remove(),
        });
        entries
    }

    /// Commands offered by the main menu during preparation.
    #[must_use]
    pub fn menu_commands(world: &World) -> Vec<MenuCommand> {
        if world.battle_phase != BattlePhase::BattlePrepare {
            return Vec::new();
        }
        let mut commands = vec![
            MenuCommand::FinishPrepare,
            MenuCommand::Formation,
            MenuCommand::Position,
        ];
        if world
            .slots
            .iter()
            .any(|slot| slot.role() == SlotRole::Prepare && !slot.is_erased())
        {
            commands.push(MenuCommand::PrepareEvent);
        }
        commands
    }
}
