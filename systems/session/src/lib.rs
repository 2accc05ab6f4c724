#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Owned preparation session wiring the systems to the world.
//!
//! A session is the single writer of its [`World`]: every input is turned
//! into commands by a pure system and applied before the call returns.

use std::mem;

use battle_prepare_core::{
    ActorId, Command, Event, PopupChoice, PrepareSettings, SlotId, Surface, TilePos,
};
use battle_prepare_system_formation::{Formation, FormationInput};
use battle_prepare_system_prepare::{Handlers, PrepareInput, PreparePhase, WindowActivity};
use battle_prepare_world::{self as world, query, World};
use thiserror::Error;
use tracing::{info, warn};

/// Errors reported by session lifecycle operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The session is not in the preparing state.
    #[error("preparation is not running (session is {state:?})")]
    NotActive {
        /// State the session was in.
        state: SessionState,
    },
    /// The deployed headcount is outside the allowed bounds.
    #[error("{current} actors deployed, between {min} and {max} required")]
    InvalidRosterCount {
        /// Number of deployed actors.
        current: usize,
        /// Minimum headcount.
        min: usize,
        /// Maximum headcount.
        max: usize,
    },
}

/// Lifecycle of a preparation session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Created but not begun.
    Idle,
    /// Accepting player input.
    Preparing,
    /// Preparation was disabled; the battle started immediately.
    Skipped,
    /// The roster was committed and the battle handed off.
    Committed,
    /// The session was discarded without committing.
    Aborted,
}

/// Explicitly owned preparation session.
#[derive(Debug)]
pub struct PrepareSession {
    world: World,
    phase: PreparePhase,
    formation: Formation,
    state: SessionState,
    events: Vec<Event>,
}

impl PrepareSession {
    /// Wraps a freshly loaded world using the stock sub-phase handlers.
    #[must_use]
    pub fn new(world: World) -> Self {
        Self::with_handlers(world, Handlers::default())
    }

    /// Wraps a world using caller-provided sub-phase handlers.
    #[must_use]
    pub fn with_handlers(world: World, handlers: Handlers) -> Self {
        Self {
            world,
            phase: PreparePhase::with_handlers(handlers),
            formation: Formation::new(),
            state: SessionState::Idle,
            events: Vec::new(),
        }
    }

    /// World owned by the session.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Formation menu driver, for listing its rows.
    #[must_use]
    pub const fn formation(&self) -> &Formation {
        &self.formation
    }

    /// Starts the battle, entering preparation unless the settings disable it.
    ///
    /// Pending headcount overrides are consumed either way.
    pub fn begin(
        &mut self,
        party: Vec<ActorId>,
        settings: &mut PrepareSettings,
    ) -> Result<SessionState, SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::NotActive { state: self.state });
        }
        let overrides = settings.take_overrides();
        if settings.is_enabled() {
            self.pump(Command::BeginPreparation { party, overrides });
            self.state = SessionState::Preparing;
        } else {
            info!("preparation disabled, starting battle directly");
            self.pump(Command::SkipPreparation);
            self.state = SessionState::Skipped;
        }
        Ok(self.state)
    }

    /// Routes a map tap through the state machine.
    pub fn tap(
        &mut self,
        position: TilePos,
        windows: &dyn WindowActivity,
    ) -> Result<(), SessionError> {
        self.route(PrepareInput::Tap(position), windows)
    }

    /// Routes a command popup choice through the state machine.
    pub fn choose(
        &mut self,
        choice: PopupChoice,
        windows: &dyn WindowActivity,
    ) -> Result<(), SessionError> {
        self.route(PrepareInput::Choose(choice), windows)
    }

    /// Routes the cancel input through the state machine.
    pub fn cancel(&mut self, windows: &dyn WindowActivity) -> Result<(), SessionError> {
        self.route(PrepareInput::Cancel, windows)
    }

    /// Toggles an actor in the formation menu.
    pub fn toggle_member(&mut self, actor: ActorId) -> Result<(), SessionError> {
        self.drive_formation(FormationInput::Toggle(actor))
    }

    /// Attempts to close the formation menu, applying its toggles on success.
    pub fn close_formation(&mut self) -> Result<(), SessionError> {
        self.drive_formation(FormationInput::Close)
    }

    /// Changes the maximum headcount mid-preparation.
    pub fn set_max_actor(&mut self, count: usize) -> Result<(), SessionError> {
        self.ensure_preparing()?;
        self.pump(Command::SetMaxActor { count });
        Ok(())
    }

    /// Changes the minimum headcount mid-preparation.
    pub fn set_min_actor(&mut self, count: usize) -> Result<(), SessionError> {
        self.ensure_preparing()?;
        self.pump(Command::SetMinActor { count });
        Ok(())
    }

    /// Runs the content of every scripted prepare slot.
    pub fn run_prepare_events(&mut self) -> Result<(), SessionError> {
        self.ensure_preparing()?;
        self.pump(Command::RunPrepareEvents);
        Ok(())
    }

    /// Marks a surface's payload as consumed by presentation.
    pub fn acknowledge(&mut self, surface: Surface) {
        self.pump(Command::AcknowledgeSignal { surface });
    }

    /// Returns from an external sub-phase such as the status window.
    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.ensure_preparing()?;
        self.pump(Command::ResumeNormal);
        Ok(())
    }

    /// Commits the roster and hands the battle off to the turn loop.
    ///
    /// Returns the slots whose actors take part in the battle.
    pub fn commit(&mut self) -> Result<Vec<SlotId>, SessionError> {
        self.ensure_preparing()?;
        let roster = query::roster(&self.world);
        if !roster.is_valid_count() {
            let error = SessionError::InvalidRosterCount {
                current: roster.current_count(),
                min: roster.min_actor(),
                max: roster.max_actor(),
            };
            warn!(%error, "commit refused");
            return Err(error);
        }

        self.pump(Command::FinishPreparation);
        self.state = SessionState::Committed;
        Ok(query::battle_actors(&self.world).to_vec())
    }

    /// Discards the session without committing the roster.
    pub fn abort(&mut self) {
        if self.state == SessionState::Preparing {
            info!("preparation aborted");
            self.state = SessionState::Aborted;
        }
    }

    /// Removes and returns every event broadcast since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        mem::take(&mut self.events)
    }

    fn ensure_preparing(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Preparing => Ok(()),
            state => Err(SessionError::NotActive { state }),
        }
    }

    fn route(
        &mut self,
        input: PrepareInput,
        windows: &dyn WindowActivity,
    ) -> Result<(), SessionError> {
        self.ensure_preparing()?;
        let mut commands = Vec::new();
        self.phase.handle(&self.world, input, windows, &mut commands);
        self.pump_all(commands);
        Ok(())
    }

    fn drive_formation(&mut self, input: FormationInput) -> Result<(), SessionError> {
        self.ensure_preparing()?;
        let mut commands = Vec::new();
        self.formation.handle(&self.world, input, &mut commands);
        self.pump_all(commands);
        Ok(())
    }

    fn pump(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.events);
    }

    fn pump_all(&mut self, commands: Vec<Command>) {
        for command in commands {
            self.pump(command);
        }
    }
}
