#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the battle preparation engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems translate player input into
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that systems and presentation layers react to. Nothing in here mutates
//! state on its own.

use serde::{Deserialize, Serialize};

pub mod meta;
pub mod settings;

pub use meta::{MapLayout, MetadataError, RawSlot, SlotDefinition};
pub use settings::{PrepareSettings, RosterOverrides};

/// Unique identifier assigned to a playable actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an enemy unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a deployment slot authored on the map.
///
/// Slot identifiers double as the slot-definition order: lower identifiers
/// were authored first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a new slot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Key into the game's numeric variable store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariableId(u32);

impl VariableId {
    /// Creates a new variable key.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the key.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Template binding stored on an actor slot.
///
/// Zero marks a floating slot that any eligible actor may occupy. Any other
/// value locks the slot to the actor with that identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(u32);

impl TemplateId {
    /// Template of a floating slot.
    pub const FLOATING: Self = Self(0);

    /// Creates a new template identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the template.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Reports whether the template leaves the slot unbound.
    #[must_use]
    pub const fn is_floating(&self) -> bool {
        self.0 == 0
    }

    /// Actor permanently bound to the slot, if any.
    #[must_use]
    pub const fn locked_actor(&self) -> Option<ActorId> {
        if self.0 == 0 {
            None
        } else {
            Some(ActorId::new(self.0))
        }
    }
}

/// Location of a map tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    x: u32,
    y: u32,
}

impl TilePos {
    /// Creates a new tile position.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the tile.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the tile.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }
}

/// Battler bound to a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Playable actor.
    Actor(ActorId),
    /// Enemy battler.
    Enemy(EnemyId),
}

impl Unit {
    /// Actor identifier when the unit is playable.
    #[must_use]
    pub const fn actor(&self) -> Option<ActorId> {
        match self {
            Self::Actor(actor) => Some(*actor),
            Self::Enemy(_) => None,
        }
    }
}

/// Role tag authored on a map slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotRole {
    /// Deployment position for a playable actor.
    Actor,
    /// Position held by an enemy battler.
    Enemy,
    /// Interactive event the player may trigger by tapping it.
    PlayerEvent,
    /// Scripted content run from the menu's prepare command.
    Prepare,
    /// Scripted content run once preparation finishes.
    AfterPrepare,
    /// Slot without a recognised role.
    Untyped,
}

/// Typed, validated metadata attached to a slot at map load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotDescriptor {
    role: SlotRole,
    template: TemplateId,
    scripted: bool,
}

impl SlotDescriptor {
    /// Creates a descriptor from already-validated parts.
    #[must_use]
    pub const fn new(role: SlotRole, template: TemplateId, scripted: bool) -> Self {
        Self {
            role,
            template,
            scripted,
        }
    }

    /// Role authored on the slot.
    #[must_use]
    pub const fn role(&self) -> SlotRole {
        self.role
    }

    /// Template binding of the slot. Always floating for non-actor roles.
    #[must_use]
    pub const fn template(&self) -> TemplateId {
        self.template
    }

    /// Reports whether the slot carries runnable scripted content.
    #[must_use]
    pub const fn scripted(&self) -> bool {
        self.scripted
    }
}

/// Coarse battle phase driven by the surrounding game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattlePhase {
    /// Battle data is being set up; no preparation input is accepted.
    Initialize,
    /// Roster and formation are being prepared.
    BattlePrepare,
    /// Preparation finished and the turn loop owns the battle.
    ActorPhase,
}

/// Fine-grained interaction state within a battle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubPhase {
    /// Waiting for the player to tap a slot.
    Normal,
    /// The in-map command popup lists actions for the active slot.
    PrepareCommand,
    /// Waiting for a second slot to swap positions with the active slot.
    ExchangePosition,
    /// A status window owned by an external flow is visible.
    StatusWindow,
    /// External movement selection.
    ActorMove,
    /// External target selection.
    ActorTarget,
    /// External action resolution.
    InvokeAction,
    /// External actor command window.
    ActorCommandWindow,
    /// External battle window.
    BattleWindow,
}

impl SubPhase {
    /// Reports whether the sub-phase belongs to a flow outside preparation.
    ///
    /// The preparation state machine never advances through these states on
    /// its own.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        !matches!(
            self,
            Self::Normal | Self::PrepareCommand | Self::ExchangePosition
        )
    }
}

/// Presentation surfaces the core signals through refresh flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Surface {
    /// In-map popup listing per-actor preparation commands.
    PrepareCommand,
    /// Secondary status popup shown next to the command popup.
    ActorCommandStatus,
    /// Full status window.
    Status,
}

impl Surface {
    /// Every surface, in a stable order.
    pub const ALL: [Surface; 3] = [Self::PrepareCommand, Self::ActorCommandStatus, Self::Status];
}

/// Data a surface should display once it refreshes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalPayload {
    /// Slot the surface describes.
    pub slot: SlotId,
    /// Unit bound to the slot when the signal was raised.
    pub unit: Option<Unit>,
}

/// Refresh flag for a single surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefreshSignal {
    /// Nothing should be visible on the surface.
    #[default]
    Cleared,
    /// The payload should now be visible on the surface.
    Raised(SignalPayload),
}

impl RefreshSignal {
    /// Reports whether the surface should currently be visible.
    #[must_use]
    pub const fn is_raised(&self) -> bool {
        matches!(self, Self::Raised(_))
    }

    /// Payload attached to a raised signal.
    #[must_use]
    pub const fn payload(&self) -> Option<SignalPayload> {
        match self {
            Self::Raised(payload) => Some(*payload),
            Self::Cleared => None,
        }
    }
}

/// Entries offered by the in-map command popup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PopupChoice {
    /// Replace the active slot's occupant with the provided benched actor.
    PartyMember(ActorId),
    /// Start swapping positions with another slot.
    Exchange,
    /// Open the status window for the active slot.
    Status,
    /// Bench the active slot's occupant.
    Remove,
    /// Close the popup without acting.
    Cancel,
}

/// Popup entry paired with its availability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PopupEntry {
    /// Choice the entry submits.
    pub choice: PopupChoice,
    /// Whether selecting the entry is currently permitted.
    pub enabled: bool,
}

/// Commands available in the main menu while preparing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuCommand {
    /// Finish preparation and start the battle.
    FinishPrepare,
    /// Open the formation menu.
    Formation,
    /// Return to the map to arrange positions.
    Position,
    /// Run scripted prepare content. Only offered when such content exists.
    PrepareEvent,
}

/// Tag attached to scripted content announced by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptTag {
    /// Content attached to a player-triggered event slot.
    PlayerEvent,
    /// Content run from the menu's prepare command.
    Prepare,
    /// Content run once preparation finishes.
    AfterPrepare,
}

/// Tunables that shape preparation behaviour for a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    /// Enables the in-map command popup and tap-to-add on empty slots.
    ///
    /// When disabled, tapping a floating slot starts an exchange directly and
    /// the roster can only change through the formation menu.
    pub actor_commands: bool,
    /// Requests the main menu to open automatically once preparation begins.
    pub auto_open_menu: bool,
    /// Variable holding the number of actors alive on the field.
    pub actors_alive_variable: VariableId,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            actor_commands: true,
            auto_open_menu: true,
            actors_alive_variable: VariableId::new(1),
        }
    }
}

/// Reasons an add request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddError {
    /// The battle is not in the preparation phase.
    InvalidPhase,
    /// Adding through the map is disabled by configuration.
    Disabled,
    /// No slot with the provided identifier exists, or it is not an actor slot.
    NotActorSlot,
    /// The slot already holds a deployed actor.
    Occupied,
    /// The slot has no occupant to replace.
    NoOccupant,
    /// The slot is bound to a locked actor.
    Locked,
    /// The actor is not on the bench.
    Unavailable,
    /// The roster is already at its maximum headcount.
    RosterFull,
}

/// Reasons a remove request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoveError {
    /// The battle is not in the preparation phase.
    InvalidPhase,
    /// No slot with the provided identifier exists, or it is not an actor slot.
    NotActorSlot,
    /// The slot holds no deployed actor.
    Vacant,
    /// The slot is bound to a locked actor.
    Locked,
    /// Removing would drop the roster below its minimum headcount.
    BelowMinimum,
}

/// Reasons a position exchange may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeError {
    /// The battle is not in the preparation phase.
    InvalidPhase,
    /// Both endpoints refer to the same slot.
    SameSlot,
    /// An endpoint is missing or is not an actor slot.
    NotActorSlot,
    /// An endpoint is bound to a locked actor.
    Locked,
}

/// Reasons a formation menu request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationError {
    /// The battle is not in the preparation phase.
    InvalidPhase,
    /// Locked actors always stay deployed.
    LockedActor,
    /// The actor is not eligible for this battle.
    UnknownActor,
    /// The deployed headcount violates the minimum or maximum.
    InvalidCount,
}

/// Reasons player input was refused with an invalid-action cue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputRejection {
    /// Nothing interactive exists at the tapped tile.
    NotInteractive,
    /// The tapped slot is bound to a locked actor.
    LockedSlot,
    /// No actor can be added right now.
    AddUnavailable,
    /// No actor can be removed right now.
    RemoveUnavailable,
    /// The chosen actor is not on the bench.
    ActorUnavailable,
    /// A popup is still animating.
    WindowBusy,
    /// No slot is being edited.
    NoActiveSlot,
    /// The formation cannot be closed with the current headcount.
    InvalidRosterCount,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Enters the preparation phase for a new battle.
    BeginPreparation {
        /// Party members in party order.
        party: Vec<ActorId>,
        /// One-shot headcount overrides applied after the defaults.
        overrides: RosterOverrides,
    },
    /// Skips preparation and hands the battle straight to the turn loop.
    SkipPreparation,
    /// Leaves preparation, committing the deployed roster.
    FinishPreparation,
    /// Opens the command popup for a floating slot.
    SelectFloatingSlot {
        /// Slot the player tapped.
        slot: SlotId,
    },
    /// Opens the status window for a slot.
    ShowStatus {
        /// Slot whose battler should be described.
        slot: SlotId,
    },
    /// Runs the scripted content attached to a player-event slot.
    StartSlotEvent {
        /// Slot carrying the content.
        slot: SlotId,
    },
    /// Deploys a benched actor into an empty actor slot.
    AddActor {
        /// Empty slot receiving the actor.
        slot: SlotId,
        /// Benched actor to deploy.
        actor: ActorId,
    },
    /// Benches the actor occupying a slot.
    RemoveActor {
        /// Slot whose occupant should be benched.
        slot: SlotId,
    },
    /// Replaces the occupant of a slot with a benched actor.
    ChangeActor {
        /// Occupied slot to update.
        slot: SlotId,
        /// Benched actor taking the slot.
        actor: ActorId,
    },
    /// Starts an exchange from the active slot.
    BeginExchange,
    /// Swaps the positions of two floating slots.
    ExchangePositions {
        /// Slot that started the exchange.
        first: SlotId,
        /// Slot picked as the second endpoint.
        second: SlotId,
    },
    /// Abandons an exchange in progress.
    CancelExchange,
    /// Closes the command popup without acting.
    CancelPrepareCommand,
    /// Returns from an external flow to the normal sub-phase.
    ResumeNormal,
    /// Updates the maximum headcount, benching floating occupants if needed.
    SetMaxActor {
        /// New maximum.
        count: usize,
    },
    /// Updates the minimum headcount.
    SetMinActor {
        /// New minimum.
        count: usize,
    },
    /// Toggles an actor between the bench and the to-be-deployed set.
    ToggleFormationMember {
        /// Actor whose membership flips.
        actor: ActorId,
    },
    /// Applies the formation menu's toggle state to the map slots.
    CommitFormation,
    /// Runs every scripted prepare slot.
    RunPrepareEvents,
    /// Marks a surface's refresh signal as consumed.
    AcknowledgeSignal {
        /// Surface that consumed its payload.
        surface: Surface,
    },
    /// Marks the automatic menu-open request as handled.
    AcknowledgeMenuOpened,
    /// Reports refused input so presentation can play the invalid cue.
    RejectInput {
        /// Reason the input was refused.
        reason: InputRejection,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that the coarse battle phase changed.
    BattlePhaseChanged {
        /// Phase that became active.
        phase: BattlePhase,
    },
    /// Announces that the interaction sub-phase changed.
    SubPhaseChanged {
        /// Sub-phase that became active.
        phase: SubPhase,
    },
    /// Announces that the slot being edited changed.
    ActiveSlotChanged {
        /// Slot now being edited, if any.
        slot: Option<SlotId>,
    },
    /// Announces that a surface's refresh signal changed.
    SignalChanged {
        /// Surface the signal belongs to.
        surface: Surface,
        /// New signal state.
        signal: RefreshSignal,
    },
    /// Reports the deployed headcount after a structural change.
    RosterChanged {
        /// Number of deployed eligible actors.
        current: usize,
        /// Minimum headcount.
        min: usize,
        /// Maximum headcount.
        max: usize,
    },
    /// Confirms that an actor was deployed into a slot.
    ActorAdded {
        /// Slot receiving the actor.
        slot: SlotId,
        /// Deployed actor.
        actor: ActorId,
    },
    /// Confirms that an actor was benched.
    ActorRemoved {
        /// Slot that was vacated.
        slot: SlotId,
        /// Benched actor.
        actor: ActorId,
    },
    /// Confirms that a slot's occupant was replaced.
    ActorChanged {
        /// Slot that changed hands.
        slot: SlotId,
        /// Actor that was benched.
        previous: ActorId,
        /// Actor that took the slot.
        actor: ActorId,
    },
    /// Asks the actor store to reset an actor's combat resources.
    ActorResourcesReset {
        /// Actor whose resources return to their defaults.
        actor: ActorId,
    },
    /// Asks presentation to drop the turn indicator decorating a slot.
    TurnIndicatorDetached {
        /// Slot whose decoration should go.
        slot: SlotId,
    },
    /// Confirms that two slots swapped positions.
    PositionsExchanged {
        /// Slot that started the exchange.
        first: SlotId,
        /// Slot picked as the second endpoint.
        second: SlotId,
    },
    /// Reports that an add request was rejected.
    AddRejected {
        /// Slot named in the request.
        slot: SlotId,
        /// Specific reason the add failed.
        reason: AddError,
    },
    /// Reports that a remove request was rejected.
    RemoveRejected {
        /// Slot named in the request.
        slot: SlotId,
        /// Specific reason the removal failed.
        reason: RemoveError,
    },
    /// Reports that an exchange request was rejected.
    ExchangeRejected {
        /// Slot that started the exchange.
        first: SlotId,
        /// Slot picked as the second endpoint.
        second: SlotId,
        /// Specific reason the exchange failed.
        reason: ExchangeError,
    },
    /// Reports that a formation request was rejected.
    FormationRejected {
        /// Specific reason the request failed.
        reason: FormationError,
    },
    /// Confirms a formation toggle.
    FormationToggled {
        /// Actor whose membership flipped.
        actor: ActorId,
        /// Whether the actor is now marked for deployment.
        deployed: bool,
    },
    /// Confirms that the formation toggle state was applied to the map.
    FormationCommitted,
    /// Reports refused input so presentation can play the invalid cue.
    InputRejected {
        /// Reason the input was refused.
        reason: InputRejection,
    },
    /// Asks the script runner to start a slot's content.
    ScriptedEventStarted {
        /// Slot carrying the content.
        slot: SlotId,
        /// Tag the content was started under.
        tag: ScriptTag,
    },
    /// Announces that transient move and range caches were cleared.
    MoveCacheCleared,
    /// Asks presentation to open the main menu.
    MenuOpenRequested,
    /// Confirms that preparation ended and the battle may start.
    PreparationFinished {
        /// Slots holding the actors that take part in the battle.
        battle_actors: Vec<SlotId>,
    },
}
