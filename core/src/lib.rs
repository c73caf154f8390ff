#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Castle Raid engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative match, and pure systems. Adapters translate device input into
//! [`InputEvent`] values, the match dispatches them to the current actor and
//! then broadcasts [`Event`] values describing what happened. Systems consume
//! event streams and immutable [`ActorView`] snapshots; renderers consume the
//! same snapshots to draw frames.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Castle Raid.";

/// Number of discrete actions an actor may spend during a single turn unless configured otherwise.
pub const DEFAULT_ACTIONS_PER_TURN: u32 = 5;

/// Abstract input events produced by an input source once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputEvent {
    /// Requests that the match terminates.
    Quit,
    /// Confirms the current prompt; an active actor spends one action waiting.
    Confirm,
    /// Cancels an open power selection.
    Cancel,
    /// Requests a single-cell move in the provided direction.
    Move(Direction),
    /// Reports that an alphanumeric key was pressed.
    SelectKey(char),
}

/// Cardinal movement directions available to actors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
}

impl Direction {
    /// Column and row delta produced by a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

/// Location of a single grid cell expressed as column (`i`) and row (`j`) coordinates.
///
/// Coordinates are signed so that a step off the top or left edge produces a
/// representable, and therefore rejectable, destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the neighbouring cell reached by a single step in `direction`.
    #[must_use]
    pub const fn stepped(self, direction: Direction) -> Self {
        let (column_delta, row_delta) = direction.delta();
        Self {
            column: self.column.saturating_add(column_delta),
            row: self.row.saturating_add(row_delta),
        }
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Immutable playing field bounds.
///
/// Legal cells span `[0, max_column] × [0, max_row]`, both ends inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    max_column: u16,
    max_row: u16,
}

impl Grid {
    /// Creates a grid whose largest legal indices are `max_column` and `max_row`.
    #[must_use]
    pub const fn new(max_column: u16, max_row: u16) -> Self {
        Self {
            max_column,
            max_row,
        }
    }

    /// Creates a grid spanning `width` columns and `height` rows.
    ///
    /// Returns `None` when either dimension is zero, since such a grid has no
    /// legal cell at all.
    #[must_use]
    pub fn from_dimensions(width: u16, height: u16) -> Option<Self> {
        let max_column = width.checked_sub(1)?;
        let max_row = height.checked_sub(1)?;
        Some(Self::new(max_column, max_row))
    }

    /// Largest legal column index.
    #[must_use]
    pub const fn max_column(&self) -> u16 {
        self.max_column
    }

    /// Largest legal row index.
    #[must_use]
    pub const fn max_row(&self) -> u16 {
        self.max_row
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.max_column as u32 + 1
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.max_row as u32 + 1
    }

    /// Total number of legal cells.
    #[must_use]
    pub const fn cell_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Reports whether both coordinates of `cell` fall within the grid bounds.
    #[must_use]
    pub fn is_legal(&self, cell: CellCoord) -> bool {
        cell.column() >= 0
            && cell.row() >= 0
            && cell.column() <= i32::from(self.max_column)
            && cell.row() <= i32::from(self.max_row)
    }

    /// Iterates over every legal cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let max_column = i32::from(self.max_column);
        let max_row = i32::from(self.max_row);
        (0..=max_row).flat_map(move |row| (0..=max_column).map(move |column| CellCoord::new(column, row)))
    }
}

/// Unique identifier assigned to an actor at match setup.
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

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor #{}", self.0)
    }
}

/// The two opposing sides of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Castle defenders.
    Unicorn,
    /// Raiders.
    Robot,
}

impl Faction {
    /// Reports whether members of `self` may target members of `other`.
    #[must_use]
    pub fn opposes(self, other: Faction) -> bool {
        self != other
    }

    /// Human-readable faction name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unicorn => "unicorn",
            Self::Robot => "robot",
        }
    }
}

/// Opaque sprite handle supplied by the asset provider and stored per actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteHandle(u32);

impl SpriteHandle {
    /// Wraps a provider-defined handle value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the provider-defined handle value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Timed statuses that powers can attach to actors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Traps the target inside a floating bubble.
    Bubble,
}

impl EffectKind {
    /// Number of target turns the effect persists through once attached.
    #[must_use]
    pub const fn duration_turns(self) -> u32 {
        match self {
            Self::Bubble => 3,
        }
    }

    /// Human-readable effect name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bubble => "bubble",
        }
    }
}

/// Targetable capabilities an actor may invoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerKind {
    /// Encases an opposing actor in a bubble.
    Bubble,
}

impl PowerKind {
    /// Key that opens this power's target selection while the owner is active.
    #[must_use]
    pub const fn trigger_key(self) -> char {
        match self {
            Self::Bubble => 'b',
        }
    }

    /// Effect applied to the selected target.
    #[must_use]
    pub const fn effect(self) -> EffectKind {
        match self {
            Self::Bubble => EffectKind::Bubble,
        }
    }

    /// Human-readable power name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bubble => "Bubble",
        }
    }
}

/// Lifecycle states of an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorState {
    /// Not the current actor, or out of budget.
    Idle,
    /// Current actor with budget left, awaiting an action.
    Active,
    /// Mid-flight after a legal move; discrete actions are blocked.
    Moving,
}

/// Sub-states of a power's selection protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerState {
    /// Not in use.
    Idle,
    /// Waiting for a target key or a cancel.
    Selecting,
    /// A target was chosen; resolution completes on the owner's next tick.
    Acting,
}

/// Reasons a move request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum MoveRejection {
    /// The destination lies outside the grid.
    #[error("destination is off the map")]
    OffGrid,
    /// Another actor already stands on the destination.
    #[error("destination is occupied by {occupant}")]
    Occupied {
        /// Actor standing on the destination cell.
        occupant: ActorId,
    },
}

/// Reasons an effect stopped being active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectEndCause {
    /// The remaining duration reached zero.
    Expired,
    /// A newer effect was attached to the same target.
    Replaced,
}

/// Events broadcast by the match after processing input or a tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// An actor became the rotation head and received a fresh budget.
    TurnStarted {
        /// Actor whose turn began.
        actor: ActorId,
        /// Turn counter value for the new turn.
        turn: u64,
    },
    /// An actor exhausted its budget and was rotated to the tail.
    TurnEnded {
        /// Actor whose turn ended.
        actor: ActorId,
        /// Turn counter value of the finished turn.
        turn: u64,
    },
    /// Confirms that an actor started moving between two cells.
    ActorMoved {
        /// Actor that moved.
        actor: ActorId,
        /// Cell the actor occupied before moving.
        from: CellCoord,
        /// Cell the actor occupies after moving.
        to: CellCoord,
    },
    /// Reports that a move request was rejected.
    MoveRejected {
        /// Actor that attempted to move.
        actor: ActorId,
        /// Requested destination.
        destination: CellCoord,
        /// Specific reason the move failed.
        reason: MoveRejection,
    },
    /// A budget-consuming action completed.
    ActionFinished {
        /// Actor that completed the action.
        actor: ActorId,
        /// Budget remaining afterwards.
        actions_left: u32,
    },
    /// An actor spent an action without acting.
    ActionForfeited {
        /// Actor that waited.
        actor: ActorId,
        /// Budget remaining afterwards.
        actions_left: u32,
    },
    /// A power opened its target selection.
    SelectionStarted {
        /// Actor wielding the power.
        actor: ActorId,
        /// Power being selected for.
        power: PowerKind,
        /// Number of labelled candidate targets.
        candidates: usize,
    },
    /// A power selection was cancelled without effect.
    SelectionCancelled {
        /// Actor wielding the power.
        actor: ActorId,
        /// Power whose selection closed.
        power: PowerKind,
    },
    /// A power resolved against a chosen target.
    PowerResolved {
        /// Actor wielding the power.
        actor: ActorId,
        /// Power that resolved.
        power: PowerKind,
        /// Target the power acted upon.
        target: ActorId,
    },
    /// An effect became active on a target.
    EffectAttached {
        /// Actor carrying the effect.
        target: ActorId,
        /// Kind of effect attached.
        kind: EffectKind,
        /// Number of target turns the effect lasts.
        turns: u32,
    },
    /// An effect stopped being active.
    EffectEnded {
        /// Actor that carried the effect.
        target: ActorId,
        /// Kind of effect that ended.
        kind: EffectKind,
        /// Why the effect ended.
        cause: EffectEndCause,
    },
    /// The match was terminated by a quit request.
    MatchEnded {
        /// Turn counter value when the match ended.
        turn: u64,
    },
}

/// Continuous offset of an actor's drawn position from its cell, in cell units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayOffset {
    /// Horizontal offset in cells.
    pub columns: f32,
    /// Vertical offset in cells.
    pub rows: f32,
}

impl DisplayOffset {
    /// Offset that places the actor exactly on its cell.
    pub const ZERO: Self = Self {
        columns: 0.0,
        rows: 0.0,
    };
}

/// Immutable representation of an active effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectSnapshot {
    /// Kind of the effect.
    pub kind: EffectKind,
    /// Target turns the effect still persists through after the current one.
    pub turns_remaining: u32,
}

/// Immutable representation of a single actor's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorSnapshot {
    /// Unique identifier assigned to the actor.
    pub id: ActorId,
    /// Display name.
    pub name: String,
    /// Side the actor fights for.
    pub faction: Faction,
    /// Opaque sprite handle.
    pub sprite: SpriteHandle,
    /// Grid cell currently occupied by the actor.
    pub cell: CellCoord,
    /// Animated offset from the cell.
    pub offset: DisplayOffset,
    /// Lifecycle state.
    pub state: ActorState,
    /// Budget left in the current turn.
    pub actions_left: u32,
    /// Indicates whether the actor is the rotation head.
    pub is_current: bool,
    /// Active effect, if any.
    pub effect: Option<EffectSnapshot>,
    /// Powers the actor may invoke.
    pub powers: Vec<PowerKind>,
    /// Key labelling the actor in an open power selection, if any.
    pub selection_key: Option<char>,
}

/// Read-only snapshot describing every actor in the match.
#[derive(Clone, Debug, Default)]
pub struct ActorView {
    snapshots: Vec<ActorSnapshot>,
}

impl ActorView {
    /// Creates a new actor view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ActorSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured actor snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ActorSnapshot> {
        self.snapshots.iter()
    }
}

/// Caller bugs detected by the match, its actors, or their powers.
///
/// These never originate from user input; they indicate that a caller drove
/// a state machine from a state that does not accept the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    /// A selection input reached a power that is not selecting.
    #[error("{power:?} power received selection input while {state:?}")]
    PowerNotSelecting {
        /// Power that received the input.
        power: PowerKind,
        /// State the power was in.
        state: PowerState,
    },
    /// A selection was started while the power was still resolving a target.
    #[error("{power:?} power cannot start selecting while acting")]
    PowerBusy {
        /// Power that was asked to start selecting.
        power: PowerKind,
    },
    /// A discrete action was requested from an actor that is not active.
    #[error("{actor} cannot act while {state:?}")]
    ActorNotActive {
        /// Actor that received the request.
        actor: ActorId,
        /// State the actor was in.
        state: ActorState,
    },
    /// A flight advance was requested from an actor that is not moving.
    #[error("{actor} cannot advance while {state:?}")]
    ActorNotMoving {
        /// Actor that received the request.
        actor: ActorId,
        /// State the actor was in.
        state: ActorState,
    },
    /// An effect was installed into an occupied slot without deactivating the occupant.
    #[error("{actor} already carries an active effect")]
    EffectSlotOccupied {
        /// Actor whose slot was occupied.
        actor: ActorId,
    },
    /// A request referenced an actor that is not part of the match.
    #[error("{actor} is not part of the match")]
    UnknownActor {
        /// Identifier that failed to resolve.
        actor: ActorId,
    },
}

/// Reasons match setup may fail.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// The roster contained no actors.
    #[error("the roster is empty")]
    EmptyRoster,
    /// The per-turn allowance was zero, so no actor could ever act.
    #[error("actors need at least one action per turn")]
    ZeroActionBudget,
    /// A fixed starting cell lies outside the grid.
    #[error("{name} cannot start at {cell}: the cell is off the map")]
    StartOffGrid {
        /// Name of the actor being placed.
        name: String,
        /// Requested starting cell.
        cell: CellCoord,
    },
    /// A fixed starting cell is already taken by an earlier actor.
    #[error("{name} cannot start at {cell}: the cell is already occupied")]
    StartOccupied {
        /// Name of the actor being placed.
        name: String,
        /// Requested starting cell.
        cell: CellCoord,
    },
    /// Every legal cell is already occupied.
    #[error("no free cell left for {name}: {placed} actors already fill {cells} cells")]
    NoFreeCell {
        /// Name of the actor being placed.
        name: String,
        /// Number of actors placed before the failure.
        placed: usize,
        /// Number of legal cells in the grid.
        cells: u64,
    },
}
