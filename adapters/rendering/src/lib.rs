#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Castle Raid adapters.

use anyhow::Result as AnyResult;
use castle_raid_core::{
    ActorId, ActorSnapshot, ActorState, ActorView, CellCoord, EffectKind, Faction, Grid,
    InputEvent, SpriteHandle,
};
use glam::Vec2;
use std::{error::Error, fmt};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with a different alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Abstract input events captured during the frame, in arrival order.
    pub events: Vec<InputEvent>,
}

impl FrameInput {
    /// Creates a frame input carrying the provided events.
    #[must_use]
    pub fn new(events: Vec<InputEvent>) -> Self {
        Self { events }
    }
}

/// Decision returned by the scene update closure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Keep presenting frames.
    Continue,
    /// Close the backend after presenting the current frame.
    Exit,
}

/// Describes the grid of square cells drawn by adapters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single cell expressed in screen units.
    pub cell_length: f32,
    /// Color used when drawing grid lines.
    pub line_color: Color,
}

impl GridPresentation {
    /// Cell side length in pixels used by the windowed backend.
    pub const DEFAULT_CELL_LENGTH: f32 = 64.0;

    /// Creates a new grid descriptor.
    ///
    /// Returns an error when the grid has no cell or the cell length is not a
    /// positive finite number.
    pub fn new(
        columns: u32,
        rows: u32,
        cell_length: f32,
        line_color: Color,
    ) -> std::result::Result<Self, RenderingError> {
        if columns == 0 || rows == 0 {
            return Err(RenderingError::EmptyGrid { columns, rows });
        }
        if !cell_length.is_finite() || cell_length <= 0.0 {
            return Err(RenderingError::InvalidCellLength { cell_length });
        }

        Ok(Self {
            columns,
            rows,
            cell_length,
            line_color,
        })
    }

    /// Creates a descriptor covering the provided match grid.
    pub fn for_grid(
        grid: &Grid,
        cell_length: f32,
        line_color: Color,
    ) -> std::result::Result<Self, RenderingError> {
        Self::new(grid.width(), grid.height(), cell_length, line_color)
    }

    /// Calculates the total width of the grid.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.columns as f32 * self.cell_length
    }

    /// Calculates the total height of the grid.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.rows as f32 * self.cell_length
    }

    /// Center of `cell` shifted by `offset` cells, relative to the grid origin.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord, offset: Vec2) -> Vec2 {
        let position = Vec2::new(cell.column() as f32, cell.row() as f32) + offset;
        (position + Vec2::splat(0.5)) * self.cell_length
    }
}

/// Actor as seen by renderers.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneActor {
    /// Identifier of the actor.
    pub id: ActorId,
    /// Display name.
    pub name: String,
    /// Faction, used to pick colors.
    pub faction: Faction,
    /// Opaque sprite handle.
    pub sprite: SpriteHandle,
    /// Cell the actor occupies.
    pub cell: CellCoord,
    /// Animated offset from the cell in cell units.
    pub offset: Vec2,
    /// Whether the active decoration should be drawn.
    pub is_active: bool,
    /// Effect decorating the actor, if any.
    pub effect: Option<EffectKind>,
    /// Key labelling the actor while a power selects targets.
    pub selection_key: Option<char>,
}

impl From<&ActorSnapshot> for SceneActor {
    fn from(snapshot: &ActorSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name.clone(),
            faction: snapshot.faction,
            sprite: snapshot.sprite,
            cell: snapshot.cell,
            offset: Vec2::new(snapshot.offset.columns, snapshot.offset.rows),
            is_active: snapshot.is_current && snapshot.state == ActorState::Active,
            effect: snapshot.effect.map(|effect| effect.kind),
            selection_key: snapshot.selection_key,
        }
    }
}

/// Scene description combining the grid, actors and the prompt line.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Grid that composes the play area.
    pub grid: GridPresentation,
    /// Actors to draw, in identifier order.
    pub actors: Vec<SceneActor>,
    /// Prompt shown above the grid.
    pub info_text: String,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(grid: GridPresentation, actors: Vec<SceneActor>, info_text: String) -> Self {
        Self {
            grid,
            actors,
            info_text,
        }
    }

    /// Replaces the actors with the contents of `view`.
    pub fn populate_actors(&mut self, view: &ActorView) {
        self.actors.clear();
        self.actors.extend(view.iter().map(SceneActor::from));
    }

    /// Reports whether any actor is drawn away from its cell.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.actors.iter().any(|actor| actor.offset != Vec2::ZERO)
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Castle Raid scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// Once per frame the backend gathers [`FrameInput`], hands it to
    /// `update_scene` together with the scene, and presents the result. The
    /// loop ends when the closure returns [`FrameOutcome::Exit`] or the input
    /// source closes.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(FrameInput, &mut Scene) -> FrameOutcome + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// The grid must contain at least one cell.
    EmptyGrid {
        /// Provided column count.
        columns: u32,
        /// Provided row count.
        rows: u32,
    },
    /// Cells must have a positive finite side length.
    InvalidCellLength {
        /// Provided length that failed validation.
        cell_length: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { columns, rows } => {
                write!(f, "grid must contain cells (received {columns}x{rows})")
            }
            Self::InvalidCellLength { cell_length } => {
                write!(
                    f,
                    "cell_length must be positive (received {cell_length})"
                )
            }
        }
    }
}

impl Error for RenderingError {}
