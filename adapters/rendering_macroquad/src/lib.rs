#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Castle Raid.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.

use anyhow::Result;
use castle_raid_core::{Direction, Faction, InputEvent};
use castle_raid_rendering::{
    Color, FrameInput, FrameOutcome, GridPresentation, Presentation, RenderingBackend, Scene,
    SceneActor,
};
use glam::Vec2;
use macroquad::input::{get_char_pressed, is_key_pressed, KeyCode};

/// Screen position of the info text baseline.
const INFO_TEXT_POSITION: Vec2 = Vec2::new(20.0, 20.0);
/// Screen position of the grid's top-left corner.
const GRID_ORIGIN: Vec2 = Vec2::new(20.0, 40.0);
const INFO_FONT_SIZE: f32 = 24.0;
const KEY_FONT_SIZE: f32 = 28.0;

const UNICORN_COLOR: Color = Color::from_rgb_u8(255, 105, 180);
const ROBOT_COLOR: Color = Color::from_rgb_u8(150, 155, 170);
const ACTIVE_RING_COLOR: Color = Color::from_rgb_u8(255, 255, 0);
const BUBBLE_COLOR: Color = Color::new(0.55, 0.8, 1.0, 0.35);
const TEXT_COLOR: Color = Color::from_rgb_u8(255, 255, 255);

/// Physical keys polled every frame, in dispatch order.
const POLLED_KEYS: [KeyCode; 8] = [
    KeyCode::Escape,
    KeyCode::Up,
    KeyCode::Down,
    KeyCode::Left,
    KeyCode::Right,
    KeyCode::Enter,
    KeyCode::Space,
    KeyCode::Backspace,
];

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(FrameInput, &mut Scene) -> FrameOutcome + 'static,
    {
        let Self { swap_interval } = self;
        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let window_size = window_size(&scene.grid);
        let mut config = macroquad::window::Conf {
            window_title,
            window_width: window_size.x as i32,
            window_height: window_size.y as i32,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);

            loop {
                let frame_input = gather_frame_input();
                let outcome = update_scene(frame_input, &mut scene);

                macroquad::window::clear_background(background);
                draw_grid(&scene.grid);
                for actor in &scene.actors {
                    draw_actor(&scene.grid, actor);
                }
                let _ = macroquad::text::draw_text(
                    &scene.info_text,
                    INFO_TEXT_POSITION.x,
                    INFO_TEXT_POSITION.y,
                    INFO_FONT_SIZE,
                    to_macroquad_color(TEXT_COLOR),
                );

                if outcome == FrameOutcome::Exit {
                    break;
                }
                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn gather_frame_input() -> FrameInput {
    let mut events: Vec<InputEvent> = POLLED_KEYS
        .iter()
        .copied()
        .filter(|key| is_key_pressed(*key))
        .filter_map(translate_key)
        .collect();
    while let Some(character) = get_char_pressed() {
        if let Some(event) = translate_char(character) {
            events.push(event);
        }
    }
    FrameInput::new(events)
}

/// Maps a physical key onto an abstract input event.
#[must_use]
pub fn translate_key(key: KeyCode) -> Option<InputEvent> {
    match key {
        KeyCode::Escape => Some(InputEvent::Quit),
        KeyCode::Up => Some(InputEvent::Move(Direction::Up)),
        KeyCode::Down => Some(InputEvent::Move(Direction::Down)),
        KeyCode::Left => Some(InputEvent::Move(Direction::Left)),
        KeyCode::Right => Some(InputEvent::Move(Direction::Right)),
        KeyCode::Enter | KeyCode::KpEnter => Some(InputEvent::Confirm),
        KeyCode::Space | KeyCode::Backspace => Some(InputEvent::Cancel),
        _ => None,
    }
}

/// Maps a typed character onto a selection key event.
///
/// Only ASCII letters and digits are selection keys; letters are lowercased.
#[must_use]
pub fn translate_char(character: char) -> Option<InputEvent> {
    character
        .is_ascii_alphanumeric()
        .then(|| InputEvent::SelectKey(character.to_ascii_lowercase()))
}

fn window_size(grid: &GridPresentation) -> Vec2 {
    Vec2::new(
        grid.width() + 2.0 * GRID_ORIGIN.x,
        grid.height() + GRID_ORIGIN.y + GRID_ORIGIN.x,
    )
}

fn actor_screen_position(grid: &GridPresentation, actor: &SceneActor) -> Vec2 {
    GRID_ORIGIN + grid.cell_center(actor.cell, actor.offset)
}

fn faction_color(faction: Faction) -> Color {
    match faction {
        Faction::Unicorn => UNICORN_COLOR,
        Faction::Robot => ROBOT_COLOR,
    }
}

fn draw_grid(grid: &GridPresentation) {
    let line_color = to_macroquad_color(grid.line_color);
    for column in 0..=grid.columns {
        let x = GRID_ORIGIN.x + column as f32 * grid.cell_length;
        macroquad::shapes::draw_line(
            x,
            GRID_ORIGIN.y,
            x,
            GRID_ORIGIN.y + grid.height(),
            1.0,
            line_color,
        );
    }

    for row in 0..=grid.rows {
        let y = GRID_ORIGIN.y + row as f32 * grid.cell_length;
        macroquad::shapes::draw_line(
            GRID_ORIGIN.x,
            y,
            GRID_ORIGIN.x + grid.width(),
            y,
            1.0,
            line_color,
        );
    }
}

fn draw_actor(grid: &GridPresentation, actor: &SceneActor) {
    let center = actor_screen_position(grid, actor);
    let radius = grid.cell_length * 0.35;

    macroquad::shapes::draw_circle(
        center.x,
        center.y,
        radius,
        to_macroquad_color(faction_color(actor.faction)),
    );

    if actor.effect.is_some() {
        macroquad::shapes::draw_circle(
            center.x,
            center.y,
            radius * 1.3,
            to_macroquad_color(BUBBLE_COLOR),
        );
        macroquad::shapes::draw_circle_lines(
            center.x,
            center.y,
            radius * 1.3,
            2.0,
            to_macroquad_color(BUBBLE_COLOR.lighten(0.5).with_alpha(0.8)),
        );
    }

    if actor.is_active {
        macroquad::shapes::draw_circle_lines(
            center.x,
            center.y,
            grid.cell_length / 2.0,
            4.0,
            to_macroquad_color(ACTIVE_RING_COLOR),
        );
    }

    if let Some(key) = actor.selection_key {
        let _ = macroquad::text::draw_text(
            &key.to_string(),
            center.x - KEY_FONT_SIZE / 4.0,
            center.y - radius,
            KEY_FONT_SIZE,
            to_macroquad_color(TEXT_COLOR),
        );
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
