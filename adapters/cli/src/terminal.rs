//! Line-oriented backend drawing the match as ASCII art.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use castle_raid_core::{CellCoord, Direction, Faction, InputEvent};
use castle_raid_rendering::{
    FrameInput, FrameOutcome, Presentation, RenderingBackend, Scene, SceneActor,
};

const PROMPT: &str = "> ";
const HELP: &str =
    "commands: up, down, left, right, confirm, cancel, quit, or a single key; separate several with spaces";

/// Backend reading one line of commands per frame and writing ASCII frames.
///
/// While an actor is still animating, frames are advanced with empty input
/// instead of waiting for the next line.
#[derive(Debug)]
pub(crate) struct TerminalBackend<R, W> {
    input: R,
    output: W,
}

impl<R, W> TerminalBackend<R, W>
where
    R: BufRead,
    W: Write,
{
    pub(crate) fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_frame_input(&mut self) -> Result<FrameInput> {
        write!(self.output, "{PROMPT}")?;
        self.output.flush().context("failed to flush terminal prompt")?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read terminal input")?;
        if read == 0 {
            return Ok(FrameInput::new(vec![InputEvent::Quit]));
        }

        match parse_line(&line) {
            Ok(events) => Ok(FrameInput::new(events)),
            Err(error) => {
                writeln!(self.output, "{error}")?;
                writeln!(self.output, "{HELP}")?;
                Ok(FrameInput::default())
            }
        }
    }
}

impl<R, W> RenderingBackend for TerminalBackend<R, W>
where
    R: BufRead,
    W: Write,
{
    fn run<F>(mut self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(FrameInput, &mut Scene) -> FrameOutcome + 'static,
    {
        let Presentation {
            window_title,
            scene,
            ..
        } = presentation;
        let mut scene = scene;

        writeln!(self.output, "== {window_title} ==")?;
        writeln!(self.output, "{HELP}")?;
        write!(self.output, "{}", render_ascii(&scene))?;

        loop {
            let input = if scene.is_animating() {
                FrameInput::default()
            } else {
                self.read_frame_input()?
            };
            let outcome = update_scene(input, &mut scene);
            if !scene.is_animating() || outcome == FrameOutcome::Exit {
                write!(self.output, "{}", render_ascii(&scene))?;
            }
            if outcome == FrameOutcome::Exit {
                break;
            }
        }

        self.output.flush().context("failed to flush terminal output")?;
        Ok(())
    }
}

/// Parses one line of whitespace-separated commands.
pub(crate) fn parse_line(line: &str) -> Result<Vec<InputEvent>> {
    line.split_whitespace().map(parse_token).collect()
}

fn parse_token(token: &str) -> Result<InputEvent> {
    let event = match token.to_ascii_lowercase().as_str() {
        "up" => InputEvent::Move(Direction::Up),
        "down" => InputEvent::Move(Direction::Down),
        "left" => InputEvent::Move(Direction::Left),
        "right" => InputEvent::Move(Direction::Right),
        "confirm" | "wait" => InputEvent::Confirm,
        "cancel" => InputEvent::Cancel,
        "quit" | "exit" => InputEvent::Quit,
        _ => {
            let mut characters = token.chars();
            match (characters.next(), characters.next()) {
                (Some(key), None) if key.is_ascii_alphanumeric() => {
                    InputEvent::SelectKey(key.to_ascii_lowercase())
                }
                _ => bail!("unrecognised command `{token}`"),
            }
        }
    };
    Ok(event)
}

/// Renders the scene as a character grid followed by a legend.
pub(crate) fn render_ascii(scene: &Scene) -> String {
    let mut text = String::new();
    text.push_str(&scene.info_text);
    text.push('\n');

    for row in 0..scene.grid.rows {
        for column in 0..scene.grid.columns {
            let cell = CellCoord::new(column as i32, row as i32);
            let glyph = scene
                .actors
                .iter()
                .find(|actor| actor.cell == cell)
                .map_or_else(|| " . ".to_owned(), cell_glyph);
            text.push_str(&glyph);
        }
        text.push('\n');
    }

    for actor in &scene.actors {
        text.push_str(&format!(
            "  {} {} ({}) at {}",
            faction_letter(actor.faction),
            actor.name,
            actor.faction.label(),
            actor.cell
        ));
        if let Some(effect) = actor.effect {
            text.push_str(&format!(" [{}]", effect.label()));
        }
        if let Some(key) = actor.selection_key {
            text.push_str(&format!(" key: {key}"));
        }
        if actor.is_active {
            text.push_str(" <- active");
        }
        text.push('\n');
    }
    text
}

fn cell_glyph(actor: &SceneActor) -> String {
    let letter = actor
        .selection_key
        .unwrap_or_else(|| faction_letter(actor.faction));
    match (actor.is_active, actor.effect.is_some()) {
        (true, _) => format!("[{letter}]"),
        (false, true) => format!("({letter})"),
        (false, false) => format!(" {letter} "),
    }
}

const fn faction_letter(faction: Faction) -> char {
    match faction {
        Faction::Unicorn => 'U',
        Faction::Robot => 'R',
    }
}
