//! Glue between a running match and a rendering backend.

use castle_raid_core::Event;
use castle_raid_rendering::{
    Color, FrameInput, FrameOutcome, GridPresentation, Presentation, RenderingError, Scene,
};
use castle_raid_system_analytics::{Analytics, MatchStats};
use castle_raid_system_bootstrap::Bootstrap;
use castle_raid_world::{query, Match};

const WINDOW_TITLE: &str = "Castle Raid";
const CLEAR_COLOR: Color = Color::from_rgb_u8(20, 24, 36);
const LINE_COLOR: Color = Color::from_rgb_u8(90, 90, 110);

/// Owns the match and the systems observing it for the lifetime of a backend.
#[derive(Debug)]
pub(crate) struct Session {
    game: Match,
    bootstrap: Bootstrap,
    analytics: Analytics,
    events: Vec<Event>,
    summary_printed: bool,
}

impl Session {
    pub(crate) fn new(game: Match, setup_events: &[Event]) -> Self {
        let mut analytics = Analytics::new();
        analytics.handle(setup_events);
        Self {
            game,
            bootstrap: Bootstrap,
            analytics,
            events: Vec::new(),
            summary_printed: false,
        }
    }

    pub(crate) fn presentation(&self, cell_length: f32) -> Result<Presentation, RenderingError> {
        let grid = GridPresentation::for_grid(query::grid(&self.game), cell_length, LINE_COLOR)?;
        let mut scene = Scene::new(grid, Vec::new(), String::new());
        self.populate(&mut scene);
        Ok(Presentation::new(WINDOW_TITLE, CLEAR_COLOR, scene))
    }

    pub(crate) fn welcome_banner(&self) -> &str {
        self.bootstrap.welcome_banner(&self.game)
    }

    pub(crate) fn stats(&self) -> &MatchStats {
        self.analytics.stats()
    }

    /// Processes one frame: every pending input, then exactly one tick.
    pub(crate) fn frame(&mut self, input: FrameInput, scene: &mut Scene) -> FrameOutcome {
        self.events.clear();
        for event in input.events {
            if let Err(violation) = self.game.dispatch_input(event, &mut self.events) {
                tracing::error!(%violation, ?event, "dropping input");
            }
        }
        self.game.tick(&mut self.events);
        self.analytics.handle(&self.events);
        self.populate(scene);

        if query::is_running(&self.game) {
            return FrameOutcome::Continue;
        }
        if !self.summary_printed {
            self.summary_printed = true;
            println!("{}", self.stats());
        }
        FrameOutcome::Exit
    }

    fn populate(&self, scene: &mut Scene) {
        scene.populate_actors(&query::actor_view(&self.game));
        scene.info_text = self.bootstrap.info_text(&self.game);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castle_raid_core::{CellCoord, Direction, Faction, Grid, InputEvent, PowerKind};
    use castle_raid_world::{ActorSpec, MatchConfig, FLIGHT_TICKS};

    fn session() -> Session {
        let mut events = Vec::new();
        let game = Match::setup(
            vec![
                ActorSpec::new("Cherry 1", Faction::Unicorn).starting_at(CellCoord::new(0, 0)),
                ActorSpec::new("Bad robot 1", Faction::Robot)
                    .with_power(PowerKind::Bubble)
                    .starting_at(CellCoord::new(2, 2)),
            ],
            Grid::new(2, 2),
            MatchConfig::default().with_actions_per_turn(1),
            &mut events,
        )
        .expect("two actors fit");
        Session::new(game, &events)
    }

    #[test]
    fn presentation_covers_the_match_grid() {
        let session = session();
        let presentation = session.presentation(32.0).expect("valid cell length");

        assert_eq!(presentation.window_title, "Castle Raid");
        assert_eq!(presentation.scene.grid.columns, query::grid(&session.game).width());
        assert_eq!(presentation.scene.actors.len(), 2);
        assert!(presentation.scene.info_text.starts_with("Cherry 1's Turn!"));
        assert!(session.presentation(0.0).is_err());
    }

    #[test]
    fn frames_animate_moves_and_rotate_turns() {
        let mut session = session();
        let mut scene = session.presentation(32.0).expect("valid").scene;

        let outcome = session.frame(
            FrameInput::new(vec![InputEvent::Move(Direction::Right)]),
            &mut scene,
        );
        assert_eq!(outcome, FrameOutcome::Continue);
        assert!(scene.is_animating());

        let mut frames = 1;
        while scene.is_animating() {
            let _ = session.frame(FrameInput::default(), &mut scene);
            frames += 1;
        }
        assert_eq!(frames, FLIGHT_TICKS);

        let _ = session.frame(FrameInput::default(), &mut scene);
        assert!(scene.info_text.starts_with("Bad robot 1's Turn!"));
        assert_eq!(session.stats().moves, 1);
        assert_eq!(session.stats().turns_completed, 1);
    }

    #[test]
    fn quit_exits_after_the_frame() {
        let mut session = session();
        let mut scene = session.presentation(32.0).expect("valid").scene;

        let outcome = session.frame(FrameInput::new(vec![InputEvent::Quit]), &mut scene);

        assert_eq!(outcome, FrameOutcome::Exit);
        assert!(scene.info_text.starts_with("The raid is over"));
        assert_eq!(session.welcome_banner(), "Welcome to Castle Raid.");
    }
}
