#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative match state for Castle Raid.
//!
//! The [`Match`] exclusively owns every [`Actor`] in a single rotation queue.
//! Adapters feed it [`InputEvent`] values through [`Match::dispatch_input`]
//! and advance continuous state once per frame through [`Match::tick`]; both
//! report what happened by appending [`Event`] values to a caller-provided
//! buffer. Read access goes through the [`query`] module.

mod actor;
mod board;
mod effect;
mod power;

use std::collections::VecDeque;

use castle_raid_core::{
    ActorId, ActorState, CellCoord, ContractViolation, Event, Faction, Grid, InputEvent,
    PlacementError, PowerKind, SpriteHandle, DEFAULT_ACTIONS_PER_TURN, WELCOME_BANNER,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use actor::{Actor, MoveOutcome, FLIGHT_TICKS};
pub use board::{Board, InputHandler};
pub use effect::Effect;
pub use power::{Power, SELECTION_KEYS};

use board::check_destination;

/// Random placement draws before falling back to enumerating free cells.
const PLACEMENT_ATTEMPTS: u32 = 64;

const UNICORN_SPRITE: SpriteHandle = SpriteHandle::new(0);
const ROBOT_SPRITE: SpriteHandle = SpriteHandle::new(1);

/// Roster entry describing an actor to be created at match setup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActorSpec {
    name: String,
    faction: Faction,
    powers: Vec<PowerKind>,
    sprite: SpriteHandle,
    start: Option<CellCoord>,
}

impl ActorSpec {
    /// Creates a power-less actor that will be placed at a random free cell.
    #[must_use]
    pub fn new(name: impl Into<String>, faction: Faction) -> Self {
        let sprite = match faction {
            Faction::Unicorn => UNICORN_SPRITE,
            Faction::Robot => ROBOT_SPRITE,
        };
        Self {
            name: name.into(),
            faction,
            powers: Vec::new(),
            sprite,
            start: None,
        }
    }

    /// Grants the actor an additional power.
    #[must_use]
    pub fn with_power(mut self, power: PowerKind) -> Self {
        self.powers.push(power);
        self
    }

    /// Pins the starting cell instead of drawing one at random.
    #[must_use]
    pub fn starting_at(mut self, cell: CellCoord) -> Self {
        self.start = Some(cell);
        self
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Faction the actor fights for.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Powers the actor will carry.
    #[must_use]
    pub fn powers(&self) -> &[PowerKind] {
        &self.powers
    }

    /// Pinned starting cell, if any.
    #[must_use]
    pub const fn start(&self) -> Option<CellCoord> {
        self.start
    }
}

/// Match-wide tunables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchConfig {
    actions_per_turn: u32,
    seed: u64,
}

impl MatchConfig {
    /// Creates a configuration with an explicit allowance and seed.
    #[must_use]
    pub const fn new(actions_per_turn: u32, seed: u64) -> Self {
        Self {
            actions_per_turn,
            seed,
        }
    }

    /// Replaces the per-turn action allowance.
    #[must_use]
    pub const fn with_actions_per_turn(mut self, actions_per_turn: u32) -> Self {
        self.actions_per_turn = actions_per_turn;
        self
    }

    /// Replaces the seed feeding placement and key assignment.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Actions granted at the start of every turn.
    #[must_use]
    pub const fn actions_per_turn(&self) -> u32 {
        self.actions_per_turn
    }

    /// Seed of the match RNG.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIONS_PER_TURN, 0)
    }
}

/// Turn scheduler owning every actor of a running match.
#[derive(Debug)]
pub struct Match {
    banner: &'static str,
    grid: Grid,
    rotation: VecDeque<Actor>,
    turn: u64,
    actions_per_turn: u32,
    rng: ChaCha8Rng,
    running: bool,
}

impl Match {
    /// Places every roster entry on `grid` and starts the first turn.
    ///
    /// Pinned starting cells are claimed first, in roster order; every other
    /// actor then lands on a uniformly random free cell. Actor identifiers
    /// follow roster order and the first roster entry opens turn 0.
    pub fn setup(
        roster: Vec<ActorSpec>,
        grid: Grid,
        config: MatchConfig,
        out_events: &mut Vec<Event>,
    ) -> Result<Self, PlacementError> {
        if roster.is_empty() {
            return Err(PlacementError::EmptyRoster);
        }
        if config.actions_per_turn() == 0 {
            return Err(PlacementError::ZeroActionBudget);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed());
        let mut cells: Vec<Option<CellCoord>> = vec![None; roster.len()];
        let mut taken: Vec<CellCoord> = Vec::with_capacity(roster.len());

        for (slot, spec) in cells.iter_mut().zip(&roster) {
            let Some(cell) = spec.start() else {
                continue;
            };
            if !grid.is_legal(cell) {
                return Err(PlacementError::StartOffGrid {
                    name: spec.name().to_owned(),
                    cell,
                });
            }
            if taken.contains(&cell) {
                return Err(PlacementError::StartOccupied {
                    name: spec.name().to_owned(),
                    cell,
                });
            }
            taken.push(cell);
            *slot = Some(cell);
        }

        let cells = cells
            .into_iter()
            .zip(&roster)
            .map(|(pinned, spec)| {
                if let Some(cell) = pinned {
                    return Ok(cell);
                }
                let cell = random_free_cell(&grid, &taken, &mut rng).ok_or_else(|| {
                    PlacementError::NoFreeCell {
                        name: spec.name().to_owned(),
                        placed: taken.len(),
                        cells: grid.cell_count(),
                    }
                })?;
                taken.push(cell);
                Ok(cell)
            })
            .collect::<Result<Vec<CellCoord>, PlacementError>>()?;

        let rotation: VecDeque<Actor> = roster
            .into_iter()
            .zip(cells)
            .enumerate()
            .map(|(index, (spec, cell))| {
                let id = ActorId::new(u32::try_from(index).unwrap_or(u32::MAX));
                Actor::from_spec(id, spec, cell)
            })
            .collect();

        tracing::info!(
            actors = rotation.len(),
            seed = config.seed(),
            actions_per_turn = config.actions_per_turn(),
            "match set up"
        );

        let mut game = Self {
            banner: WELCOME_BANNER,
            grid,
            rotation,
            turn: 0,
            actions_per_turn: config.actions_per_turn(),
            rng,
            running: true,
        };
        game.start_head_turn(out_events);
        Ok(game)
    }

    /// Routes one input event to the current actor.
    ///
    /// Returns whether the event was consumed. Quit ends the match; every
    /// input after that is ignored.
    pub fn dispatch_input(
        &mut self,
        input: InputEvent,
        out_events: &mut Vec<Event>,
    ) -> Result<bool, ContractViolation> {
        if !self.running {
            return Ok(false);
        }
        if input == InputEvent::Quit {
            self.running = false;
            tracing::info!(turn = self.turn, "match ended");
            out_events.push(Event::MatchEnded { turn: self.turn });
            return Ok(true);
        }

        let Some((current, others)) = self.rotation.make_contiguous().split_first_mut() else {
            return Ok(false);
        };
        let mut board = Board::new(&self.grid, others, &mut self.rng, out_events);
        current.handle_input(input, &mut board)
    }

    /// Advances continuous state and rotates the head once its turn is over.
    pub fn tick(&mut self, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }
        for actor in &mut self.rotation {
            actor.on_tick(out_events);
        }

        let turn_over = self.rotation.front().is_some_and(Actor::is_turn_over);
        if turn_over {
            if let Some(finished) = self.rotation.front() {
                tracing::info!(actor = %finished.id(), turn = self.turn, "turn over");
                out_events.push(Event::TurnEnded {
                    actor: finished.id(),
                    turn: self.turn,
                });
            }
            self.rotation.rotate_left(1);
            self.turn += 1;
            self.start_head_turn(out_events);
        }

        debug_assert!(
            self.engaged_actors() <= 1,
            "only the rotation head may be active or moving"
        );
    }

    /// Reports whether `destination` is on the grid and free of every actor.
    #[must_use]
    pub fn is_move_legal(&self, destination: CellCoord) -> bool {
        check_destination(&self.grid, self.rotation.iter(), destination).is_ok()
    }

    /// Reports whether the match still accepts input.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    fn start_head_turn(&mut self, out_events: &mut Vec<Event>) {
        let turn = self.turn;
        let actions_per_turn = self.actions_per_turn;
        if let Some(head) = self.rotation.front_mut() {
            out_events.push(Event::TurnStarted {
                actor: head.id(),
                turn,
            });
            head.start_turn(actions_per_turn, out_events);
        }
    }

    fn engaged_actors(&self) -> usize {
        self.rotation
            .iter()
            .filter(|actor| actor.state() != ActorState::Idle)
            .count()
    }
}

fn random_free_cell(grid: &Grid, taken: &[CellCoord], rng: &mut ChaCha8Rng) -> Option<CellCoord> {
    let max_column = i32::from(grid.max_column());
    let max_row = i32::from(grid.max_row());
    for _ in 0..PLACEMENT_ATTEMPTS {
        let cell = CellCoord::new(rng.gen_range(0..=max_column), rng.gen_range(0..=max_row));
        if !taken.contains(&cell) {
            return Some(cell);
        }
    }

    tracing::warn!(
        attempts = PLACEMENT_ATTEMPTS,
        occupied = taken.len(),
        "random placement kept missing; enumerating free cells"
    );
    let free: Vec<CellCoord> = grid.cells().filter(|cell| !taken.contains(cell)).collect();
    free.choose(rng).copied()
}

/// Read-only queries over a [`Match`].
pub mod query {
    use castle_raid_core::{ActorId, ActorView, Grid};

    use super::{Actor, Match};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(game: &Match) -> &'static str {
        game.banner
    }

    /// Playing field bounds.
    #[must_use]
    pub fn grid(game: &Match) -> &Grid {
        &game.grid
    }

    /// Number of completed turn rotations.
    #[must_use]
    pub fn turn(game: &Match) -> u64 {
        game.turn
    }

    /// Actions granted at the start of every turn.
    #[must_use]
    pub fn actions_per_turn(game: &Match) -> u32 {
        game.actions_per_turn
    }

    /// Reports whether the match still accepts input.
    #[must_use]
    pub fn is_running(game: &Match) -> bool {
        game.running
    }

    /// Actor at the head of the rotation.
    #[must_use]
    pub fn current_actor(game: &Match) -> Option<&Actor> {
        game.rotation.front()
    }

    /// Looks up an actor by identifier.
    #[must_use]
    pub fn actor(game: &Match, id: ActorId) -> Option<&Actor> {
        game.rotation.iter().find(|actor| actor.id() == id)
    }

    /// Actors in rotation order, head first.
    pub fn rotation(game: &Match) -> impl Iterator<Item = &Actor> {
        game.rotation.iter()
    }

    /// Captures a read-only view of every actor, labelled with open selection keys.
    #[must_use]
    pub fn actor_view(game: &Match) -> ActorView {
        let selecting = game
            .rotation
            .front()
            .and_then(|head| head.selecting_power());
        let snapshots = game
            .rotation
            .iter()
            .enumerate()
            .map(|(position, actor)| {
                let key = selecting.and_then(|power| power.key_for(actor.id()));
                actor.snapshot(position == 0, key)
            })
            .collect();
        ActorView::from_snapshots(snapshots)
    }

    /// Key to target assignments of the current actor's open selection.
    #[must_use]
    pub fn selection(game: &Match) -> Vec<(char, ActorId)> {
        game.rotation
            .front()
            .and_then(|head| head.selecting_power())
            .map(|power| power.selection().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use castle_raid_core::Direction;

    fn pinned(name: &str, faction: Faction, column: i32, row: i32) -> ActorSpec {
        ActorSpec::new(name, faction).starting_at(CellCoord::new(column, row))
    }

    #[test]
    fn setup_rejects_empty_roster_and_zero_budget() {
        let mut events = Vec::new();
        let grid = Grid::new(3, 3);

        assert_eq!(
            Match::setup(Vec::new(), grid, MatchConfig::default(), &mut events).err(),
            Some(PlacementError::EmptyRoster)
        );
        assert_eq!(
            Match::setup(
                vec![ActorSpec::new("Cherry 1", Faction::Unicorn)],
                grid,
                MatchConfig::default().with_actions_per_turn(0),
                &mut events,
            )
            .err(),
            Some(PlacementError::ZeroActionBudget)
        );
        assert!(events.is_empty());
    }

    #[test]
    fn setup_rejects_illegal_pinned_cells() {
        let mut events = Vec::new();
        let grid = Grid::new(1, 1);

        let off_grid = Match::setup(
            vec![pinned("Cherry 1", Faction::Unicorn, 2, 0)],
            grid,
            MatchConfig::default(),
            &mut events,
        );
        assert_eq!(
            off_grid.err(),
            Some(PlacementError::StartOffGrid {
                name: "Cherry 1".to_owned(),
                cell: CellCoord::new(2, 0),
            })
        );

        let occupied = Match::setup(
            vec![
                pinned("Cherry 1", Faction::Unicorn, 1, 1),
                pinned("Bad robot 1", Faction::Robot, 1, 1),
            ],
            grid,
            MatchConfig::default(),
            &mut events,
        );
        assert_eq!(
            occupied.err(),
            Some(PlacementError::StartOccupied {
                name: "Bad robot 1".to_owned(),
                cell: CellCoord::new(1, 1),
            })
        );
    }

    #[test]
    fn setup_fails_when_roster_outgrows_grid() {
        let mut events = Vec::new();
        let roster: Vec<ActorSpec> = (1..=5)
            .map(|index| ActorSpec::new(format!("Cherry {index}"), Faction::Unicorn))
            .collect();

        let result = Match::setup(roster, Grid::new(1, 1), MatchConfig::default(), &mut events);

        assert_eq!(
            result.err(),
            Some(PlacementError::NoFreeCell {
                name: "Cherry 5".to_owned(),
                placed: 4,
                cells: 4,
            })
        );
    }

    #[test]
    fn random_placement_fills_every_cell_without_collisions() {
        let mut events = Vec::new();
        let roster: Vec<ActorSpec> = (1..=9)
            .map(|index| ActorSpec::new(format!("Cherry {index}"), Faction::Unicorn))
            .collect();
        let grid = Grid::new(2, 2);

        let game = Match::setup(roster, grid, MatchConfig::default().with_seed(3), &mut events)
            .expect("nine actors fit a 3x3 grid");

        let cells: HashSet<CellCoord> = query::rotation(&game).map(Actor::cell).collect();
        assert_eq!(cells.len(), 9, "no two actors may share a cell");
        assert!(cells.iter().all(|cell| grid.is_legal(*cell)));
    }

    #[test]
    fn mixed_roster_keeps_every_entry_in_roster_order() {
        let mut events = Vec::new();
        let roster = vec![
            ActorSpec::new("Cherry 1", Faction::Unicorn),
            pinned("Bad robot 1", Faction::Robot, 2, 2),
            ActorSpec::new("Cherry 2", Faction::Unicorn),
            pinned("Bad robot 2", Faction::Robot, 0, 0),
        ];

        let game = Match::setup(
            roster,
            Grid::new(2, 2),
            MatchConfig::default().with_seed(8),
            &mut events,
        )
        .expect("four actors fit a 3x3 grid");

        let placed: Vec<(ActorId, &str)> = query::rotation(&game)
            .map(|actor| (actor.id(), actor.name()))
            .collect();
        assert_eq!(
            placed,
            vec![
                (ActorId::new(0), "Cherry 1"),
                (ActorId::new(1), "Bad robot 1"),
                (ActorId::new(2), "Cherry 2"),
                (ActorId::new(3), "Bad robot 2"),
            ]
        );
        let cell_of = |id: u32| {
            query::actor(&game, ActorId::new(id))
                .map(Actor::cell)
                .expect("placed actor")
        };
        assert_eq!(cell_of(1), CellCoord::new(2, 2));
        assert_eq!(cell_of(3), CellCoord::new(0, 0));
        let cells: HashSet<CellCoord> = (0..4).map(cell_of).collect();
        assert_eq!(cells.len(), 4, "random entries avoid the pinned cells");
    }

    #[test]
    fn setup_starts_the_first_roster_entry() {
        let mut events = Vec::new();
        let game = Match::setup(
            vec![
                pinned("Cherry 1", Faction::Unicorn, 0, 0),
                pinned("Bad robot 1", Faction::Robot, 1, 1),
            ],
            Grid::new(1, 1),
            MatchConfig::default(),
            &mut events,
        )
        .expect("valid roster");

        let head = query::current_actor(&game).expect("rotation is never empty");
        assert_eq!(head.id(), ActorId::new(0));
        assert_eq!(head.state(), ActorState::Active);
        assert_eq!(head.actions_left(), DEFAULT_ACTIONS_PER_TURN);
        assert_eq!(query::turn(&game), 0);
        assert_eq!(
            events,
            vec![Event::TurnStarted {
                actor: ActorId::new(0),
                turn: 0
            }]
        );
        assert_eq!(query::welcome_banner(&game), WELCOME_BANNER);
    }

    #[test]
    fn move_legality_considers_every_actor() {
        let mut events = Vec::new();
        let game = Match::setup(
            vec![
                pinned("Cherry 1", Faction::Unicorn, 0, 0),
                pinned("Bad robot 1", Faction::Robot, 1, 1),
            ],
            Grid::new(1, 1),
            MatchConfig::default(),
            &mut events,
        )
        .expect("valid roster");

        assert!(game.is_move_legal(CellCoord::new(1, 0)));
        assert!(!game.is_move_legal(CellCoord::new(0, 0)));
        assert!(!game.is_move_legal(CellCoord::new(1, 1)));
        assert!(!game.is_move_legal(CellCoord::new(0, -1)));
    }

    #[test]
    fn quit_ends_the_match_and_ignores_later_input() {
        let mut events = Vec::new();
        let mut game = Match::setup(
            vec![pinned("Cherry 1", Faction::Unicorn, 0, 0)],
            Grid::new(1, 1),
            MatchConfig::default(),
            &mut events,
        )
        .expect("valid roster");
        events.clear();

        assert_eq!(game.dispatch_input(InputEvent::Quit, &mut events), Ok(true));
        assert!(!game.is_running());
        assert_eq!(events, vec![Event::MatchEnded { turn: 0 }]);

        assert_eq!(
            game.dispatch_input(InputEvent::Move(Direction::Right), &mut events),
            Ok(false)
        );
        game.tick(&mut events);
        assert_eq!(events.len(), 1, "an ended match stays silent");
    }
}
