use castle_raid_core::{CellCoord, Direction, Event, Faction, Grid, InputEvent, PowerKind};
use castle_raid_system_analytics::{Analytics, MatchStats};
use castle_raid_world::{query, ActorSpec, Match, MatchConfig};

fn step(game: &mut Match, analytics: &mut Analytics, input: InputEvent) {
    let mut events = Vec::new();
    let _ = game
        .dispatch_input(input, &mut events)
        .expect("scripted input never violates contracts");
    for _ in 0..10 {
        game.tick(&mut events);
    }
    analytics.handle(&events);
}

#[test]
fn replayed_match_produces_expected_counters() {
    let mut events = Vec::new();
    let mut game = Match::setup(
        vec![
            ActorSpec::new("Bad robot 1", Faction::Robot)
                .with_power(PowerKind::Bubble)
                .starting_at(CellCoord::new(0, 0)),
            ActorSpec::new("Cherry 1", Faction::Unicorn).starting_at(CellCoord::new(3, 3)),
        ],
        Grid::new(3, 3),
        MatchConfig::default().with_actions_per_turn(2).with_seed(9),
        &mut events,
    )
    .expect("two actors fit");
    let mut analytics = Analytics::new();
    analytics.handle(&events);

    step(&mut game, &mut analytics, InputEvent::SelectKey('b'));
    step(&mut game, &mut analytics, InputEvent::Cancel);
    step(&mut game, &mut analytics, InputEvent::SelectKey('b'));
    let (key, _) = query::selection(&game)[0];
    step(&mut game, &mut analytics, InputEvent::SelectKey(key));
    step(&mut game, &mut analytics, InputEvent::Move(Direction::Up));
    step(&mut game, &mut analytics, InputEvent::Move(Direction::Down));

    assert_eq!(query::turn(&game), 1, "robot spent both actions");

    step(&mut game, &mut analytics, InputEvent::Confirm);
    step(&mut game, &mut analytics, InputEvent::Confirm);
    step(&mut game, &mut analytics, InputEvent::Quit);

    assert!(analytics.is_finished());
    assert_eq!(
        *analytics.stats(),
        MatchStats {
            turns_completed: 2,
            moves: 1,
            rejected_moves: 1,
            forfeited_actions: 2,
            selections_started: 2,
            selections_cancelled: 1,
            powers_resolved: 1,
            effects_attached: 1,
            effects_expired: 0,
        }
    );
}

#[test]
fn unused_events_leave_counters_untouched() {
    let mut analytics = Analytics::new();
    analytics.handle(&[Event::MatchEnded { turn: 0 }]);

    assert!(analytics.is_finished());
    assert_eq!(*analytics.stats(), MatchStats::default());
}
