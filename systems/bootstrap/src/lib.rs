#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares the Castle Raid experience.

use castle_raid_core::{ActorState, Faction, PowerKind};
use castle_raid_world::{query, ActorSpec, Match};

/// Produces data required to greet the player and prompt the current actor.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'game>(&self, game: &'game Match) -> &'game str {
        query::welcome_banner(game)
    }

    /// Builds the default roster: unicorns first, then power-wielding robots.
    #[must_use]
    pub fn default_roster(&self, unicorns: usize, robots: usize) -> Vec<ActorSpec> {
        let unicorns =
            (1..=unicorns).map(|index| ActorSpec::new(format!("Cherry {index}"), Faction::Unicorn));
        let robots = (1..=robots).map(|index| {
            ActorSpec::new(format!("Bad robot {index}"), Faction::Robot)
                .with_power(PowerKind::Bubble)
        });
        unicorns.chain(robots).collect()
    }

    /// Describes what the current actor may do next.
    #[must_use]
    pub fn info_text(&self, game: &Match) -> String {
        if !query::is_running(game) {
            return format!("The raid is over after {} turns.", query::turn(game));
        }
        let Some(actor) = query::current_actor(game) else {
            return String::new();
        };

        if let Some(power) = actor.selecting_power() {
            return format!(
                "{}: choose a target for {} by its key, or cancel.",
                actor.name(),
                power.kind().label()
            );
        }
        if let Some(power) = actor.powers().iter().find(|power| power.is_acting()) {
            return format!("{} unleashes {}!", actor.name(), power.kind().label());
        }

        match actor.state() {
            ActorState::Moving => format!("{} is on the move.", actor.name()),
            ActorState::Idle => format!("{}'s turn is over.", actor.name()),
            ActorState::Active => {
                let mut text = format!(
                    "{}'s Turn! Use arrows to move. {} of {} actions left.",
                    actor.name(),
                    actor.actions_left(),
                    query::actions_per_turn(game)
                );
                for power in actor.powers() {
                    text.push_str(&format!(
                        " Press {} for {}.",
                        power.kind().trigger_key().to_ascii_uppercase(),
                        power.kind().label()
                    ));
                }
                text
            }
        }
    }
}
