#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic analytics system that folds match events into statistics.

use std::fmt;

use castle_raid_core::{EffectEndCause, Event};

/// Counters accumulated over the lifetime of a match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Turns that ended with a rotation.
    pub turns_completed: u64,
    /// Moves that were accepted.
    pub moves: u64,
    /// Moves that were rejected.
    pub rejected_moves: u64,
    /// Actions spent waiting.
    pub forfeited_actions: u64,
    /// Power selections opened.
    pub selections_started: u64,
    /// Power selections closed without effect.
    pub selections_cancelled: u64,
    /// Powers that resolved against a target.
    pub powers_resolved: u64,
    /// Effects attached to a target.
    pub effects_attached: u64,
    /// Effects that ran out of turns.
    pub effects_expired: u64,
}

impl fmt::Display for MatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "turns completed:      {}", self.turns_completed)?;
        writeln!(
            f,
            "moves:                {} ({} rejected)",
            self.moves, self.rejected_moves
        )?;
        writeln!(f, "forfeited actions:    {}", self.forfeited_actions)?;
        writeln!(
            f,
            "selections:           {} ({} cancelled)",
            self.selections_started, self.selections_cancelled
        )?;
        writeln!(f, "powers resolved:      {}", self.powers_resolved)?;
        write!(
            f,
            "effects:              {} attached, {} expired",
            self.effects_attached, self.effects_expired
        )
    }
}

/// Pure analytics system observing the event stream of a match.
#[derive(Debug, Default)]
pub struct Analytics {
    stats: MatchStats,
    finished: bool,
}

impl Analytics {
    /// Creates a new analytics system with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics gathered so far.
    #[must_use]
    pub const fn stats(&self) -> &MatchStats {
        &self.stats
    }

    /// Reports whether a match-ended event has been observed.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Folds a batch of events into the counters.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            let stats = &mut self.stats;
            match event {
                Event::TurnEnded { .. } => stats.turns_completed += 1,
                Event::ActorMoved { .. } => stats.moves += 1,
                Event::MoveRejected { .. } => stats.rejected_moves += 1,
                Event::ActionForfeited { .. } => stats.forfeited_actions += 1,
                Event::SelectionStarted { .. } => stats.selections_started += 1,
                Event::SelectionCancelled { .. } => stats.selections_cancelled += 1,
                Event::PowerResolved { .. } => stats.powers_resolved += 1,
                Event::EffectAttached { .. } => stats.effects_attached += 1,
                Event::EffectEnded {
                    cause: EffectEndCause::Expired,
                    ..
                } => stats.effects_expired += 1,
                Event::MatchEnded { .. } => self.finished = true,
                Event::TurnStarted { .. }
                | Event::ActionFinished { .. }
                | Event::EffectEnded { .. } => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Analytics, MatchStats};
    use castle_raid_core::{
        ActorId, CellCoord, EffectEndCause, EffectKind, Event, MoveRejection,
    };

    #[test]
    fn counters_ignore_bookkeeping_events() {
        let mut analytics = Analytics::new();
        let actor = ActorId::new(0);

        analytics.handle(&[
            Event::TurnStarted { actor, turn: 0 },
            Event::ActorMoved {
                actor,
                from: CellCoord::new(0, 0),
                to: CellCoord::new(1, 0),
            },
            Event::ActionFinished {
                actor,
                actions_left: 4,
            },
            Event::MoveRejected {
                actor,
                destination: CellCoord::new(-1, 0),
                reason: MoveRejection::OffGrid,
            },
            Event::EffectEnded {
                target: actor,
                kind: EffectKind::Bubble,
                cause: EffectEndCause::Replaced,
            },
        ]);

        assert_eq!(
            *analytics.stats(),
            MatchStats {
                moves: 1,
                rejected_moves: 1,
                ..MatchStats::default()
            }
        );
        assert!(!analytics.is_finished());
    }

    #[test]
    fn summary_lists_every_counter() {
        let stats = MatchStats {
            turns_completed: 3,
            moves: 7,
            rejected_moves: 2,
            ..MatchStats::default()
        };

        let summary = stats.to_string();

        assert!(summary.starts_with("turns completed:      3"));
        assert!(summary.contains("7 (2 rejected)"));
        assert_eq!(summary.lines().count(), 6);
    }
}
