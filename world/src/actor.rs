//! Actor lifecycle, action budget and input routing.

use castle_raid_core::{
    ActorId, ActorSnapshot, ActorState, CellCoord, ContractViolation, Direction, DisplayOffset,
    EffectEndCause, Event, Faction, InputEvent, MoveRejection, PowerState, SpriteHandle,
};

use crate::{ActorSpec, Board, Effect, InputHandler, Power};

/// Number of ticks a single-cell move takes to settle.
pub const FLIGHT_TICKS: u32 = 8;

/// Receiver of the next input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Focus {
    Actor,
    Power(usize),
}

#[derive(Clone, Copy, Debug)]
struct Flight {
    from: CellCoord,
    ticks_remaining: u32,
}

/// Result of a move request issued while active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The actor now occupies `to` and is animating away from `from`.
    Moved {
        /// Cell occupied before the move.
        from: CellCoord,
        /// Cell occupied after the move.
        to: CellCoord,
    },
    /// The destination was not legal; nothing changed.
    Rejected(MoveRejection),
}

/// A single participant of the match.
///
/// Actors own their position, their per-turn action budget, at most one
/// active effect and their powers. Discrete actions are only accepted while
/// the actor is [`ActorState::Active`].
#[derive(Clone, Debug)]
pub struct Actor {
    id: ActorId,
    name: String,
    faction: Faction,
    sprite: SpriteHandle,
    cell: CellCoord,
    flight: Option<Flight>,
    state: ActorState,
    actions_left: u32,
    effect: Option<Effect>,
    powers: Vec<Power>,
    focus: Focus,
}

impl Actor {
    pub(crate) fn from_spec(id: ActorId, spec: ActorSpec, cell: CellCoord) -> Self {
        let ActorSpec {
            name,
            faction,
            powers,
            sprite,
            ..
        } = spec;
        let powers = powers
            .into_iter()
            .map(|kind| Power::new(kind, id, faction))
            .collect();

        Self {
            id,
            name,
            faction,
            sprite,
            cell,
            flight: None,
            state: ActorState::Idle,
            actions_left: 0,
            effect: None,
            powers,
            focus: Focus::Actor,
        }
    }

    /// Unique identifier of the actor.
    #[must_use]
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// Display name of the actor.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Side the actor fights for.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Grid cell the actor occupies, already updated while a move animates.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ActorState {
        self.state
    }

    /// Budget left in the current turn.
    #[must_use]
    pub const fn actions_left(&self) -> u32 {
        self.actions_left
    }

    /// Effect currently decorating the actor.
    #[must_use]
    pub const fn effect(&self) -> Option<&Effect> {
        self.effect.as_ref()
    }

    /// Powers the actor may invoke.
    #[must_use]
    pub fn powers(&self) -> &[Power] {
        &self.powers
    }

    /// Power whose target selection is open, if any.
    #[must_use]
    pub fn selecting_power(&self) -> Option<&Power> {
        self.powers.iter().find(|power| power.is_selecting())
    }

    /// Reports whether a power resolved a target that has not settled yet.
    #[must_use]
    pub fn is_resolving_power(&self) -> bool {
        self.powers.iter().any(Power::is_acting)
    }

    /// Offset of the drawn position from [`Self::cell`], in cell units.
    #[must_use]
    pub fn display_offset(&self) -> DisplayOffset {
        match self.flight {
            None => DisplayOffset::ZERO,
            Some(flight) => {
                let progress = flight.ticks_remaining as f32 / FLIGHT_TICKS as f32;
                DisplayOffset {
                    columns: (flight.from.column() - self.cell.column()) as f32 * progress,
                    rows: (flight.from.row() - self.cell.row()) as f32 * progress,
                }
            }
        }
    }

    /// Reports whether the actor may hand over the rotation head.
    #[must_use]
    pub fn is_turn_over(&self) -> bool {
        self.actions_left == 0 && self.state != ActorState::Moving && !self.is_resolving_power()
    }

    /// Grants a fresh budget and counts down the carried effect.
    ///
    /// Any open selection and any unsettled flight from an earlier turn are
    /// discarded.
    pub fn start_turn(&mut self, actions_per_turn: u32, events: &mut Vec<Event>) {
        self.actions_left = actions_per_turn;
        self.flight = None;
        self.focus = Focus::Actor;
        for power in &mut self.powers {
            power.reset();
        }
        self.state = if actions_per_turn > 0 {
            ActorState::Active
        } else {
            ActorState::Idle
        };
        self.on_turn_start(events);
    }

    /// Attempts a single-cell move in `direction`.
    ///
    /// A legal move spends one action immediately and enters
    /// [`ActorState::Moving`]; a rejected one changes nothing.
    pub fn request_move(
        &mut self,
        direction: Direction,
        board: &mut Board<'_>,
    ) -> Result<MoveOutcome, ContractViolation> {
        self.ensure_active()?;

        let destination = self.cell.stepped(direction);
        if let Err(reason) = board.check_move(destination) {
            tracing::debug!(actor = %self.id, %destination, %reason, "move rejected");
            board.emit(Event::MoveRejected {
                actor: self.id,
                destination,
                reason,
            });
            return Ok(MoveOutcome::Rejected(reason));
        }

        let from = self.cell;
        self.actions_left = self.actions_left.saturating_sub(1);
        self.cell = destination;
        self.flight = Some(Flight {
            from,
            ticks_remaining: FLIGHT_TICKS,
        });
        self.state = ActorState::Moving;
        tracing::debug!(
            actor = %self.id,
            %from,
            to = %destination,
            actions_left = self.actions_left,
            "actor moving"
        );
        board.emit(Event::ActorMoved {
            actor: self.id,
            from,
            to: destination,
        });
        Ok(MoveOutcome::Moved {
            from,
            to: destination,
        })
    }

    /// Advances the flight by one tick, finishing the action on arrival.
    pub fn advance(&mut self, events: &mut Vec<Event>) -> Result<(), ContractViolation> {
        if self.state != ActorState::Moving {
            return Err(ContractViolation::ActorNotMoving {
                actor: self.id,
                state: self.state,
            });
        }
        self.step_flight(events);
        Ok(())
    }

    /// Per-tick update: advances a flight or settles an acting power.
    ///
    /// Actors with nothing in progress are left untouched.
    pub fn on_tick(&mut self, events: &mut Vec<Event>) {
        if self.state == ActorState::Moving {
            self.step_flight(events);
            return;
        }
        let settled = self
            .powers
            .iter_mut()
            .find(|power| power.is_acting())
            .map(Power::finish_acting)
            .unwrap_or(false);
        if settled {
            self.finish_action();
            events.push(Event::ActionFinished {
                actor: self.id,
                actions_left: self.actions_left,
            });
        }
    }

    /// Returns to [`ActorState::Active`], or to [`ActorState::Idle`] once the budget is spent.
    ///
    /// The budget itself is charged when the action starts, not here.
    pub fn finish_action(&mut self) {
        self.state = if self.actions_left == 0 {
            ActorState::Idle
        } else {
            ActorState::Active
        };
    }

    /// Spends one action without doing anything.
    pub fn forfeit_action(&mut self, events: &mut Vec<Event>) -> Result<(), ContractViolation> {
        self.ensure_active()?;
        self.actions_left = self.actions_left.saturating_sub(1);
        self.finish_action();
        tracing::debug!(actor = %self.id, actions_left = self.actions_left, "action forfeited");
        events.push(Event::ActionForfeited {
            actor: self.id,
            actions_left: self.actions_left,
        });
        Ok(())
    }

    /// Opens the target selection of the power at `index`.
    ///
    /// Returns `Ok(false)` when there is no such power or nothing to target.
    /// Activation itself is free; the action is charged once a target is chosen.
    pub fn activate_power(
        &mut self,
        index: usize,
        board: &mut Board<'_>,
    ) -> Result<bool, ContractViolation> {
        self.ensure_active()?;
        if index >= self.powers.len() {
            return Ok(false);
        }
        for (other, power) in self.powers.iter_mut().enumerate() {
            if other != index && power.is_selecting() {
                power.reset();
            }
        }

        let labelled = self.powers[index].start_selecting(board)?;
        if labelled == 0 {
            self.focus = Focus::Actor;
            return Ok(false);
        }
        self.focus = Focus::Power(index);
        Ok(true)
    }

    /// Installs `effect` into an empty slot.
    ///
    /// Use [`Effect::attach`] to replace an active effect.
    pub fn install_effect(&mut self, effect: Effect) -> Result<(), ContractViolation> {
        if self.effect.as_ref().is_some_and(Effect::is_active) {
            return Err(ContractViolation::EffectSlotOccupied { actor: self.id });
        }
        self.effect = Some(effect);
        Ok(())
    }

    pub(crate) fn take_effect(&mut self) -> Option<Effect> {
        self.effect.take()
    }

    pub(crate) fn snapshot(&self, is_current: bool, selection_key: Option<char>) -> ActorSnapshot {
        ActorSnapshot {
            id: self.id,
            name: self.name.clone(),
            faction: self.faction,
            sprite: self.sprite,
            cell: self.cell,
            offset: self.display_offset(),
            state: self.state,
            actions_left: self.actions_left,
            is_current,
            effect: self.effect.as_ref().map(Effect::snapshot),
            powers: self.powers.iter().map(Power::kind).collect(),
            selection_key,
        }
    }

    fn on_turn_start(&mut self, events: &mut Vec<Event>) {
        let expired = self
            .effect
            .as_mut()
            .is_some_and(|effect| effect.on_turn_start());
        if !expired {
            return;
        }
        if let Some(effect) = self.effect.take() {
            tracing::debug!(actor = %self.id, effect = effect.kind().label(), "effect expired");
            events.push(Event::EffectEnded {
                target: self.id,
                kind: effect.kind(),
                cause: EffectEndCause::Expired,
            });
        }
    }

    fn step_flight(&mut self, events: &mut Vec<Event>) {
        let Some(flight) = self.flight.as_mut() else {
            self.finish_action();
            return;
        };
        flight.ticks_remaining = flight.ticks_remaining.saturating_sub(1);
        if flight.ticks_remaining > 0 {
            return;
        }
        self.flight = None;
        self.finish_action();
        events.push(Event::ActionFinished {
            actor: self.id,
            actions_left: self.actions_left,
        });
    }

    fn ensure_active(&self) -> Result<(), ContractViolation> {
        if self.state == ActorState::Active {
            Ok(())
        } else {
            Err(ContractViolation::ActorNotActive {
                actor: self.id,
                state: self.state,
            })
        }
    }
}

impl InputHandler for Actor {
    fn handle_input(
        &mut self,
        input: InputEvent,
        board: &mut Board<'_>,
    ) -> Result<bool, ContractViolation> {
        if self.state != ActorState::Active || self.is_resolving_power() {
            return Ok(false);
        }

        if let Focus::Power(index) = self.focus {
            match self.powers.get_mut(index) {
                Some(power) if power.is_selecting() => {
                    let handled = power.handle_input(input, board)?;
                    match power.state() {
                        PowerState::Selecting => {}
                        PowerState::Idle => self.focus = Focus::Actor,
                        PowerState::Acting => {
                            self.focus = Focus::Actor;
                            self.actions_left = self.actions_left.saturating_sub(1);
                        }
                    }
                    return Ok(handled);
                }
                _ => self.focus = Focus::Actor,
            }
        }

        match input {
            InputEvent::Move(direction) => Ok(matches!(
                self.request_move(direction, board)?,
                MoveOutcome::Moved { .. }
            )),
            InputEvent::Confirm => {
                self.forfeit_action(board.events())?;
                Ok(true)
            }
            InputEvent::SelectKey(key) => {
                let key = key.to_ascii_lowercase();
                match self
                    .powers
                    .iter()
                    .position(|power| power.kind().trigger_key() == key)
                {
                    Some(index) => self.activate_power(index, board),
                    None => Ok(false),
                }
            }
            InputEvent::Cancel | InputEvent::Quit => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castle_raid_core::{EffectKind, Grid, PowerKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn unicorn(id: u32, cell: CellCoord) -> Actor {
        Actor::from_spec(
            ActorId::new(id),
            ActorSpec::new(format!("Cherry {id}"), Faction::Unicorn),
            cell,
        )
    }

    fn robot(id: u32, cell: CellCoord) -> Actor {
        Actor::from_spec(
            ActorId::new(id),
            ActorSpec::new(format!("Bad robot {id}"), Faction::Robot).with_power(PowerKind::Bubble),
            cell,
        )
    }

    fn settle(actor: &mut Actor, events: &mut Vec<Event>) {
        while actor.state() == ActorState::Moving {
            actor.on_tick(events);
        }
    }

    #[test]
    fn start_turn_grants_budget_and_activates() {
        let mut actor = unicorn(1, CellCoord::new(0, 0));
        let mut events = Vec::new();
        assert_eq!(actor.state(), ActorState::Idle);

        actor.start_turn(5, &mut events);

        assert_eq!(actor.state(), ActorState::Active);
        assert_eq!(actor.actions_left(), 5);
        assert!(!actor.is_turn_over());
    }

    #[test]
    fn legal_move_spends_one_action_and_animates() {
        let grid = Grid::new(2, 2);
        let mut others = vec![robot(2, CellCoord::new(2, 2))];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut events = Vec::new();
        let mut actor = unicorn(1, CellCoord::new(0, 0));
        actor.start_turn(5, &mut events);

        let mut board = Board::new(&grid, &mut others, &mut rng, &mut events);
        let outcome = actor
            .request_move(Direction::Right, &mut board)
            .expect("active actor may move");

        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                from: CellCoord::new(0, 0),
                to: CellCoord::new(1, 0),
            }
        );
        assert_eq!(actor.actions_left(), 4);
        assert_eq!(actor.state(), ActorState::Moving);
        assert_eq!(actor.cell(), CellCoord::new(1, 0));
        assert_eq!(
            actor.display_offset(),
            DisplayOffset {
                columns: -1.0,
                rows: 0.0
            }
        );

        let mut ticks = 0;
        while actor.state() == ActorState::Moving {
            actor.on_tick(&mut events);
            ticks += 1;
        }
        assert_eq!(ticks, FLIGHT_TICKS);
        assert_eq!(actor.state(), ActorState::Active);
        assert_eq!(actor.display_offset(), DisplayOffset::ZERO);
        assert_eq!(actor.actions_left(), 4, "arrival must not charge again");
    }

    #[test]
    fn illegal_move_changes_nothing() {
        let grid = Grid::new(1, 1);
        let mut others = vec![robot(2, CellCoord::new(1, 0))];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut events = Vec::new();
        let mut actor = unicorn(1, CellCoord::new(0, 0));
        actor.start_turn(5, &mut events);

        let mut board = Board::new(&grid, &mut others, &mut rng, &mut events);
        let off_grid = actor
            .request_move(Direction::Up, &mut board)
            .expect("active actor may request");
        let occupied = actor
            .request_move(Direction::Right, &mut board)
            .expect("active actor may request");

        assert_eq!(off_grid, MoveOutcome::Rejected(MoveRejection::OffGrid));
        assert_eq!(
            occupied,
            MoveOutcome::Rejected(MoveRejection::Occupied {
                occupant: ActorId::new(2)
            })
        );
        assert_eq!(actor.state(), ActorState::Active);
        assert_eq!(actor.actions_left(), 5);
        assert_eq!(actor.cell(), CellCoord::new(0, 0));
    }

    #[test]
    fn discrete_actions_outside_active_are_contract_violations() {
        let grid = Grid::new(1, 1);
        let mut others: Vec<Actor> = Vec::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut events = Vec::new();
        let mut actor = unicorn(1, CellCoord::new(0, 0));

        assert_eq!(
            actor.advance(&mut events),
            Err(ContractViolation::ActorNotMoving {
                actor: ActorId::new(1),
                state: ActorState::Idle,
            })
        );
        assert_eq!(
            actor.forfeit_action(&mut events),
            Err(ContractViolation::ActorNotActive {
                actor: ActorId::new(1),
                state: ActorState::Idle,
            })
        );

        actor.start_turn(5, &mut events);
        let mut board = Board::new(&grid, &mut others, &mut rng, &mut events);
        let _ = actor
            .request_move(Direction::Down, &mut board)
            .expect("active actor may move");
        assert!(matches!(
            actor.request_move(Direction::Right, &mut board),
            Err(ContractViolation::ActorNotActive {
                state: ActorState::Moving,
                ..
            })
        ));
    }

    #[test]
    fn forfeiting_the_last_action_idles_the_actor() {
        let mut actor = unicorn(1, CellCoord::new(0, 0));
        let mut events = Vec::new();
        actor.start_turn(2, &mut events);

        actor.forfeit_action(&mut events).expect("active");
        assert_eq!(actor.state(), ActorState::Active);
        actor.forfeit_action(&mut events).expect("active");

        assert_eq!(actor.actions_left(), 0);
        assert_eq!(actor.state(), ActorState::Idle);
        assert!(actor.is_turn_over());
    }

    #[test]
    fn input_routing_moves_forfeits_and_ignores_cancel() {
        let grid = Grid::new(3, 3);
        let mut others: Vec<Actor> = Vec::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut events = Vec::new();
        let mut actor = unicorn(1, CellCoord::new(0, 0));
        actor.start_turn(5, &mut events);

        {
            let mut board = Board::new(&grid, &mut others, &mut rng, &mut events);
            assert!(actor
                .handle_input(InputEvent::Move(Direction::Down), &mut board)
                .expect("routed"));
            assert!(
                !actor
                    .handle_input(InputEvent::Confirm, &mut board)
                    .expect("moving actors ignore input"),
                "input while moving is ignored"
            );
        }
        settle(&mut actor, &mut events);

        let mut board = Board::new(&grid, &mut others, &mut rng, &mut events);
        assert!(actor
            .handle_input(InputEvent::Confirm, &mut board)
            .expect("routed"));
        assert!(!actor
            .handle_input(InputEvent::Cancel, &mut board)
            .expect("routed"));
        assert!(!actor
            .handle_input(InputEvent::SelectKey('b'), &mut board)
            .expect("unicorns carry no power"));
        assert_eq!(actor.actions_left(), 3);
    }

    #[test]
    fn power_resolution_charges_once_and_settles_on_tick() {
        let grid = Grid::new(3, 3);
        let mut others = vec![unicorn(2, CellCoord::new(3, 3))];
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut events = Vec::new();
        let mut actor = robot(1, CellCoord::new(0, 0));
        actor.start_turn(1, &mut events);

        {
            let mut board = Board::new(&grid, &mut others, &mut rng, &mut events);
            assert!(actor
                .handle_input(InputEvent::SelectKey('B'), &mut board)
                .expect("trigger key opens selection"));
            assert_eq!(actor.actions_left(), 1, "activation is free");

            let key = actor
                .selecting_power()
                .and_then(|power| power.key_for(ActorId::new(2)))
                .expect("the unicorn is labelled");
            assert!(actor
                .handle_input(InputEvent::SelectKey(key), &mut board)
                .expect("selection accepts keys"));
        }

        assert_eq!(actor.actions_left(), 0);
        assert!(actor.is_resolving_power());
        assert!(!actor.is_turn_over(), "acting power blocks rotation");
        assert_eq!(
            others[0].effect().map(Effect::kind),
            Some(EffectKind::Bubble)
        );

        actor.on_tick(&mut events);

        assert!(!actor.is_resolving_power());
        assert_eq!(actor.state(), ActorState::Idle);
        assert!(actor.is_turn_over());
    }

    #[test]
    fn effect_counts_down_on_turn_start_only() {
        let mut actor = unicorn(1, CellCoord::new(0, 0));
        let mut events = Vec::new();
        let _ = Effect::attach(EffectKind::Bubble, &mut actor, 2).expect("empty slot");

        actor.on_tick(&mut events);
        assert_eq!(actor.effect().map(Effect::turns_remaining), Some(2));

        actor.start_turn(5, &mut events);
        assert_eq!(actor.effect().map(Effect::turns_remaining), Some(1));
        actor.start_turn(5, &mut events);
        assert_eq!(actor.effect().map(Effect::turns_remaining), Some(0));
        assert!(events.is_empty(), "the second covered turn keeps the effect");
        actor.start_turn(5, &mut events);

        assert!(actor.effect().is_none());
        assert_eq!(
            events,
            vec![Event::EffectEnded {
                target: ActorId::new(1),
                kind: EffectKind::Bubble,
                cause: EffectEndCause::Expired,
            }]
        );
    }

    #[test]
    fn installing_into_an_occupied_slot_is_rejected() {
        let mut actor = unicorn(1, CellCoord::new(0, 0));

        actor
            .install_effect(Effect::new(EffectKind::Bubble, ActorId::new(1), 3))
            .expect("empty slot");
        assert_eq!(
            actor.install_effect(Effect::new(EffectKind::Bubble, ActorId::new(1), 3)),
            Err(ContractViolation::EffectSlotOccupied {
                actor: ActorId::new(1)
            })
        );
    }
}
