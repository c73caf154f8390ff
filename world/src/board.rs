//! Context handed to the current actor while it reacts to input.

use castle_raid_core::{
    ActorId, CellCoord, ContractViolation, EffectEndCause, EffectKind, Event, Grid, InputEvent,
    MoveRejection,
};
use rand::RngCore;

use crate::{Actor, Effect};

/// Capability shared by everything that consumes input events.
///
/// Implementors consume a single event and report whether it was handled.
/// Unhandled input is not an error; `Err` is reserved for contract violations.
pub trait InputHandler {
    /// Consumes one input event.
    fn handle_input(
        &mut self,
        input: InputEvent,
        board: &mut Board<'_>,
    ) -> Result<bool, ContractViolation>;
}

/// Match state visible to the current actor, excluding the actor itself.
///
/// The board grants read access to every other actor for legality and
/// targeting checks, write access for attaching effects, the match RNG, and
/// the outgoing event buffer.
pub struct Board<'a> {
    grid: &'a Grid,
    others: &'a mut [Actor],
    rng: &'a mut dyn RngCore,
    events: &'a mut Vec<Event>,
}

impl<'a> Board<'a> {
    pub(crate) fn new(
        grid: &'a Grid,
        others: &'a mut [Actor],
        rng: &'a mut dyn RngCore,
        events: &'a mut Vec<Event>,
    ) -> Self {
        Self {
            grid,
            others,
            rng,
            events,
        }
    }

    /// Every actor except the one currently handling input.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.others.iter()
    }

    /// Checks whether the current actor may step onto `destination`.
    pub fn check_move(&self, destination: CellCoord) -> Result<(), MoveRejection> {
        check_destination(self.grid, self.others.iter(), destination)
    }

    /// Attaches an effect of `kind` to `target`, replacing whatever it carried.
    ///
    /// Returns the displaced effect, already deactivated.
    pub fn attach_effect(
        &mut self,
        target: ActorId,
        kind: EffectKind,
    ) -> Result<Option<Effect>, ContractViolation> {
        let actor = self
            .others
            .iter_mut()
            .find(|actor| actor.id() == target)
            .ok_or(ContractViolation::UnknownActor { actor: target })?;

        let turns = kind.duration_turns();
        let displaced = Effect::attach(kind, actor, turns)?;
        if let Some(previous) = &displaced {
            self.events.push(Event::EffectEnded {
                target,
                kind: previous.kind(),
                cause: EffectEndCause::Replaced,
            });
        }
        self.events.push(Event::EffectAttached {
            target,
            kind,
            turns,
        });
        Ok(displaced)
    }

    pub(crate) fn rng(&mut self) -> &mut (dyn RngCore + 'a) {
        &mut *self.rng
    }

    pub(crate) fn events(&mut self) -> &mut Vec<Event> {
        self.events
    }

    pub(crate) fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

/// Shared legality rule: inside the grid and not standing on any listed actor.
pub(crate) fn check_destination<'a>(
    grid: &Grid,
    mut actors: impl Iterator<Item = &'a Actor>,
    destination: CellCoord,
) -> Result<(), MoveRejection> {
    if !grid.is_legal(destination) {
        return Err(MoveRejection::OffGrid);
    }
    match actors.find(|actor| actor.cell() == destination) {
        Some(occupant) => Err(MoveRejection::Occupied {
            occupant: occupant.id(),
        }),
        None => Ok(()),
    }
}
