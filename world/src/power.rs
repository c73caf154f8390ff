//! Power target-selection protocol.

use std::collections::BTreeMap;

use castle_raid_core::{
    ActorId, ContractViolation, Event, Faction, InputEvent, PowerKind, PowerState,
};
use rand::seq::SliceRandom;

use crate::{Board, InputHandler};

/// Fixed alphabet from which selection keys are drawn.
pub const SELECTION_KEYS: [char; 36] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '1', '2', '3', '4', '5', '6', '7', '8', '9', '0',
];

/// A targetable capability owned by an actor.
///
/// Using a power runs a small state machine: `start_selecting` labels every
/// opposing actor with a key, a key press resolves the target and moves the
/// power to acting, and the owner's next tick returns it to idle.
#[derive(Clone, Debug)]
pub struct Power {
    kind: PowerKind,
    owner: ActorId,
    owner_faction: Faction,
    state: PowerState,
    targets_by_key: BTreeMap<char, ActorId>,
    target: Option<ActorId>,
}

impl Power {
    pub(crate) fn new(kind: PowerKind, owner: ActorId, owner_faction: Faction) -> Self {
        Self {
            kind,
            owner,
            owner_faction,
            state: PowerState::Idle,
            targets_by_key: BTreeMap::new(),
            target: None,
        }
    }

    /// Kind of the power.
    #[must_use]
    pub const fn kind(&self) -> PowerKind {
        self.kind
    }

    /// Current sub-state.
    #[must_use]
    pub const fn state(&self) -> PowerState {
        self.state
    }

    /// Reports whether the power awaits a target key.
    #[must_use]
    pub fn is_selecting(&self) -> bool {
        self.state == PowerState::Selecting
    }

    /// Reports whether the power resolved a target that has not yet settled.
    #[must_use]
    pub fn is_acting(&self) -> bool {
        self.state == PowerState::Acting
    }

    /// Reports whether members of `faction` are valid targets.
    #[must_use]
    pub fn can_target(&self, faction: Faction) -> bool {
        self.owner_faction.opposes(faction)
    }

    /// Key to target assignments of the open selection, in key order.
    pub fn selection(&self) -> impl Iterator<Item = (char, ActorId)> + '_ {
        self.targets_by_key.iter().map(|(key, target)| (*key, *target))
    }

    /// Key assigned to `target` in the open selection, if any.
    #[must_use]
    pub fn key_for(&self, target: ActorId) -> Option<char> {
        self.targets_by_key
            .iter()
            .find(|(_, candidate)| **candidate == target)
            .map(|(key, _)| *key)
    }

    /// Target resolved while acting.
    #[must_use]
    pub const fn target(&self) -> Option<ActorId> {
        self.target
    }

    /// Opens a selection session and returns the number of labelled candidates.
    ///
    /// Any session still open is discarded first. When no opposing actor
    /// exists the power stays idle and `Ok(0)` is returned.
    pub fn start_selecting(&mut self, board: &mut Board<'_>) -> Result<usize, ContractViolation> {
        if self.is_acting() {
            return Err(ContractViolation::PowerBusy { power: self.kind });
        }
        if self.is_selecting() {
            tracing::debug!(owner = %self.owner, power = ?self.kind, "discarding stale selection");
        }
        self.reset();

        let candidates: Vec<ActorId> = board
            .actors()
            .filter(|actor| actor.id() != self.owner && self.can_target(actor.faction()))
            .map(|actor| actor.id())
            .collect();
        if candidates.len() > SELECTION_KEYS.len() {
            tracing::warn!(
                owner = %self.owner,
                candidates = candidates.len(),
                keys = SELECTION_KEYS.len(),
                "selection key pool exhausted; surplus candidates stay unlabelled"
            );
        }

        let amount = candidates.len().min(SELECTION_KEYS.len());
        let keys: Vec<char> = SELECTION_KEYS
            .choose_multiple(board.rng(), amount)
            .copied()
            .collect();
        self.targets_by_key = keys.into_iter().zip(candidates).collect();

        let labelled = self.targets_by_key.len();
        if labelled == 0 {
            tracing::debug!(owner = %self.owner, power = ?self.kind, "no targets available");
            return Ok(0);
        }

        self.state = PowerState::Selecting;
        board.emit(Event::SelectionStarted {
            actor: self.owner,
            power: self.kind,
            candidates: labelled,
        });
        Ok(labelled)
    }

    /// Handles a key or cancel while selecting.
    ///
    /// Cancel closes the session without effect, an assigned key resolves the
    /// target, and anything else is reported as unhandled.
    pub fn handle_selection_input(
        &mut self,
        input: InputEvent,
        board: &mut Board<'_>,
    ) -> Result<bool, ContractViolation> {
        self.ensure_selecting()?;

        match input {
            InputEvent::Cancel => {
                self.reset();
                board.emit(Event::SelectionCancelled {
                    actor: self.owner,
                    power: self.kind,
                });
                Ok(true)
            }
            InputEvent::SelectKey(key) => {
                let key = key.to_ascii_lowercase();
                match self.targets_by_key.get(&key).copied() {
                    Some(target) => {
                        self.act_on_target(target, board)?;
                        Ok(true)
                    }
                    None => {
                        tracing::debug!(owner = %self.owner, %key, "key not assigned to any target");
                        Ok(false)
                    }
                }
            }
            InputEvent::Quit | InputEvent::Confirm | InputEvent::Move(_) => Ok(false),
        }
    }

    /// Applies the power's effect to `target` and enters the acting state.
    ///
    /// The owner charges the action cost once it observes the acting state.
    pub fn act_on_target(
        &mut self,
        target: ActorId,
        board: &mut Board<'_>,
    ) -> Result<(), ContractViolation> {
        self.ensure_selecting()?;
        let _ = board.attach_effect(target, self.kind.effect())?;

        self.targets_by_key.clear();
        self.target = Some(target);
        self.state = PowerState::Acting;
        board.emit(Event::PowerResolved {
            actor: self.owner,
            power: self.kind,
            target,
        });
        Ok(())
    }

    /// Settles an acting power back to idle. Returns `true` if it was acting.
    pub(crate) fn finish_acting(&mut self) -> bool {
        if !self.is_acting() {
            return false;
        }
        self.reset();
        true
    }

    pub(crate) fn reset(&mut self) {
        self.state = PowerState::Idle;
        self.targets_by_key.clear();
        self.target = None;
    }

    fn ensure_selecting(&self) -> Result<(), ContractViolation> {
        if self.is_selecting() {
            Ok(())
        } else {
            Err(ContractViolation::PowerNotSelecting {
                power: self.kind,
                state: self.state,
            })
        }
    }
}

impl InputHandler for Power {
    fn handle_input(
        &mut self,
        input: InputEvent,
        board: &mut Board<'_>,
    ) -> Result<bool, ContractViolation> {
        self.handle_selection_input(input, board)
    }
}
