//! Timed statuses attached to actors.

use castle_raid_core::{ActorId, ContractViolation, EffectKind, EffectSnapshot};

use crate::Actor;

/// Timed status decorating a single actor.
///
/// The carrying actor owns the effect; the effect only remembers its target by
/// identifier. Once deactivated the target is cleared and the effect must not
/// be consulted again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Effect {
    kind: EffectKind,
    target: Option<ActorId>,
    turns_remaining: u32,
}

impl Effect {
    /// Creates an active effect aimed at `target` that is not yet installed anywhere.
    #[must_use]
    pub const fn new(kind: EffectKind, target: ActorId, duration_turns: u32) -> Self {
        Self {
            kind,
            target: Some(target),
            turns_remaining: duration_turns,
        }
    }

    /// Attaches a new effect of `kind` to `target` for `duration_turns` target turns.
    ///
    /// Effects are mutually exclusive: whatever the target carried before is
    /// deactivated before the new effect is installed, and returned so callers
    /// can observe that its target was cleared.
    pub fn attach(
        kind: EffectKind,
        target: &mut Actor,
        duration_turns: u32,
    ) -> Result<Option<Effect>, ContractViolation> {
        let displaced = target.take_effect().map(|mut previous| {
            let _ = previous.deactivate();
            previous
        });
        let id = target.id();
        target.install_effect(Self::new(kind, id, duration_turns))?;
        Ok(displaced)
    }

    /// Kind of the effect.
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Actor decorated by the effect, or `None` once deactivated.
    #[must_use]
    pub const fn target(&self) -> Option<ActorId> {
        self.target
    }

    /// Target turns the effect still persists through.
    ///
    /// The count drops as each of those turns starts, so it reads zero during
    /// the last covered turn.
    #[must_use]
    pub const fn turns_remaining(&self) -> u32 {
        self.turns_remaining
    }

    /// Reports whether the effect still decorates its target.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.target.is_some()
    }

    /// Clears the target and the remaining duration.
    ///
    /// Returns `true` if the effect was active. Calling it again is a no-op.
    pub fn deactivate(&mut self) -> bool {
        if self.target.take().is_none() {
            return false;
        }
        self.turns_remaining = 0;
        true
    }

    /// Enters one more target turn, or expires once every covered turn has
    /// started. Returns `true` on expiry.
    pub(crate) fn on_turn_start(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        if self.turns_remaining == 0 {
            return self.deactivate();
        }
        self.turns_remaining -= 1;
        false
    }

    pub(crate) fn snapshot(&self) -> EffectSnapshot {
        EffectSnapshot {
            kind: self.kind,
            turns_remaining: self.turns_remaining,
        }
    }
}
