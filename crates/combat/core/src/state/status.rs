//! Status effect set for combatants.
//!
//! Every effect is a tagged variant carrying `(started_at, until)` rather than
//! an ad-hoc object with lifecycle callbacks. Effects are applied through
//! [`StatusEffects::add`] and queried against an explicit timestamp, so the
//! same data answers both "is this active now" on the authority and "was this
//! active at `t`" during hit arbitration.

use arrayvec::ArrayVec;

use crate::config::CombatConfig;
use crate::state::Timestamp;

/// Types of status effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusKind {
    /// Parry window is open; landing a swing into it punishes the attacker.
    Parrying,

    /// Block is held; negates damage while facing the attacker.
    Blocking,

    /// Punishment for a mistimed activation: the parry window is suppressed.
    Shakyblock,

    /// Granted by a successful parry; follow-up swings inside the window are
    /// parried automatically and do not count as a vulnerable gap.
    Autoparry,

    /// Posture saturated: movement and block activation disabled.
    Guardbroken,

    /// Incapacitated with health clamped to the knockdown floor.
    Knockdown,

    /// Brief stagger from taking a clean hit or having a swing parried.
    SoftHitstun,

    /// Brief stagger from having a swing blocked.
    BlockStunned,
}

/// A single status effect instance.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub started_at: Timestamp,
    /// Expiry timestamp. `None` only for effects bound to an explicit end
    /// event rather than a duration (Blocking, Knockdown).
    pub until: Option<Timestamp>,
}

impl StatusEffect {
    /// Whether this effect covers `t`. Start boundary inclusive, expiry
    /// boundary exclusive.
    pub fn covers(&self, t: Timestamp) -> bool {
        t >= self.started_at && self.until.is_none_or(|until| t < until)
    }
}

/// Active status effects on a combatant.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffects {
    effects: ArrayVec<StatusEffect, { CombatConfig::MAX_STATUS_EFFECTS }>,
}

impl StatusEffects {
    pub fn empty() -> Self {
        Self {
            effects: ArrayVec::new(),
        }
    }

    /// Checks if a specific status effect is active at the given time.
    pub fn has(&self, kind: StatusKind, at: Timestamp) -> bool {
        self.effects.iter().any(|e| e.kind == kind && e.covers(at))
    }

    /// Returns the effect instance covering `at`, if any.
    pub fn get(&self, kind: StatusKind, at: Timestamp) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.kind == kind && e.covers(at))
    }

    /// Applies a status effect.
    ///
    /// If the effect already exists, extends it to the later expiry; an
    /// open-ended application absorbs any bounded one.
    pub fn add(&mut self, kind: StatusKind, started_at: Timestamp, until: Option<Timestamp>) {
        if let Some(existing) = self.effects.iter_mut().find(|e| e.kind == kind) {
            existing.until = match (existing.until, until) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            };
            return;
        }

        if !self.effects.is_full() {
            self.effects.push(StatusEffect {
                kind,
                started_at,
                until,
            });
        }
    }

    /// Whether an instance of `kind` exists, active or not.
    pub fn contains(&self, kind: StatusKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    /// Removes a status effect immediately.
    pub fn remove(&mut self, kind: StatusKind) {
        self.effects.retain(|e| e.kind != kind);
    }

    /// Removes all effects expired at `now`, returning the kinds dropped.
    pub fn remove_expired(&mut self, now: Timestamp) -> ArrayVec<StatusKind, { CombatConfig::MAX_STATUS_EFFECTS }> {
        let mut expired = ArrayVec::new();
        self.effects.retain(|e| {
            let live = e.until.is_none_or(|until| now < until);
            if !live {
                let _ = expired.try_push(e.kind);
            }
            live
        });
        expired
    }

    /// Iterates over effects active at the given time.
    pub fn active_at(&self, at: Timestamp) -> impl Iterator<Item = &StatusEffect> + '_ {
        self.effects.iter().filter(move |e| e.covers(at))
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_extends_to_later_expiry() {
        let mut set = StatusEffects::empty();
        set.add(StatusKind::Shakyblock, Timestamp(1.0), Some(Timestamp(1.8)));
        set.add(StatusKind::Shakyblock, Timestamp(1.2), Some(Timestamp(1.5)));

        let effect = set.get(StatusKind::Shakyblock, Timestamp(1.3)).unwrap();
        assert_eq!(effect.until, Some(Timestamp(1.8)));
    }

    #[test]
    fn open_ended_absorbs_bounded() {
        let mut set = StatusEffects::empty();
        set.add(StatusKind::Blocking, Timestamp(0.5), Some(Timestamp(2.0)));
        set.add(StatusKind::Blocking, Timestamp(0.6), None);

        assert!(set.has(StatusKind::Blocking, Timestamp(10.0)));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let mut set = StatusEffects::empty();
        set.add(StatusKind::SoftHitstun, Timestamp(0.0), Some(Timestamp(0.8)));

        assert!(set.has(StatusKind::SoftHitstun, Timestamp(0.0)));
        assert!(set.has(StatusKind::SoftHitstun, Timestamp(0.79)));
        assert!(!set.has(StatusKind::SoftHitstun, Timestamp(0.8)));
    }

    #[test]
    fn remove_expired_reports_dropped_kinds() {
        let mut set = StatusEffects::empty();
        set.add(StatusKind::SoftHitstun, Timestamp(0.0), Some(Timestamp(0.8)));
        set.add(StatusKind::Blocking, Timestamp(0.0), None);

        let dropped = set.remove_expired(Timestamp(1.0));
        assert_eq!(dropped.as_slice(), &[StatusKind::SoftHitstun]);
        assert!(set.has(StatusKind::Blocking, Timestamp(1.0)));
    }
}
