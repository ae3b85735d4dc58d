use std::fmt;

/// Unique identifier for any combatant tracked in the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique identifier for one attack swing.
///
/// Allocated by the attacking peer and carried through prediction,
/// authoritative resolution, and the verdict. Side effects are applied
/// exactly once per swing id; re-delivery returns the cached verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwingId(pub u64);

impl SwingId {
    /// Builds a swing id that cannot collide across attackers: the attacker's
    /// entity id occupies the high half, a per-attacker counter the low half.
    pub fn compose(attacker: EntityId, counter: u32) -> Self {
        Self(((attacker.0 as u64) << 32) | counter as u64)
    }
}

impl fmt::Display for SwingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "swing:{:#x}", self.0)
    }
}

/// Duration in seconds.
pub type Seconds = f64;

/// Authoritative point on a combat timeline, in seconds since match start.
///
/// Wraps `f64` with a total ordering (`f64::total_cmp`) so timestamps can key
/// the scheduler's priority queue. Timeline facts always record the scheduled
/// deadline, never the wall-clock moment a tick happened to fire, so interval
/// arithmetic on these values is exact.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub f64);

impl Timestamp {
    pub const ZERO: Self = Self(0.0);

    pub fn new(seconds: f64) -> Self {
        Self(seconds)
    }

    /// Seconds elapsed from `earlier` to `self`. Negative if `self` precedes it.
    pub fn since(self, earlier: Timestamp) -> Seconds {
        self.0 - earlier.0
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::ops::Add<Seconds> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: Seconds) -> Timestamp {
        Timestamp(self.0 + rhs)
    }
}

impl std::ops::Sub<Seconds> for Timestamp {
    type Output = Timestamp;
    fn sub(self, rhs: Seconds) -> Timestamp {
        Timestamp(self.0 - rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}s", self.0)
    }
}
