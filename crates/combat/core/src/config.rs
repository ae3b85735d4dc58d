use crate::state::Seconds;

/// Combat tuning parameters.
///
/// A single flat object so every field is independently overridable by the
/// hosting match configuration. Defaults are the shipped balance values;
/// timings are in seconds, posture in meter points.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatConfig {
    // ===== defensive state machine =====
    /// Delay between a block activation and the parry window opening.
    pub block_startup_time: Seconds,
    /// Length of the parry window once startup completes.
    pub parry_window_duration: Seconds,
    /// Vulnerable gap between a missed parry window and the block settling in.
    pub failed_parry_window_duration: Seconds,
    /// Lockout after releasing block before the machine returns to idle.
    pub block_cooldown: Seconds,
    /// How long a mistimed activation suppresses the parry window.
    pub shakyblock_duration: Seconds,

    // ===== hit arbitration =====
    /// Maximum accepted discrepancy between a peer's declared parry start and
    /// the authoritative one.
    pub latency_tolerance: Seconds,

    // ===== posture =====
    pub posture_max: f32,
    /// Inactivity required before posture starts recovering.
    pub posture_recovery_delay: Seconds,
    /// Recovery rate as a fraction of max posture per second.
    pub posture_recovery_rate: f32,
    /// Recovery rate while holding block.
    pub posture_recovery_rate_blocking: f32,
    /// Forced-vulnerable duration when posture saturates.
    pub guardbreak_duration: Seconds,

    // ===== knockdown / immunity =====
    pub knockdown_duration: Seconds,
    /// Invulnerability to further knockdowns after recovering from one.
    pub post_recovery_immunity: Seconds,
    /// Health fraction at or below which a zero-health event is an instant
    /// kill rather than a knockdown.
    pub instant_kill_hp_threshold: f32,

    // ===== combat tagging =====
    pub combat_tag_duration: Seconds,

    // ===== posture deltas per outcome =====
    /// Posture added to the defender when an attack is blocked.
    pub block_posture_damage: f32,
    /// Posture removed from the defender when they land a parry.
    pub parry_posture_reward: f32,
    /// Posture added to the attacker when their swing is parried.
    pub parried_posture_damage: f32,

    // ===== status durations =====
    pub soft_hitstun_duration: Seconds,
    pub block_stun_duration: Seconds,
    /// Window after a successful parry during which follow-up swings are
    /// parried automatically.
    pub autoparry_duration: Seconds,
}

impl CombatConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum concurrent status effects per combatant.
    pub const MAX_STATUS_EFFECTS: usize = 8;
    /// Phase facts retained per combatant for timeline reconstruction.
    /// Must cover more than the worst-case replication lag.
    pub const TIMELINE_CAPACITY: usize = 16;

    pub fn new() -> Self {
        Self {
            block_startup_time: 0.03,
            parry_window_duration: 0.2975,
            failed_parry_window_duration: 0.1725,
            block_cooldown: 0.5,
            shakyblock_duration: 0.8,
            latency_tolerance: 0.15,
            posture_max: 100.0,
            posture_recovery_delay: 1.0,
            posture_recovery_rate: 0.05,
            posture_recovery_rate_blocking: 0.025,
            guardbreak_duration: 1.5,
            knockdown_duration: 6.0,
            post_recovery_immunity: 8.0,
            instant_kill_hp_threshold: 0.15,
            combat_tag_duration: 30.0,
            block_posture_damage: 15.0,
            parry_posture_reward: 20.0,
            parried_posture_damage: 30.0,
            soft_hitstun_duration: 0.8,
            block_stun_duration: 0.25,
            autoparry_duration: 0.5,
        }
    }

    /// End of the parry window relative to activation.
    pub fn parry_window_end(&self) -> Seconds {
        self.block_startup_time + self.parry_window_duration
    }

    /// Ceiling used by the capped posture-add path. Always below max so the
    /// capped path can never trip a guardbreak.
    pub fn posture_soft_cap(&self) -> f32 {
        self.posture_max * 0.99
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
