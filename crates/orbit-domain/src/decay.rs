//! Decay module - temporal discounting of edge weight
//!
//! Implements the deterministic weighting formula the traversal runs on:
//! a relation-specific base weight, discounted by a monotonic, continuous
//! function of the age of `observed_at`. Edges past the "ghost" threshold
//! contribute a heavily discounted weight rather than being excluded, so a
//! stale-only connection cannot pull an entity artificially close while a
//! recent strong signal is never permanently eclipsed.

use crate::edge::Relation;

/// Age past which an edge is considered a ghost (default: 90 days)
pub const DEFAULT_GHOST_DAYS: f64 = 90.0;

/// Residual weight fraction a ghost edge decays toward (default: 0.05)
pub const DEFAULT_DECAY_FLOOR: f64 = 0.05;

/// Smallest effective weight used for cost conversion, to keep costs finite
pub const MIN_EFFECTIVE_WEIGHT: f64 = 1e-6;

const SECS_PER_DAY: f64 = 86_400.0;

impl Relation {
    /// Relation-specific base weight in (0, 1]
    ///
    /// Stronger collaboration signals (authorship, assignment) start
    /// heavier than incidental ones (mentions, cross-references).
    pub fn base_weight(&self) -> f64 {
        match self {
            Relation::AssignedTo => 1.0,
            Relation::AuthorOf => 1.0,
            Relation::ReviewerOf => 0.9,
            Relation::ChildOf => 0.8,
            Relation::BelongsTo => 0.8,
            Relation::ThreadOf => 0.8,
            Relation::MemberOf => 0.7,
            Relation::Blocks => 0.7,
            Relation::MentionedIn => 0.6,
            Relation::PostedIn => 0.6,
            Relation::DependsOn => 0.5,
            Relation::References => 0.4,
        }
    }
}

/// Parameters for the temporal decay curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayParams {
    /// Ghost threshold in days; also sets the curve's scale
    pub ghost_days: f64,

    /// Residual fraction the curve decays toward (never reaches zero)
    pub floor: f64,
}

impl Default for DecayParams {
    fn default() -> Self {
        Self {
            ghost_days: DEFAULT_GHOST_DAYS,
            floor: DEFAULT_DECAY_FLOOR,
        }
    }
}

impl DecayParams {
    /// Half-life of the exponential component, in days
    ///
    /// One third of the ghost threshold, so an edge at the threshold has
    /// lost three half-lives (~88% of its discountable weight) without any
    /// discontinuity at the boundary.
    pub fn half_life_days(&self) -> f64 {
        self.ghost_days / 3.0
    }

    /// Decay factor in [floor, 1] for an edge of the given age
    ///
    /// `decay(age) = floor + (1 - floor) * 0.5^(age / half_life)`
    ///
    /// Monotonically decreasing and continuous everywhere; there is no step
    /// at the ghost threshold, avoiding rank-order flapping as edge age
    /// crosses the boundary.
    pub fn factor(&self, age_secs: u64) -> f64 {
        let age_days = age_secs as f64 / SECS_PER_DAY;
        let half_lives = age_days / self.half_life_days();
        self.floor + (1.0 - self.floor) * 0.5_f64.powf(half_lives)
    }
}

/// Effective weight of an edge observed at `observed_at`, as of `now`
///
/// `observed_at` values in the future (clock skew between providers) are
/// treated as age zero.
pub fn effective_weight(raw_weight: f64, observed_at: u64, now: u64, params: &DecayParams) -> f64 {
    let age = now.saturating_sub(observed_at);
    raw_weight * params.factor(age)
}

/// Traversal cost of an edge with the given effective weight
///
/// Inversely related to weight: stronger/fresher relationships cost less to
/// traverse, producing a smaller effective distance and a tighter ring. A
/// fresh full-weight edge costs exactly 1.0, so effective distance is never
/// smaller than raw hop count.
pub fn edge_cost(effective_weight: f64) -> f64 {
    1.0 / effective_weight.clamp(MIN_EFFECTIVE_WEIGHT, 1.0)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: decay is monotonically non-increasing in age
        #[test]
        fn test_decay_monotonic(age_a in 0u64..400_000_000, age_b in 0u64..400_000_000) {
            let params = DecayParams::default();
            let (younger, older) = if age_a <= age_b { (age_a, age_b) } else { (age_b, age_a) };
            prop_assert!(params.factor(younger) >= params.factor(older));
        }

        /// Property: decay never leaves [floor, 1]
        #[test]
        fn test_decay_bounds(age in 0u64..4_000_000_000) {
            let params = DecayParams::default();
            let f = params.factor(age);
            prop_assert!(f >= params.floor);
            prop_assert!(f <= 1.0);
        }

        /// Property: no discontinuity anywhere - one second of extra age
        /// moves the factor by a vanishing amount
        #[test]
        fn test_decay_continuity(age in 0u64..400_000_000) {
            let params = DecayParams::default();
            let delta = (params.factor(age) - params.factor(age + 1)).abs();
            prop_assert!(delta < 1e-6, "one-second delta {} too large at age {}", delta, age);
        }

        /// Property: effective distance ordering is stable under shared
        /// aging - if edge A is fresher than edge B at the same raw weight,
        /// it stays at least as cheap at any later observation point
        #[test]
        fn test_fresher_edge_never_costs_more(
            observed_a in 0u64..1_000_000,
            observed_b in 0u64..1_000_000,
            now in 1_000_000u64..100_000_000,
        ) {
            let params = DecayParams::default();
            let (older, fresher) = if observed_a <= observed_b {
                (observed_a, observed_b)
            } else {
                (observed_b, observed_a)
            };
            let cost_fresher = edge_cost(effective_weight(1.0, fresher, now, &params));
            let cost_older = edge_cost(effective_weight(1.0, older, now, &params));
            prop_assert!(cost_fresher <= cost_older);
        }
    }
}
