//! People-usage adjustment.
//!
//! During the `Run` phase the people working an interval speed up (or slow
//! down) how much capacity each elapsed tick supplies. The multiplier is
//! kept on every usage segment so time can be inverted back to capacity.
//!
//! | Rule | Multiplier |
//! |------|------------|
//! | `UseAllAvailable` | `available` |
//! | `UseSpecifiedNbr(n)` | `min(n, available) / n` |
//! | `UseMultipleOfSpecifiedNbr(n)` | `⌊available / n⌋` |

use crate::models::{PeopleRule, Phase, Tick};

/// Capacity supplied per elapsed tick.
///
/// Phases other than `Run` always get 1.0. A non-positive requested crew
/// behaves like `UseAllAvailable`.
pub fn capacity_multiplier(rule: PeopleRule, available: f64, phase: Phase) -> f64 {
    if phase != Phase::Run {
        return 1.0;
    }
    match rule {
        PeopleRule::UseAllAvailable => available,
        PeopleRule::UseSpecifiedNbr(n) if n > 0.0 => n.min(available) / n,
        PeopleRule::UseMultipleOfSpecifiedNbr(n) if n > 0.0 => (available / n).floor(),
        _ => available,
    }
}

/// Elapsed ticks needed to supply `capacity` at `multiplier`, rounded half
/// away from zero and clamped to `[1, available]`.
pub fn elapsed_for_capacity(capacity: f64, multiplier: f64, available: Tick) -> Tick {
    let exact = capacity / multiplier;
    (exact.round() as Tick).clamp(1, available.max(1))
}
