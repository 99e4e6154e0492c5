//! Speed limit check.

use crate::numeric::{parse_optional, Numeric};

/// Whether the reported speed is strictly above the configured maximum.
///
/// Returns `false` if either value is absent or malformed: a noisy reading
/// never produces a speed alert.
pub fn exceeds_limit(speed_kmh: Option<&Numeric>, max_speed_kmh: Option<&Numeric>) -> bool {
    match (parse_optional(speed_kmh), parse_optional(max_speed_kmh)) {
        (Some(speed), Some(max)) => speed > max,
        _ => false,
    }
}
