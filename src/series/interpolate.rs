//! Column-level cleaning: sentinel scrubbing and bounded linear interpolation.

/// Invalid-sensor codes written by the upstream archive in place of a reading.
pub const SENTINEL_VALUES: [f64; 2] = [-9.8, -99.7];

/// Any reading below this is treated as invalid, whatever the variable.
pub const INVALID_BELOW: f64 = -99.0;

pub fn is_invalid(value: f64) -> bool {
    value.is_nan() || value < INVALID_BELOW || SENTINEL_VALUES.contains(&value)
}

/// Replaces sentinel and out-of-range readings with `None`. Returns how many
/// values were scrubbed.
pub fn scrub_sentinels(values: &mut [Option<f64>]) -> usize {
    let mut scrubbed = 0;
    for slot in values.iter_mut() {
        if matches!(slot, Some(v) if is_invalid(*v)) {
            *slot = None;
            scrubbed += 1;
        }
    }
    scrubbed
}

/// Fills interior gaps by linear interpolation between the nearest known
/// neighbours, one step per position. Leading and trailing gaps stay empty.
/// Returns how many values were filled.
pub fn interpolate_inside(values: &mut [Option<f64>]) -> usize {
    let mut filled = 0;
    let mut last_known: Option<(usize, f64)> = None;

    for i in 0..values.len() {
        let Some(current) = values[i] else {
            continue;
        };
        if let Some((j, previous)) = last_known {
            let span = (i - j) as f64;
            for k in (j + 1)..i {
                let t = (k - j) as f64 / span;
                values[k] = Some(previous + (current - previous) * t);
                filled += 1;
            }
        }
        last_known = Some((i, current));
    }
    filled
}
