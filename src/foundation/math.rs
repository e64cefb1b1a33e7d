/// Round to nearest and clamp into the `u8` range. NaN maps to 0.
pub(crate) fn round_clamp_u8(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

/// SplitMix64 finalizer.
pub(crate) fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Derive an independent RNG seed for one row of a seeded batch.
pub(crate) fn row_seed(seed: u64, row: u64) -> u64 {
    mix64(seed ^ mix64(row.wrapping_add(0x9E37_79B9_7F4A_7C15)))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
