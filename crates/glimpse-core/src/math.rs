//! Shared math utilities.

/// Integer floor of `log2(value)`; 0 for an input of 0.
pub fn log2_floor(value: u64) -> u32 {
    value.checked_ilog2().unwrap_or(0)
}

/// Approximate `1 / sqrt(value)` with one Newton-Raphson refinement.
///
/// Relative error stays below 0.2% for positive normal inputs.
pub fn inv_sqrt(value: f32) -> f32 {
    let half = 0.5 * value;
    let guess = f32::from_bits(0x5f37_59df_u32.wrapping_sub(value.to_bits() >> 1));
    guess * (1.5 - half * guess * guess)
}

/// Approximate square root built on [`inv_sqrt`].
pub fn fast_sqrt(value: f32) -> f32 {
    1.0 / inv_sqrt(value)
}
